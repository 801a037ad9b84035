use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use seatwatch_core::probe::{Probe, ResponseStamp, SelectOption, WaitOutcome, WaitPolicy};
use seatwatch_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Address of an element: the selector that produced it plus the element's
/// position in that selector's match list. Every operation re-queries, so a
/// handle stays usable across DOM rewrites as long as a matching element
/// still sits at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    selector: String,
    index: usize,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

/// Probe implementation over a live CDP page.
///
/// All element access goes through page-side JavaScript; scripts throw when
/// the addressed element is gone, which surfaces as `Error::Probe` and lets
/// the pipeline distinguish "element vanished" from "element disagrees".
pub struct PageProbe {
    page: Page,
    quiet_window: Duration,
}

impl PageProbe {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            quiet_window: Duration::from_millis(500),
        }
    }

    /// Network lull that counts as quiescence.
    pub fn with_quiet_window(mut self, window: Duration) -> Self {
        self.quiet_window = window;
        self
    }

    async fn eval<T: DeserializeOwned>(&self, expr: String) -> Result<T> {
        self.page
            .evaluate(expr)
            .await
            .map_err(probe_err)?
            .into_value::<T>()
            .map_err(probe_err)
    }
}

#[async_trait]
impl Probe for PageProbe {
    type Handle = ElementRef;

    async fn goto(&self, url: &str, policy: WaitPolicy, timeout: Duration) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        let navigate = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(timeout, navigate).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Navigation(format!("{}: {}", url, e))),
            Err(_) => {
                return Err(Error::Navigation(format!(
                    "{}: load did not finish within {:?}",
                    url, timeout
                )));
            }
        }
        if policy == WaitPolicy::NetworkIdle {
            self.wait_for_quiescence(timeout).await;
        }
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<ElementRef>> {
        let expr = format!("document.querySelectorAll({}).length", js_string(css));
        let count: usize = self.eval(expr).await?;
        Ok((0..count)
            .map(|index| ElementRef {
                selector: css.to_string(),
                index,
            })
            .collect())
    }

    async fn read_options(&self, handle: &ElementRef) -> Result<Vec<SelectOption>> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                if (!el.options) return null;
                return Array.from(el.options).map(o => ({{
                    value: o.value,
                    label: (o.label || o.text || '').trim(),
                }}));
            }})()"#,
            element_expr(handle)
        );
        self.eval::<Option<Vec<SelectOption>>>(expr)
            .await?
            .ok_or_else(|| Error::Probe(format!("{} is not a select", handle)))
    }

    async fn selected_label(&self, handle: &ElementRef) -> Result<Option<String>> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                if (el.selectedIndex === undefined || el.selectedIndex < 0) return null;
                const option = el.options[el.selectedIndex];
                return option ? (option.label || option.text || '').trim() : null;
            }})()"#,
            element_expr(handle)
        );
        self.eval::<Option<String>>(expr).await
    }

    async fn set_value(&self, handle: &ElementRef, value: &str) -> Result<()> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                el.value = {};
                return el.value;
            }})()"#,
            element_expr(handle),
            js_string(value)
        );
        let applied: String = self.eval(expr).await?;
        if applied == value {
            Ok(())
        } else {
            Err(Error::Probe(format!(
                "value '{}' not applied to {}",
                value, handle
            )))
        }
    }

    async fn dispatch_event(&self, handle: &ElementRef, event: &str) -> Result<()> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                el.dispatchEvent(new Event({}, {{ bubbles: true }}));
                return true;
            }})()"#,
            element_expr(handle),
            js_string(event)
        );
        self.eval::<bool>(expr).await.map(|_| ())
    }

    async fn click(&self, handle: &ElementRef, timeout: Duration) -> Result<()> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                el.click();
                return true;
            }})()"#,
            element_expr(handle)
        );
        match tokio::time::timeout(timeout, self.eval::<bool>(expr)).await {
            Ok(Ok(_)) => Ok(()),
            // A click that tears the page down kills the script's own
            // execution context; the click itself still happened.
            Ok(Err(e)) if is_navigation_error(&e) => {
                tracing::debug!("Click reply lost to navigation: {}", e);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::debug!(
                    "Click did not return within {:?}; treating as dispatched",
                    timeout
                );
                Ok(())
            }
        }
    }

    async fn text(&self, handle: &ElementRef) -> Result<String> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                return (el.innerText || el.textContent || '').trim();
            }})()"#,
            element_expr(handle)
        );
        self.eval(expr).await
    }

    async fn attr(&self, handle: &ElementRef, name: &str) -> Result<Option<String>> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                return el.getAttribute({});
            }})()"#,
            element_expr(handle),
            js_string(name)
        );
        self.eval(expr).await
    }

    async fn read_table(&self, handle: &ElementRef) -> Result<Vec<Vec<String>>> {
        let expr = format!(
            r#"(() => {{
                const el = {};
                if (!el) throw new Error('element not found');
                if (!el.rows) return null;
                return Array.from(el.rows).map(row =>
                    Array.from(row.cells).map(cell =>
                        (cell.innerText || cell.textContent || '').trim()
                    )
                );
            }})()"#,
            element_expr(handle)
        );
        self.eval::<Option<Vec<Vec<String>>>>(expr)
            .await?
            .ok_or_else(|| Error::Probe(format!("{} is not a table", handle)))
    }

    async fn wait_for_quiescence(&self, timeout: Duration) -> WaitOutcome {
        let listeners = futures::try_join!(
            self.page.event_listener::<EventRequestWillBeSent>(),
            self.page.event_listener::<EventLoadingFinished>(),
            self.page.event_listener::<EventLoadingFailed>(),
        );
        let (mut requests, mut finished, mut failed) = match listeners {
            Ok(streams) => streams,
            Err(e) => {
                tracing::debug!("Network listeners unavailable ({}); skipping wait", e);
                return WaitOutcome::TimedOut;
            }
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return WaitOutcome::TimedOut,
                _ = tokio::time::sleep(self.quiet_window) => return WaitOutcome::Completed,
                Some(_) = requests.next() => {}
                Some(_) = finished.next() => {}
                Some(_) = failed.next() => {}
            }
        }
    }

    async fn wait_for_response(&self, fragment: &str, timeout: Duration) -> Option<ResponseStamp> {
        let mut responses = match self.page.event_listener::<EventResponseReceived>().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!("Response listener unavailable: {}", e);
                return None;
            }
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return None,
                event = responses.next() => {
                    let event = event?;
                    if event.response.url.contains(fragment) {
                        tracing::debug!(
                            "Matched response: {} {}",
                            event.response.status,
                            event.response.url
                        );
                        return Some(ResponseStamp {
                            status: event.response.status as u16,
                            server_date: response_server_date(&event),
                        });
                    }
                }
            }
        }
    }

    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await.map_err(probe_err)
    }
}

fn probe_err(e: impl fmt::Display) -> Error {
    Error::Probe(e.to_string())
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn element_expr(handle: &ElementRef) -> String {
    format!(
        "document.querySelectorAll({})[{}]",
        js_string(&handle.selector),
        handle.index
    )
}

fn is_navigation_error(error: &Error) -> bool {
    const MARKERS: [&str; 3] = [
        "Execution context was destroyed",
        "Cannot find context with specified id",
        "Inspected target navigated or closed",
    ];
    let text = error.to_string();
    MARKERS.iter().any(|marker| text.contains(marker))
}

fn response_server_date(event: &EventResponseReceived) -> Option<DateTime<Utc>> {
    let headers: HashMap<String, String> =
        serde_json::from_value(event.response.headers.inner().clone()).ok()?;
    parse_server_date(&headers)
}

/// RFC 2822 `Date` header, looked up case-insensitively.
fn parse_server_date(headers: &HashMap<String, String>) -> Option<DateTime<Utc>> {
    let value = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("date"))
        .map(|(_, value)| value)?;
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_js_string_escapes_for_embedding() {
        assert_eq!(js_string("plain"), r#""plain""#);
        assert_eq!(js_string(r#"it's "quoted""#), r#""it's \"quoted\"""#);
        assert_eq!(js_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_element_expr_addresses_by_position() {
        let handle = ElementRef {
            selector: "select".to_string(),
            index: 2,
        };
        assert_eq!(
            element_expr(&handle),
            r#"document.querySelectorAll("select")[2]"#
        );
    }

    #[test]
    fn test_navigation_errors_are_recognized() {
        let gone = Error::Probe("Execution context was destroyed by navigation".to_string());
        let ordinary = Error::Probe("value '3' not applied to select[0]".to_string());

        assert!(is_navigation_error(&gone));
        assert!(!is_navigation_error(&ordinary));
    }

    #[test]
    fn test_parse_server_date_reads_rfc2822() {
        let mut headers = HashMap::new();
        headers.insert(
            "Date".to_string(),
            "Tue, 25 Aug 2026 10:30:00 GMT".to_string(),
        );
        assert_eq!(
            parse_server_date(&headers),
            Some(Utc.with_ymd_and_hms(2026, 8, 25, 10, 30, 0).unwrap())
        );

        let mut lowercase = HashMap::new();
        lowercase.insert(
            "date".to_string(),
            "Tue, 25 Aug 2026 16:00:00 +0530".to_string(),
        );
        assert!(parse_server_date(&lowercase).is_some());
    }

    #[test]
    fn test_parse_server_date_tolerates_garbage() {
        let mut headers = HashMap::new();
        headers.insert("Date".to_string(), "not a date".to_string());

        assert!(parse_server_date(&headers).is_none());
        assert!(parse_server_date(&HashMap::new()).is_none());
    }

    // Probe behavior against a live page is covered by the CLI integration
    // tests; everything above that touches the page needs a real Chrome.
}
