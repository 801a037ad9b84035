use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One selectable choice in a dropdown.
///
/// `value` is the underlying submission token, `label` the user-visible text.
/// Options are ephemeral: read fresh on every probe, never cached across a
/// navigation or reload boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// How long `goto` waits before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Return once the navigation has committed and the load event fired.
    Load,
    /// Additionally wait for network activity to go quiet.
    NetworkIdle,
}

/// Outcome of a bounded wait. A timed-out wait is not an error; the caller
/// inspects the outcome and proceeds anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    TimedOut,
}

impl WaitOutcome {
    pub fn completed(&self) -> bool {
        matches!(self, WaitOutcome::Completed)
    }
}

/// What a matched network response contributes to the run: its status and the
/// server-observed timestamp from the `Date` header, used for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStamp {
    pub status: u16,
    pub server_date: Option<DateTime<Utc>>,
}

/// Capability over a live rendered page.
///
/// The pipeline drives the form exclusively through this interface; the
/// browser crate implements it over a CDP page and tests substitute a
/// scripted fake. Element handles are opaque and may go stale when the page
/// reloads; operations on a stale handle return `Error::Probe`.
#[async_trait]
pub trait Probe: Send + Sync {
    type Handle: Clone + Send + Sync;

    /// Navigate to a URL and wait according to the policy.
    async fn goto(&self, url: &str, policy: WaitPolicy, timeout: Duration) -> Result<()>;

    /// All elements matching a CSS selector, in document order.
    async fn find_all(&self, css: &str) -> Result<Vec<Self::Handle>>;

    /// The options of a select-like control.
    async fn read_options(&self, handle: &Self::Handle) -> Result<Vec<SelectOption>>;

    /// Visible label of the currently selected option, if any.
    async fn selected_label(&self, handle: &Self::Handle) -> Result<Option<String>>;

    /// Set a control's value. Fails when the value is not applied.
    async fn set_value(&self, handle: &Self::Handle, value: &str) -> Result<()>;

    /// Dispatch a synthetic bubbling event on an element.
    async fn dispatch_event(&self, handle: &Self::Handle, event: &str) -> Result<()>;

    /// Click an element, bounded by a hard timeout.
    async fn click(&self, handle: &Self::Handle, timeout: Duration) -> Result<()>;

    /// Trimmed visible text of an element.
    async fn text(&self, handle: &Self::Handle) -> Result<String>;

    /// An attribute value, `None` when absent.
    async fn attr(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>>;

    /// A table element as a row-major grid of trimmed cell text.
    async fn read_table(&self, handle: &Self::Handle) -> Result<Vec<Vec<String>>>;

    /// Wait until network activity has been quiet for a short window, or the
    /// timeout elapses.
    async fn wait_for_quiescence(&self, timeout: Duration) -> WaitOutcome;

    /// Wait for a response whose URL contains `fragment`. `None` on timeout.
    async fn wait_for_response(&self, fragment: &str, timeout: Duration) -> Option<ResponseStamp>;

    /// Bounded cooperative pause.
    async fn pause(&self, duration: Duration);

    /// Release the page. Further operations fail.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory page for pipeline tests. Elements are registered
    //! under the exact CSS strings the locators generate; all waits return
    //! instantly.

    use super::*;
    use crate::Error;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FakeHandle(usize);

    #[derive(Default)]
    struct FakeElement {
        text: String,
        value: String,
        attrs: HashMap<String, String>,
        options: Vec<SelectOption>,
        selected: Option<usize>,
        fail_dispatch: bool,
        is_table: bool,
        rows: Option<Vec<Vec<String>>>,
    }

    #[derive(Default)]
    struct State {
        elements: Vec<FakeElement>,
        index: HashMap<String, Vec<usize>>,
        tables_after_click: VecDeque<Option<Vec<Vec<String>>>>,
        response: Option<ResponseStamp>,
        visited: Vec<String>,
        clicks: usize,
    }

    pub struct FakeProbe {
        state: Mutex<State>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(State::default()),
            }
        }

        fn register(&self, css_keys: &[&str], element: FakeElement) -> FakeHandle {
            let mut state = self.state.lock().unwrap();
            let id = state.elements.len();
            state.elements.push(element);
            for key in css_keys {
                state.index.entry(key.to_string()).or_default().push(id);
            }
            FakeHandle(id)
        }

        /// Register a select with (value, label) options under the given CSS keys.
        pub fn add_select(&self, css_keys: &[&str], options: &[(&str, &str)]) -> FakeHandle {
            self.register(
                css_keys,
                FakeElement {
                    options: options
                        .iter()
                        .map(|(v, l)| SelectOption::new(*v, *l))
                        .collect(),
                    ..FakeElement::default()
                },
            )
        }

        pub fn add_button(&self, css_keys: &[&str], text: &str, value: &str) -> FakeHandle {
            self.register(
                css_keys,
                FakeElement {
                    text: text.to_string(),
                    value: value.to_string(),
                    ..FakeElement::default()
                },
            )
        }

        /// Register the results table. `None` rows mean the table is absent
        /// from the page until a click installs one.
        pub fn add_table(&self, css_keys: &[&str], rows: Option<Vec<Vec<String>>>) -> FakeHandle {
            self.register(
                css_keys,
                FakeElement {
                    is_table: true,
                    rows,
                    ..FakeElement::default()
                },
            )
        }

        /// Script the table content installed by each successive click.
        pub fn queue_table_after_click(&self, rows: Option<Vec<Vec<String>>>) {
            self.state
                .lock()
                .unwrap()
                .tables_after_click
                .push_back(rows);
        }

        pub fn set_response(&self, stamp: Option<ResponseStamp>) {
            self.state.lock().unwrap().response = stamp;
        }

        /// Make event dispatch on this element fail as if the page had begun
        /// reloading underneath it.
        pub fn fail_dispatch_on(&self, handle: FakeHandle) {
            self.state.lock().unwrap().elements[handle.0].fail_dispatch = true;
        }

        pub fn selected_value(&self, handle: FakeHandle) -> Option<String> {
            let state = self.state.lock().unwrap();
            let element = &state.elements[handle.0];
            element
                .selected
                .and_then(|i| element.options.get(i))
                .map(|o| o.value.clone())
        }

        pub fn click_count(&self) -> usize {
            self.state.lock().unwrap().clicks
        }

        pub fn visited(&self) -> Vec<String> {
            self.state.lock().unwrap().visited.clone()
        }
    }

    #[async_trait]
    impl Probe for FakeProbe {
        type Handle = FakeHandle;

        async fn goto(&self, url: &str, _policy: WaitPolicy, _timeout: Duration) -> Result<()> {
            self.state.lock().unwrap().visited.push(url.to_string());
            Ok(())
        }

        async fn find_all(&self, css: &str) -> Result<Vec<FakeHandle>> {
            let state = self.state.lock().unwrap();
            let ids = state.index.get(css).cloned().unwrap_or_default();
            Ok(ids
                .into_iter()
                .filter(|id| {
                    let element = &state.elements[*id];
                    !element.is_table || element.rows.is_some()
                })
                .map(FakeHandle)
                .collect())
        }

        async fn read_options(&self, handle: &FakeHandle) -> Result<Vec<SelectOption>> {
            Ok(self.state.lock().unwrap().elements[handle.0].options.clone())
        }

        async fn selected_label(&self, handle: &FakeHandle) -> Result<Option<String>> {
            let state = self.state.lock().unwrap();
            let element = &state.elements[handle.0];
            Ok(element
                .selected
                .and_then(|i| element.options.get(i))
                .map(|o| o.label.clone()))
        }

        async fn set_value(&self, handle: &FakeHandle, value: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            let element = &mut state.elements[handle.0];
            match element.options.iter().position(|o| o.value == value) {
                Some(position) => {
                    element.selected = Some(position);
                    Ok(())
                }
                None => Err(Error::Probe(format!("value '{}' not applied", value))),
            }
        }

        async fn dispatch_event(&self, handle: &FakeHandle, _event: &str) -> Result<()> {
            if self.state.lock().unwrap().elements[handle.0].fail_dispatch {
                Err(Error::Probe(
                    "Execution context was destroyed".to_string(),
                ))
            } else {
                Ok(())
            }
        }

        async fn click(&self, _handle: &FakeHandle, _timeout: Duration) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.clicks += 1;
            if let Some(rows) = state.tables_after_click.pop_front() {
                if let Some(table) = state.elements.iter_mut().find(|e| e.is_table) {
                    table.rows = rows;
                }
            }
            Ok(())
        }

        async fn text(&self, handle: &FakeHandle) -> Result<String> {
            Ok(self.state.lock().unwrap().elements[handle.0].text.clone())
        }

        async fn attr(&self, handle: &FakeHandle, name: &str) -> Result<Option<String>> {
            let state = self.state.lock().unwrap();
            let element = &state.elements[handle.0];
            if name == "value" && !element.value.is_empty() {
                return Ok(Some(element.value.clone()));
            }
            Ok(element.attrs.get(name).cloned())
        }

        async fn read_table(&self, handle: &FakeHandle) -> Result<Vec<Vec<String>>> {
            self.state.lock().unwrap().elements[handle.0]
                .rows
                .clone()
                .ok_or_else(|| Error::Probe("table detached".to_string()))
        }

        async fn wait_for_quiescence(&self, _timeout: Duration) -> WaitOutcome {
            WaitOutcome::Completed
        }

        async fn wait_for_response(
            &self,
            _fragment: &str,
            _timeout: Duration,
        ) -> Option<ResponseStamp> {
            self.state.lock().unwrap().response.clone()
        }

        async fn pause(&self, _duration: Duration) {}

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }
}
