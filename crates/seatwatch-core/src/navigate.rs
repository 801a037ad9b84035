use crate::Result;
use crate::config::{Timing, WatchConfig};
use crate::error::Error;
use crate::locator::{self, FieldSelector, Locator};
use crate::probe::{Probe, ResponseStamp};
use crate::select::{CascadingSelector, SelectOutcome, SelectionTarget};
use url::Url;

/// Locator chain for the region dropdown. The id hint comes first; the later
/// entries cover markup variants where the id has changed.
pub fn region_field() -> FieldSelector {
    FieldSelector::new(
        "region",
        vec![
            Locator::id("ddl_reg"),
            Locator::attr_contains("select", "id", "reg"),
            Locator::attr_contains("select", "name", "reg"),
            Locator::nth("select", 0),
            Locator::scan_all("select"),
        ],
    )
}

/// Locator chain for the point-of-use dropdown.
pub fn pou_field() -> FieldSelector {
    FieldSelector::new(
        "point of use",
        vec![
            Locator::id("ddl_pou"),
            Locator::attr_contains("select", "id", "pou"),
            Locator::attr_contains("select", "name", "pou"),
            Locator::nth("select", 1),
            Locator::scan_all("select"),
        ],
    )
}

/// Locator chain for the course dropdown.
pub fn course_field() -> FieldSelector {
    FieldSelector::new(
        "course",
        vec![
            Locator::id("ddl_course"),
            Locator::attr_contains("select", "id", "course"),
            Locator::attr_contains("select", "name", "course"),
            Locator::nth("select", 2),
            Locator::scan_all("select"),
        ],
    )
}

fn submit_locators() -> Vec<Locator> {
    vec![
        Locator::text(
            "input[type='submit'], input[type='button'], button",
            "Get List",
        ),
        Locator::scan_all("input[type='submit']"),
        Locator::scan_all("button"),
    ]
}

/// URL fragment used to recognize the form's postback response: the page
/// path when the URL parses to one, otherwise the URL itself.
pub fn response_hint(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if parsed.path().len() > 1 => parsed.path().to_string(),
        _ => url.to_string(),
    }
}

/// What one course iteration produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseFetch {
    /// Course selection confirmed and the results action dispatched.
    Fetched(Option<ResponseStamp>),
    /// Selection or submit failed; the course contributes nothing this run.
    Skipped,
}

/// Orchestrates the cascading selections in dependency order.
///
/// Region and point-of-use are selected once per run and assumed durable;
/// the course control is re-located on every iteration because the results
/// refresh may have replaced it.
pub struct FormNavigator {
    selector: CascadingSelector,
    timing: Timing,
}

impl FormNavigator {
    pub fn new(max_attempts: usize, timing: Timing) -> Self {
        Self {
            selector: CascadingSelector::new(max_attempts, timing.backoff),
            timing,
        }
    }

    /// Select region then point-of-use. Failure here is fatal to the run:
    /// without the right context, extracted data would be attributed to the
    /// wrong place.
    pub async fn establish_context<P: Probe>(&self, probe: &P, config: &WatchConfig) -> Result<()> {
        tracing::info!("Selecting region '{}'", config.region);
        let region = SelectionTarget::new(region_field(), &config.region);
        if !self.select_confirmed(probe, &region).await {
            return Err(Error::ContextNotEstablished(format!(
                "region '{}' was never selected",
                config.region
            )));
        }

        tracing::info!("Selecting point of use '{}'", config.pou);
        let pou = SelectionTarget::new(pou_field(), &config.pou);
        if !self.select_confirmed(probe, &pou).await {
            return Err(Error::ContextNotEstablished(format!(
                "point of use '{}' was never selected",
                config.pou
            )));
        }

        Ok(())
    }

    /// Select a course and trigger the results fetch. Failures skip the
    /// course; results already collected for other courses remain valid.
    pub async fn fetch_course<P: Probe>(
        &self,
        probe: &P,
        course: &str,
        response_hint: &str,
    ) -> CourseFetch {
        tracing::info!("Selecting course '{}'", course);
        let target = SelectionTarget::new(course_field(), course);
        if !self.select_confirmed(probe, &target).await {
            tracing::warn!("Skipping course '{}': selection not confirmed", course);
            return CourseFetch::Skipped;
        }

        let Some(submit) = self.find_submit(probe).await else {
            tracing::warn!("Skipping course '{}': no submit control found", course);
            return CourseFetch::Skipped;
        };

        // The response listener must be armed while the click runs, so the
        // postback triggered by the click cannot slip past it.
        let (clicked, stamp) = futures::join!(
            probe.click(&submit, self.timing.action),
            probe.wait_for_response(response_hint, self.timing.quiescence),
        );
        if let Err(e) = clicked {
            tracing::warn!("Skipping course '{}': submit click failed: {}", course, e);
            return CourseFetch::Skipped;
        }

        self.settle(probe).await;
        CourseFetch::Fetched(stamp)
    }

    /// Drive one selection to a confirmed state: select, settle, and for an
    /// ambiguous outcome re-locate the control and require the desired label.
    async fn select_confirmed<P: Probe>(&self, probe: &P, target: &SelectionTarget) -> bool {
        match self.selector.select(probe, target).await {
            SelectOutcome::Confirmed => {
                self.settle(probe).await;
                true
            }
            SelectOutcome::LikelyNavigated => {
                self.settle(probe).await;
                let confirmed = self.verify_selection(probe, target).await;
                if !confirmed {
                    tracing::warn!(
                        "{} did not hold '{}' after the page settled",
                        target.field.name,
                        target.desired_label
                    );
                }
                confirmed
            }
            SelectOutcome::NotFound => false,
        }
    }

    /// Wait out the page's reaction to a change: network quiet first, then
    /// the fixed settle delay for script-driven repopulation.
    async fn settle<P: Probe>(&self, probe: &P) {
        let outcome = probe.wait_for_quiescence(self.timing.quiescence).await;
        if !outcome.completed() {
            tracing::debug!("Network never went quiet; proceeding after fixed settle");
        }
        probe.pause(self.timing.settle).await;
    }

    /// Re-locate a field after a suspected reload and check that it still
    /// reports the desired selection.
    async fn verify_selection<P: Probe>(&self, probe: &P, target: &SelectionTarget) -> bool {
        for loc in &target.field.locators {
            let candidates = locator::resolve(probe, loc).await;
            for handle in &candidates {
                if let Ok(Some(label)) = probe.selected_label(handle).await
                    && contains_ci(&label, &target.desired_label)
                {
                    return true;
                }
            }
        }
        false
    }

    async fn find_submit<P: Probe>(&self, probe: &P) -> Option<P::Handle> {
        for loc in submit_locators() {
            let handles = locator::resolve(probe, &loc).await;
            if let Some(handle) = handles.first() {
                tracing::debug!("Submit control found via {:?}", loc);
                return Some(handle.clone());
            }
        }
        None
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::fake::FakeProbe;

    const SUBMIT_TAG: &str = "input[type='submit'], input[type='button'], button";

    fn config() -> WatchConfig {
        WatchConfig::new(
            "https://example.com/mcs/seats.aspx",
            "Southern",
            "HYDERABAD",
            vec!["Advanced (ICITSS) MCS".to_string()],
        )
        .with_max_attempts(2)
    }

    fn navigator() -> FormNavigator {
        FormNavigator::new(2, Timing::default())
    }

    fn add_context_selects(probe: &FakeProbe) {
        probe.add_select(
            &["#ddl_reg", "select"],
            &[("0", "Eastern"), ("1", "Southern")],
        );
        probe.add_select(&["#ddl_pou", "select"], &[("9", "HYDERABAD")]);
    }

    #[tokio::test]
    async fn test_establish_context_selects_region_and_pou() {
        let probe = FakeProbe::new();
        add_context_selects(&probe);

        let result = navigator().establish_context(&probe, &config()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_establish_context_fails_without_region_match() {
        let probe = FakeProbe::new();
        probe.add_select(&["#ddl_reg", "select"], &[("0", "Eastern")]);
        probe.add_select(&["#ddl_pou", "select"], &[("9", "HYDERABAD")]);

        let result = navigator().establish_context(&probe, &config()).await;

        assert!(matches!(result, Err(Error::ContextNotEstablished(_))));
    }

    #[tokio::test]
    async fn test_establish_context_confirms_after_suspected_reload() {
        let probe = FakeProbe::new();
        let region = probe.add_select(
            &["#ddl_reg", "select"],
            &[("0", "Eastern"), ("1", "Southern")],
        );
        probe.add_select(&["#ddl_pou", "select"], &[("9", "HYDERABAD")]);
        // The change dispatch dies as the page reloads; the applied value
        // must be confirmed by the post-settle read-back.
        probe.fail_dispatch_on(region);

        let result = navigator().establish_context(&probe, &config()).await;

        assert!(result.is_ok());
        assert_eq!(probe.selected_value(region).as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_fetch_course_clicks_submit() {
        let probe = FakeProbe::new();
        add_context_selects(&probe);
        let course = probe.add_select(
            &["#ddl_course", "select"],
            &[("7", "Advanced (ICITSS) MCS Aug 2026")],
        );
        probe.add_button(&[SUBMIT_TAG], "", "Get List");

        let fetch = navigator()
            .fetch_course(&probe, "Advanced (ICITSS) MCS", "/mcs/seats.aspx")
            .await;

        assert_eq!(fetch, CourseFetch::Fetched(None));
        assert_eq!(probe.click_count(), 1);
        assert_eq!(probe.selected_value(course).as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_fetch_course_skips_without_submit_control() {
        let probe = FakeProbe::new();
        probe.add_select(&["#ddl_course", "select"], &[("7", "Advanced (ICITSS) MCS")]);

        let fetch = navigator()
            .fetch_course(&probe, "Advanced (ICITSS) MCS", "/mcs/seats.aspx")
            .await;

        assert_eq!(fetch, CourseFetch::Skipped);
        assert_eq!(probe.click_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_course_skips_unknown_course() {
        let probe = FakeProbe::new();
        probe.add_select(&["#ddl_course", "select"], &[("7", "Orientation")]);
        probe.add_button(&[SUBMIT_TAG], "", "Get List");

        let fetch = navigator()
            .fetch_course(&probe, "Advanced (ICITSS) MCS", "/mcs/seats.aspx")
            .await;

        assert_eq!(fetch, CourseFetch::Skipped);
    }

    #[test]
    fn test_response_hint_prefers_path() {
        assert_eq!(
            response_hint("https://example.com/mcs/seats.aspx?x=1"),
            "/mcs/seats.aspx"
        );
        assert_eq!(response_hint("https://example.com/"), "https://example.com/");
        assert_eq!(response_hint("not a url"), "not a url");
    }
}
