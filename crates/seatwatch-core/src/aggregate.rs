use crate::Result;
use crate::config::{ReportMode, WatchConfig};
use crate::navigate::{CourseFetch, FormNavigator, response_hint};
use crate::probe::{Probe, WaitPolicy};
use crate::report::{ConsolidatedReport, CourseReport, Reporter};
use crate::table;

/// Counters describing what one run accomplished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub courses_requested: usize,
    pub courses_fetched: usize,
    pub courses_skipped: usize,
    pub records: usize,
    pub positives: usize,
    pub notified: bool,
}

/// Drives one complete run: open the page, establish the region and
/// point-of-use context, iterate the courses, and hand the consolidated
/// report to the reporter.
///
/// Per-course failures degrade the report; only a failure to establish
/// context (or to load the page at all) aborts the run, since results
/// gathered under the wrong context would be misattributed.
pub struct ResultAggregator {
    config: WatchConfig,
}

impl ResultAggregator {
    pub fn new(config: WatchConfig) -> Self {
        Self { config }
    }

    pub async fn run<P: Probe>(&self, probe: &P, reporter: &dyn Reporter) -> Result<RunSummary> {
        let navigator = FormNavigator::new(self.config.max_attempts, self.config.timing.clone());
        let hint = response_hint(&self.config.url);

        tracing::info!("Opening {}", self.config.url);
        probe
            .goto(
                &self.config.url,
                WaitPolicy::NetworkIdle,
                self.config.timing.navigation,
            )
            .await?;

        navigator.establish_context(probe, &self.config).await?;

        let mut report = ConsolidatedReport::default();
        let mut summary = RunSummary {
            courses_requested: self.config.courses.len(),
            ..RunSummary::default()
        };

        for course in &self.config.courses {
            match navigator.fetch_course(probe, course, &hint).await {
                CourseFetch::Fetched(stamp) => {
                    summary.courses_fetched += 1;
                    if let Some(stamp) = stamp
                        && let Some(date) = stamp.server_date
                    {
                        report.observed_at =
                            Some(report.observed_at.map_or(date, |seen| seen.max(date)));
                    }

                    let mut records = table::extract(probe).await;
                    if self.config.mode == ReportMode::PositivesOnly {
                        records.retain(|record| record.is_positive());
                    }
                    tracing::info!("Course '{}': {} row(s) recorded", course, records.len());
                    report.courses.push(CourseReport::new(course, records));
                }
                CourseFetch::Skipped => {
                    summary.courses_skipped += 1;
                }
            }
        }

        summary.records = report.total_records();
        summary.positives = report.total_positives();

        if report.is_empty() && !self.config.notify_empty {
            tracing::info!("Nothing to report; delivery suppressed");
            return Ok(summary);
        }

        // A dead notification channel must not discard the run's findings;
        // the summary still reports them.
        match reporter.report(&report).await {
            Ok(()) => summary.notified = true,
            Err(e) => tracing::warn!("Delivery via {} failed: {}", reporter.name(), e),
        }

        Ok(summary)
    }
}
