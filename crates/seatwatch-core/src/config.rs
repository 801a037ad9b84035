use serde::Serialize;
use std::time::Duration;

/// Which extracted rows are accumulated into the consolidated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportMode {
    /// Keep every extracted row.
    All,
    /// Keep only rows classified as positive (open seats).
    PositivesOnly,
}

/// Wait durations used by the pipeline. Every blocking wait in the run is
/// bounded by one of these.
#[derive(Debug, Clone, Serialize)]
pub struct Timing {
    /// Upper bound on the initial page load.
    pub navigation: Duration,
    /// Fixed fallback delay after a selection, giving the page time to react.
    pub settle: Duration,
    /// Upper bound on a network-quiescence wait.
    pub quiescence: Duration,
    /// Hard wall-clock timeout for a click.
    pub action: Duration,
    /// Base retry backoff; multiplied by the attempt number.
    pub backoff: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            settle: Duration::from_millis(2000),
            quiescence: Duration::from_secs(5),
            action: Duration::from_secs(5),
            backoff: Duration::from_millis(500),
        }
    }
}

/// Immutable configuration for one watch run.
///
/// Built once by the caller and passed into the aggregator; pipeline
/// components never consult the environment themselves.
#[derive(Debug, Clone, Serialize)]
pub struct WatchConfig {
    /// Page holding the cascading form.
    pub url: String,
    /// Visible label to select in the region dropdown.
    pub region: String,
    /// Visible label to select in the point-of-use dropdown.
    pub pou: String,
    /// Visible labels of the courses to check, in order.
    pub courses: Vec<String>,
    pub mode: ReportMode,
    /// Selection attempts per dropdown before giving up.
    pub max_attempts: usize,
    pub timing: Timing,
    /// Deliver the report even when it contains no records.
    pub notify_empty: bool,
}

impl WatchConfig {
    pub fn new(
        url: impl Into<String>,
        region: impl Into<String>,
        pou: impl Into<String>,
        courses: Vec<String>,
    ) -> Self {
        Self {
            url: url.into(),
            region: region.into(),
            pou: pou.into(),
            courses,
            mode: ReportMode::All,
            max_attempts: 5,
            timing: Timing::default(),
            notify_empty: true,
        }
    }

    pub fn with_mode(mut self, mode: ReportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_notify_empty(mut self, notify_empty: bool) -> Self {
        self.notify_empty = notify_empty;
        self
    }
}
