use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One parsed results-table row. `quantity` is the raw cell text before any
/// numeric normalization and may be non-numeric ("N/A").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRecord {
    pub batch_label: String,
    pub quantity: Option<String>,
}

impl BatchRecord {
    pub fn new(batch_label: impl Into<String>, quantity: Option<String>) -> Self {
        Self {
            batch_label: batch_label.into(),
            quantity,
        }
    }

    /// The quantity with non-digit characters stripped, when anything
    /// numeric remains.
    pub fn seat_count(&self) -> Option<u64> {
        let digits: String = self
            .quantity
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// A record counts as positive when its stripped quantity parses to an
    /// integer greater than zero ("03" is positive, "0" and "N/A" are not).
    pub fn is_positive(&self) -> bool {
        self.seat_count().is_some_and(|n| n > 0)
    }
}

/// Extraction result for a single course iteration.
#[derive(Debug, Clone, Serialize)]
pub struct CourseReport {
    pub course: String,
    pub records: Vec<BatchRecord>,
}

impl CourseReport {
    pub fn new(course: impl Into<String>, records: Vec<BatchRecord>) -> Self {
        Self {
            course: course.into(),
            records,
        }
    }

    pub fn positives(&self) -> impl Iterator<Item = &BatchRecord> {
        self.records.iter().filter(|r| r.is_positive())
    }
}

/// Merged per-course results of one run, in configured course order.
///
/// `observed_at` comes from a network response `Date` header when one was
/// seen; it is display-only and never drives logic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidatedReport {
    pub courses: Vec<CourseReport>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl ConsolidatedReport {
    pub fn total_records(&self) -> usize {
        self.courses.iter().map(|c| c.records.len()).sum()
    }

    pub fn total_positives(&self) -> usize {
        self.courses.iter().map(|c| c.positives().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }
}

/// Delivers a consolidated report over some channel.
///
/// Implementations must tolerate empty reports; whether an empty report is
/// delivered at all is the aggregator's decision.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    async fn report(&self, report: &ConsolidatedReport) -> Result<()>;
}
