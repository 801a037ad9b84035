use async_trait::async_trait;
use seatwatch_core::report::{ConsolidatedReport, Reporter};
use seatwatch_core::{Error, Result};

/// Fans one report out to every configured channel.
///
/// A channel failure is logged and the remaining channels still run; the
/// fan-out only fails when no channel at all accepted the report.
pub struct MultiReporter {
    channels: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn with(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.channels.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Default for MultiReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reporter for MultiReporter {
    fn name(&self) -> &str {
        "multi"
    }

    async fn report(&self, report: &ConsolidatedReport) -> Result<()> {
        let mut delivered = 0;
        for channel in &self.channels {
            match channel.report(report).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Delivery via {} failed: {}", channel.name(), e),
            }
        }

        if delivered == 0 && !self.channels.is_empty() {
            return Err(Error::Notify(
                "no delivery channel accepted the report".to_string(),
            ));
        }
        Ok(())
    }
}
