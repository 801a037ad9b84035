use async_trait::async_trait;
use seatwatch_core::Result;
use seatwatch_core::report::{ConsolidatedReport, Reporter};

/// Prints the report to stdout with light styling.
pub struct ConsoleReporter {
    context: Option<String>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { context: None }
    }

    /// Describe what was watched (region, centre) in the header.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reporter for ConsoleReporter {
    fn name(&self) -> &str {
        "console"
    }

    async fn report(&self, report: &ConsolidatedReport) -> Result<()> {
        use ::console::style;

        println!("\n{}", style("Seat Availability").bold().cyan());
        if let Some(context) = &self.context {
            println!("{}", style(context).dim());
        }
        if let Some(observed) = report.observed_at {
            println!(
                "{}",
                style(format!(
                    "Observed {}",
                    observed.format("%a, %d %b %Y %H:%M %Z")
                ))
                .dim()
            );
        }

        for course in &report.courses {
            println!("\n{}", style(&course.course).bold());
            if course.records.is_empty() {
                println!("  {}", style("no batches listed").yellow());
                continue;
            }
            for record in &course.records {
                match (record.seat_count(), &record.quantity) {
                    (Some(0), _) => {
                        println!("  {:<24} {}", record.batch_label, style("full").dim())
                    }
                    (Some(n), _) => println!(
                        "  {:<24} {}",
                        record.batch_label,
                        style(format!("{} open", n)).green().bold()
                    ),
                    (None, Some(raw)) => {
                        println!("  {:<24} {}", record.batch_label, style(raw).yellow())
                    }
                    (None, None) => {
                        println!("  {:<24} {}", record.batch_label, style("unknown").dim())
                    }
                }
            }
        }

        println!(
            "\n{} {} of {}",
            style("Open batches:").bold(),
            report.total_positives(),
            report.total_records()
        );

        Ok(())
    }
}
