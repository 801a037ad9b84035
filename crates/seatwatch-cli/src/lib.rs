use clap::ValueEnum;
use seatwatch_core::config::ReportMode;

pub mod commands;

/// Which batch rows make it into the delivered report.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReportChoice {
    /// Every batch row read from the availability table
    All,
    /// Only batches that still have open seats
    Positives,
}

impl ReportChoice {
    pub fn to_mode(self) -> ReportMode {
        match self {
            ReportChoice::All => ReportMode::All,
            ReportChoice::Positives => ReportMode::PositivesOnly,
        }
    }
}
