use crate::locator::{self, Locator};
use crate::probe::Probe;
use crate::report::BatchRecord;
use regex::Regex;
use std::sync::LazyLock;

static SEATS_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)available\s*seats").unwrap());
static PURE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Locate the results table and parse it into batch records.
///
/// A page without a results table yields an empty list: "no data this
/// round", not an error.
pub async fn extract<P: Probe>(probe: &P) -> Vec<BatchRecord> {
    for loc in table_locators() {
        let handles = locator::resolve(probe, &loc).await;
        let Some(handle) = handles.first() else {
            continue;
        };
        match probe.read_table(handle).await {
            Ok(grid) => {
                let records = parse_rows(&grid);
                tracing::info!("Extracted {} batch record(s) from results table", records.len());
                return records;
            }
            Err(e) => {
                tracing::debug!("Results table unreadable via {:?}: {}", loc, e);
            }
        }
    }

    tracing::warn!("No results table on the page; treating as no data this round");
    Vec::new()
}

fn table_locators() -> Vec<Locator> {
    vec![
        Locator::attr_contains("table", "id", "grid"),
        Locator::attr_contains("table", "class", "grid"),
        Locator::scan_all("table"),
    ]
}

/// How the quantity column is read for one table snapshot. Determined once
/// per snapshot and applied uniformly to its data rows.
#[derive(Debug, PartialEq, Eq)]
enum ColumnRule {
    /// A header cell matched; quantity comes from this cell index.
    Indexed { header_row: usize, column: usize },
    /// No header cell matched anywhere: the first row is presumed to be the
    /// header and quantities come only from the per-row digit scan.
    DigitScan,
}

fn detect_column(grid: &[Vec<String>]) -> ColumnRule {
    for (row_idx, row) in grid.iter().enumerate() {
        if let Some(column) = row.iter().position(|cell| SEATS_HEADER.is_match(cell)) {
            return ColumnRule::Indexed {
                header_row: row_idx,
                column,
            };
        }
    }
    ColumnRule::DigitScan
}

/// Parse a row-major cell grid into batch records.
///
/// The first cell of each data row is the batch label; rows with an empty
/// label are dropped. When the quantity cell at the detected column is
/// missing or empty, the first pure-digit cell after the label stands in.
pub fn parse_rows(grid: &[Vec<String>]) -> Vec<BatchRecord> {
    if grid.is_empty() {
        return Vec::new();
    }

    let rule = detect_column(grid);
    let data_start = match rule {
        ColumnRule::Indexed { header_row, .. } => header_row + 1,
        ColumnRule::DigitScan => {
            tracing::warn!(
                "No 'Available Seats' header in results table; degrading to digit-scan quantities"
            );
            1
        }
    };

    let mut records = Vec::new();
    for row in grid.iter().skip(data_start) {
        let Some(batch_label) = row.first().map(|cell| cell.trim()) else {
            continue;
        };
        if batch_label.is_empty() {
            continue;
        }

        let quantity = match rule {
            ColumnRule::Indexed { column, .. } => match row.get(column).map(|cell| cell.trim()) {
                Some(cell) if !cell.is_empty() => Some(cell.to_string()),
                _ => digit_scan(row),
            },
            ColumnRule::DigitScan => digit_scan(row),
        };

        records.push(BatchRecord::new(batch_label, quantity));
    }
    records
}

/// First pure-digit cell after the label cell. Skipping the label cell keeps
/// an all-digit batch number from masquerading as a quantity.
fn digit_scan(row: &[String]) -> Option<String> {
    row.iter()
        .skip(1)
        .map(|cell| cell.trim())
        .find(|cell| PURE_DIGITS.is_match(cell))
        .map(|cell| cell.to_string())
}
