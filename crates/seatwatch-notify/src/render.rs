use seatwatch_core::report::{BatchRecord, ConsolidatedReport};

/// Build the plain-text message body shared by the message channels.
///
/// `context` names what was watched (region, centre) since the report itself
/// only carries course results.
pub fn render_message(report: &ConsolidatedReport, context: Option<&str>) -> String {
    let mut lines = Vec::new();

    match context {
        Some(context) => lines.push(format!("Seat check: {}", context)),
        None => lines.push("Seat check".to_string()),
    }
    if let Some(observed) = report.observed_at {
        lines.push(format!(
            "Observed {}",
            observed.format("%a, %d %b %Y %H:%M %Z")
        ));
    }

    for course in &report.courses {
        lines.push(String::new());
        lines.push(course.course.clone());
        if course.records.is_empty() {
            lines.push("  no batches listed".to_string());
            continue;
        }
        for record in &course.records {
            lines.push(format!("  {}", describe(record)));
        }
    }

    lines.push(String::new());
    if report.total_records() == 0 {
        lines.push("No seats found.".to_string());
    } else {
        lines.push(format!(
            "Open batches: {} of {}",
            report.total_positives(),
            report.total_records()
        ));
    }

    lines.join("\n")
}

fn describe(record: &BatchRecord) -> String {
    match (record.seat_count(), &record.quantity) {
        (Some(0), _) => format!("{}: full", record.batch_label),
        (Some(n), _) => format!("{}: {} open", record.batch_label, n),
        // Non-numeric site text is passed through untouched.
        (None, Some(raw)) => format!("{}: {}", record.batch_label, raw),
        (None, None) => format!("{}: quantity unknown", record.batch_label),
    }
}
