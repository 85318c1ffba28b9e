use chrono::{DateTime, Utc};

use cvde_shared::format::format_cents;

use crate::history::{HistoryFilter, HistoryRow};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A ready-to-download export: UTF-8 BOM prefixed CSV bytes plus the
/// timestamped filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryExport {
    pub filename: String,
    pub content: String,
}

/// Every cell is double-quoted with embedded quotes doubled, numbers
/// included, so spreadsheet imports never split on stray commas.
fn escape_csv(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| escape_csv(cell))
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds the admin history export: a summary block describing the applied
/// filters, a blank separator line, then one detail row per exam line.
/// Lines are CRLF-joined and the whole body starts with a BOM.
pub fn build_history_csv(
    rows: &[HistoryRow],
    filter: &HistoryFilter,
    now: DateTime<Utc>,
) -> HistoryExport {
    let total_cents: i64 = rows.iter().map(|row| row.unit_price_cents).sum();

    let mut lines: Vec<String> = Vec::with_capacity(rows.len() + 10);
    lines.push(csv_line(&[
        "Report".to_string(),
        "CVDE Exam History Export".to_string(),
    ]));
    lines.push(csv_line(&[
        "Generated At".to_string(),
        now.format(TIMESTAMP_FORMAT).to_string(),
    ]));
    lines.push(csv_line(&[
        "Time Range".to_string(),
        filter.range.label().to_string(),
    ]));
    lines.push(csv_line(&[
        "Vet Filter".to_string(),
        filter.vet.clone().unwrap_or_else(|| "All vets".to_string()),
    ]));
    lines.push(csv_line(&[
        "Clinic Filter".to_string(),
        filter
            .clinic
            .clone()
            .unwrap_or_else(|| "All clinics".to_string()),
    ]));
    lines.push(csv_line(&[
        "Exam Filter".to_string(),
        filter.exam.clone().unwrap_or_else(|| "All exams".to_string()),
    ]));
    lines.push(csv_line(&[
        "Total Exam Items".to_string(),
        rows.len().to_string(),
    ]));
    lines.push(csv_line(&[
        "Total Value".to_string(),
        format_cents(total_cents),
    ]));
    lines.push(String::new());
    lines.push(csv_line(&[
        "Order ID".to_string(),
        "Ordered At".to_string(),
        "Exam".to_string(),
        "Vet".to_string(),
        "Clinic".to_string(),
        "Value".to_string(),
    ]));

    for row in rows {
        lines.push(csv_line(&[
            row.order_id.to_string(),
            row.ordered_at.format(TIMESTAMP_FORMAT).to_string(),
            row.exam_name.clone(),
            row.vet_name.clone(),
            row.clinic_name.clone(),
            format_cents(row.unit_price_cents),
        ]));
    }

    HistoryExport {
        filename: format!("cvde-exam-history-{}.csv", now.format("%Y-%m-%d-%H%M")),
        content: format!("\u{feff}{}", lines.join("\r\n")),
    }
}
