use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::ExamOrder;

/// Time window for the admin history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRange {
    #[default]
    D3,
    D7,
    D30,
    D90,
    D365,
    All,
}

impl HistoryRange {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "3d" => Some(HistoryRange::D3),
            "7d" => Some(HistoryRange::D7),
            "30d" => Some(HistoryRange::D30),
            "90d" => Some(HistoryRange::D90),
            "365d" => Some(HistoryRange::D365),
            "all" => Some(HistoryRange::All),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            HistoryRange::D3 => "3d",
            HistoryRange::D7 => "7d",
            HistoryRange::D30 => "30d",
            HistoryRange::D90 => "90d",
            HistoryRange::D365 => "365d",
            HistoryRange::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryRange::D3 => "Last 3 days",
            HistoryRange::D7 => "Last 7 days",
            HistoryRange::D30 => "Last 30 days",
            HistoryRange::D90 => "Last 90 days",
            HistoryRange::D365 => "Last 12 months",
            HistoryRange::All => "All time",
        }
    }

    /// Inclusive lower bound for order creation times; `All` has none.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            HistoryRange::D3 => 3,
            HistoryRange::D7 => 7,
            HistoryRange::D30 => 30,
            HistoryRange::D90 => 90,
            HistoryRange::D365 => 365,
            HistoryRange::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

/// One history line per selected exam per order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HistoryRow {
    pub order_id: i64,
    pub ordered_at: DateTime<Utc>,
    pub exam_name: String,
    pub unit_price_cents: i64,
    pub vet_name: String,
    pub clinic_name: String,
}

/// Exact-match filters layered on top of the range window.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub range: HistoryRange,
    pub vet: Option<String>,
    pub clinic: Option<String>,
    pub exam: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopExam {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub total_cents: i64,
    pub total_items: usize,
    pub top_exams: Vec<TopExam>,
}

/// Explodes orders into per-exam rows within the range window, newest order
/// first. Vet and clinic fall back to display defaults when snapshots are
/// missing.
pub fn build_history_rows(
    orders: &[ExamOrder],
    range: HistoryRange,
    now: DateTime<Utc>,
) -> Vec<HistoryRow> {
    let start = range.start(now);

    let mut rows: Vec<HistoryRow> = orders
        .iter()
        .filter(|order| match start {
            Some(start) => order.created_at >= start,
            None => true,
        })
        .flat_map(|order| {
            let vet_name = order
                .vet_name_snapshot
                .clone()
                .unwrap_or_else(|| "Unknown".to_string());
            let clinic_name = order.clinic_display_name().to_string();

            order.selected_exams.iter().map(move |line| HistoryRow {
                order_id: order.id,
                ordered_at: order.created_at,
                exam_name: line.exam_name.clone(),
                unit_price_cents: line.unit_price_cents,
                vet_name: vet_name.clone(),
                clinic_name: clinic_name.clone(),
            })
        })
        .collect();

    rows.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));
    rows
}

pub fn apply_filters(mut rows: Vec<HistoryRow>, filter: &HistoryFilter) -> Vec<HistoryRow> {
    if let Some(vet) = &filter.vet {
        rows.retain(|row| &row.vet_name == vet);
    }
    if let Some(clinic) = &filter.clinic {
        rows.retain(|row| &row.clinic_name == clinic);
    }
    if let Some(exam) = &filter.exam {
        rows.retain(|row| &row.exam_name == exam);
    }
    rows
}

/// Totals plus the five most ordered exams, ties broken by name.
pub fn summarize(rows: &[HistoryRow]) -> HistorySummary {
    let total_cents = rows.iter().map(|row| row.unit_price_cents).sum();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.exam_name.as_str()).or_insert(0) += 1;
    }

    let mut top_exams: Vec<TopExam> = counts
        .into_iter()
        .map(|(name, count)| TopExam {
            name: name.to_string(),
            count,
        })
        .collect();
    top_exams.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    top_exams.truncate(5);

    HistorySummary {
        total_cents,
        total_items: rows.len(),
        top_exams,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NeuterStatus, OrderStatus, ReactiveStatus};
    use crate::selection::SelectedExam;
    use cvde_shared::{Masked, ProfessionalAffiliation};
    use uuid::Uuid;

    fn order_at(
        id: i64,
        created_at: DateTime<Utc>,
        vet_name: Option<&str>,
        exams: Vec<(&str, i64)>,
    ) -> ExamOrder {
        ExamOrder {
            id,
            vet_id: Uuid::new_v4(),
            vet_name_snapshot: vet_name.map(str::to_string),
            vet_email_snapshot: None,
            vet_crmv_snapshot: None,
            vet_affiliation: Some(ProfessionalAffiliation::Clinic {
                name: "Happy Paws".to_string(),
                address: None,
            }),
            owner_name: "Owner".to_string(),
            owner_government_id: Masked::new("12345678909".to_string()),
            owner_phone: Masked::new("11988887777".to_string()),
            owner_address: None,
            owner_email: None,
            patient_name: "Rex".to_string(),
            species: Some("Dog".to_string()),
            breed: None,
            age_years: Some(3),
            weight_kg: None,
            neuter_status: Some(NeuterStatus::Unknown),
            reactive_status: Some(ReactiveStatus::NotReactive),
            clinical_notes: None,
            selected_exams: exams
                .into_iter()
                .enumerate()
                .map(|(i, (name, price))| SelectedExam {
                    exam_id: i as i64 + 1,
                    exam_name: name.to_string(),
                    unit_price_cents: price,
                })
                .collect(),
            total_cents: 0,
            status: OrderStatus::Requested,
            scheduled_for: None,
            admin_notes: None,
            request_collection: false,
            driver_collection_requested: false,
            driver_requested_at: None,
            sample_received_at: None,
            created_at,
            updated_at: created_at,
            version: 1,
        }
    }

    #[test]
    fn test_range_codes_and_labels() {
        assert_eq!(HistoryRange::from_code("3d"), Some(HistoryRange::D3));
        assert_eq!(HistoryRange::from_code("bogus"), None);
        assert_eq!(HistoryRange::D365.label(), "Last 12 months");
        assert_eq!(HistoryRange::All.label(), "All time");
        assert_eq!(HistoryRange::All.start(Utc::now()), None);
        assert_eq!(HistoryRange::default(), HistoryRange::D3);
    }

    #[test]
    fn test_rows_window_and_order() {
        let now = Utc::now();
        let orders = vec![
            order_at(1, now - Duration::days(10), Some("Alice"), vec![("X-Ray", 3000)]),
            order_at(2, now - Duration::days(1), Some("Alice"), vec![("Blood Panel", 5000)]),
            order_at(3, now - Duration::hours(2), None, vec![("X-Ray", 3000)]),
        ];

        let rows = build_history_rows(&orders, HistoryRange::D3, now);
        assert_eq!(rows.len(), 2);
        // Newest order first.
        assert_eq!(rows[0].order_id, 3);
        assert_eq!(rows[0].vet_name, "Unknown");
        assert_eq!(rows[1].order_id, 2);

        let all = build_history_rows(&orders, HistoryRange::All, now);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_one_row_per_exam_line() {
        let now = Utc::now();
        let orders = vec![order_at(
            1,
            now,
            Some("Alice"),
            vec![("Blood Panel", 5000), ("X-Ray", 3000)],
        )];

        let rows = build_history_rows(&orders, HistoryRange::D3, now);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].clinic_name, "Happy Paws");
    }

    #[test]
    fn test_filters_are_exact_matches() {
        let now = Utc::now();
        let orders = vec![
            order_at(1, now, Some("Alice"), vec![("X-Ray", 3000)]),
            order_at(2, now, Some("Bruno"), vec![("X-Ray", 3000)]),
        ];
        let rows = build_history_rows(&orders, HistoryRange::D3, now);

        let filter = HistoryFilter {
            vet: Some("Alice".to_string()),
            ..HistoryFilter::default()
        };
        let filtered = apply_filters(rows, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].order_id, 1);
    }

    #[test]
    fn test_summary_totals_and_top_exams() {
        let now = Utc::now();
        let orders = vec![
            order_at(1, now, Some("Alice"), vec![("X-Ray", 3000), ("Blood Panel", 5000)]),
            order_at(2, now, Some("Alice"), vec![("Blood Panel", 5000)]),
            order_at(3, now, Some("Alice"), vec![("Antibody Titer", 5000)]),
        ];
        let rows = build_history_rows(&orders, HistoryRange::D3, now);
        let summary = summarize(&rows);

        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.total_cents, 18000);
        assert_eq!(
            summary.top_exams[0],
            TopExam { name: "Blood Panel".to_string(), count: 2 }
        );
        // Tie between the single-count exams resolves alphabetically.
        assert_eq!(summary.top_exams[1].name, "Antibody Titer");
        assert_eq!(summary.top_exams[2].name, "X-Ray");
    }
}
