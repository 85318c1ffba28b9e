use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use cvde_catalog::ExamCatalogItem;

use crate::draft::OrderValidationError;

/// One priced line inside an order. A snapshot of the catalog entry at
/// selection time; later price edits never touch stored lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedExam {
    pub exam_id: i64,
    pub exam_name: String,
    pub unit_price_cents: i64,
}

/// Output of the selection engine: the priced lines in catalog order plus
/// their server-computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub lines: Vec<SelectedExam>,
    pub total_cents: i64,
}

/// Prices a set of chosen exam ids against the current catalog. Duplicates
/// collapse, unknown and inactive ids are skipped, and the result keeps the
/// catalog's ordering regardless of the order ids arrived in. Totals come
/// from here, never from the client.
pub fn build_selection(
    catalog: &[ExamCatalogItem],
    selected_ids: &[i64],
) -> Result<Selection, OrderValidationError> {
    let wanted: HashSet<i64> = selected_ids.iter().copied().collect();

    let lines: Vec<SelectedExam> = catalog
        .iter()
        .filter(|exam| exam.active && wanted.contains(&exam.id))
        .map(|exam| SelectedExam {
            exam_id: exam.id,
            exam_name: exam.name.clone(),
            unit_price_cents: exam.price_cents,
        })
        .collect();

    if lines.is_empty() {
        return Err(OrderValidationError::NoExamsSelected);
    }

    let total_cents = lines.iter().map(|line| line.unit_price_cents).sum();
    Ok(Selection { lines, total_cents })
}

/// Tolerant reader for the stored `selected_exams` JSON. Entries missing a
/// valid id, name or price are dropped rather than failing the whole order.
pub fn parse_selected_exams(value: &serde_json::Value) -> Vec<SelectedExam> {
    match value.as_array() {
        Some(items) => items.iter().filter_map(selected_exam_from_value).collect(),
        None => Vec::new(),
    }
}

fn selected_exam_from_value(value: &serde_json::Value) -> Option<SelectedExam> {
    let exam_id = value.get("exam_id")?.as_i64()?;
    let exam_name = value.get("exam_name")?.as_str()?;
    let unit_price_cents = value.get("unit_price_cents")?.as_i64()?;

    Some(SelectedExam {
        exam_id,
        exam_name: exam_name.to_string(),
        unit_price_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn catalog() -> Vec<ExamCatalogItem> {
        let now = Utc::now();
        let item = |id: i64, name: &str, price_cents: i64, active: bool| ExamCatalogItem {
            id,
            name: name.to_string(),
            description: None,
            category: None,
            price_cents,
            active,
            created_at: now,
            updated_at: now,
        };
        vec![
            item(1, "Blood Panel", 5000, true),
            item(2, "X-Ray", 3000, true),
            item(3, "Retired Exam", 9900, false),
        ]
    }

    #[test]
    fn test_selection_totals_and_keeps_catalog_order() {
        let selection = build_selection(&catalog(), &[2, 1]).unwrap();
        assert_eq!(selection.total_cents, 8000);
        assert_eq!(selection.lines[0].exam_name, "Blood Panel");
        assert_eq!(selection.lines[1].exam_name, "X-Ray");
    }

    #[test]
    fn test_selection_total_invariant_under_permutation() {
        let forward = build_selection(&catalog(), &[1, 2]).unwrap();
        let backward = build_selection(&catalog(), &[2, 1]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_selection_dedupes_ids() {
        let selection = build_selection(&catalog(), &[1, 1, 1]).unwrap();
        assert_eq!(selection.lines.len(), 1);
        assert_eq!(selection.total_cents, 5000);
    }

    #[test]
    fn test_selection_skips_inactive_and_unknown() {
        let selection = build_selection(&catalog(), &[1, 3, 99]).unwrap();
        assert_eq!(selection.lines.len(), 1);
        assert_eq!(selection.lines[0].exam_id, 1);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        assert_eq!(
            build_selection(&catalog(), &[]).unwrap_err(),
            OrderValidationError::NoExamsSelected
        );
        // Only-inactive picks behave like picking nothing.
        assert_eq!(
            build_selection(&catalog(), &[3]).unwrap_err(),
            OrderValidationError::NoExamsSelected
        );
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        let stored = serde_json::json!([
            { "exam_id": 1, "exam_name": "Blood Panel", "unit_price_cents": 5000 },
            { "exam_id": "not-a-number", "exam_name": "Broken", "unit_price_cents": 100 },
            { "exam_name": "Missing id", "unit_price_cents": 100 },
            "not an object",
            { "exam_id": 2, "exam_name": "X-Ray", "unit_price_cents": 3000 }
        ]);

        let parsed = parse_selected_exams(&stored);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].exam_id, 1);
        assert_eq!(parsed[1].exam_id, 2);
    }

    #[test]
    fn test_parse_non_array_is_empty() {
        assert!(parse_selected_exams(&serde_json::json!(null)).is_empty());
        assert!(parse_selected_exams(&serde_json::json!({"exam_id": 1})).is_empty());
    }

    #[test]
    fn test_parse_round_trips_engine_output() {
        let selection = build_selection(&catalog(), &[1, 2]).unwrap();
        let stored = serde_json::to_value(&selection.lines).unwrap();
        assert_eq!(parse_selected_exams(&stored), selection.lines);
    }
}
