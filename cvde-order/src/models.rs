use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use cvde_shared::{Masked, ProfessionalAffiliation};

use crate::selection::SelectedExam;

/// Order status in the lifecycle. New orders start out `requested`; admins
/// move them forward (or cancel) through a direct-set dropdown, so every
/// value is reachable from every non-terminal one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Requested,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Requested => "requested",
            OrderStatus::Scheduled => "scheduled",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human label as shown in the status dropdown.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "in progress",
            other => other.as_str(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(OrderStatus::Requested),
            "scheduled" => Ok(OrderStatus::Scheduled),
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NeuterStatus {
    Neutered,
    NotNeutered,
    Unknown,
}

impl NeuterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeuterStatus::Neutered => "neutered",
            NeuterStatus::NotNeutered => "not_neutered",
            NeuterStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for NeuterStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neutered" => Ok(NeuterStatus::Neutered),
            "not_neutered" => Ok(NeuterStatus::NotNeutered),
            "unknown" => Ok(NeuterStatus::Unknown),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReactiveStatus {
    Reactive,
    NotReactive,
}

impl ReactiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactiveStatus::Reactive => "reactive",
            ReactiveStatus::NotReactive => "not_reactive",
        }
    }
}

impl FromStr for ReactiveStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reactive" => Ok(ReactiveStatus::Reactive),
            "not_reactive" => Ok(ReactiveStatus::NotReactive),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A vet-submitted exam request. Vet and price fields are snapshots taken at
/// creation time, so later profile or catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamOrder {
    pub id: i64,
    pub vet_id: Uuid,
    pub vet_name_snapshot: Option<String>,
    pub vet_email_snapshot: Option<String>,
    pub vet_crmv_snapshot: Option<String>,
    pub vet_affiliation: Option<ProfessionalAffiliation>,
    pub owner_name: String,
    pub owner_government_id: Masked<String>,
    pub owner_phone: Masked<String>,
    pub owner_address: Option<String>,
    pub owner_email: Option<String>,
    pub patient_name: String,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age_years: Option<i32>,
    pub weight_kg: Option<f64>,
    pub neuter_status: Option<NeuterStatus>,
    pub reactive_status: Option<ReactiveStatus>,
    pub clinical_notes: Option<String>,
    pub selected_exams: Vec<SelectedExam>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub request_collection: bool,
    pub driver_collection_requested: bool,
    pub driver_requested_at: Option<DateTime<Utc>>,
    pub sample_received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl ExamOrder {
    /// Clinic line for driver messages and the history view.
    pub fn clinic_display_name(&self) -> &str {
        match &self.vet_affiliation {
            Some(affiliation) => affiliation.display_name(),
            None => "Clinic not informed",
        }
    }

    /// Comma-joined exam names, empty when no lines parsed.
    pub fn exam_names(&self) -> String {
        self.selected_exams
            .iter()
            .map(|line| line.exam_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Applies the full admin edit bundle and touches the modification
    /// metadata. Version checks happen in the repository before this runs.
    pub fn apply_edit(&mut self, edit: &OrderEdit) {
        self.status = edit.status.clone();
        self.scheduled_for = edit.scheduled_for;
        self.admin_notes = edit.admin_notes.clone();
        self.driver_collection_requested = edit.driver_collection_requested;
        self.driver_requested_at = edit.driver_requested_at;
        self.sample_received_at = edit.sample_received_at;
        self.updated_at = Utc::now();
        self.version += 1;
    }
}

/// A validated order ready for insertion. The repository assigns the id,
/// `requested` status, timestamps and the initial version.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub vet_id: Uuid,
    pub vet_name_snapshot: Option<String>,
    pub vet_email_snapshot: Option<String>,
    pub vet_crmv_snapshot: Option<String>,
    pub vet_affiliation: Option<ProfessionalAffiliation>,
    pub owner_name: String,
    pub owner_government_id: Masked<String>,
    pub owner_phone: Masked<String>,
    pub owner_address: Option<String>,
    pub owner_email: Option<String>,
    pub patient_name: String,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age_years: Option<i32>,
    pub weight_kg: Option<f64>,
    pub neuter_status: Option<NeuterStatus>,
    pub reactive_status: Option<ReactiveStatus>,
    pub clinical_notes: Option<String>,
    pub selected_exams: Vec<SelectedExam>,
    pub total_cents: i64,
    pub request_collection: bool,
}

/// The full mutable set of an order, saved in one call so an admin edit never
/// silently drops a field it did not touch. Starts as a carry-forward copy of
/// the latest known order state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEdit {
    pub status: OrderStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub driver_collection_requested: bool,
    pub driver_requested_at: Option<DateTime<Utc>>,
    pub sample_received_at: Option<DateTime<Utc>>,
    /// Version the editor last read; a mismatch at save time means someone
    /// else updated the order in between and the write is rejected.
    pub expected_version: i64,
}

impl OrderEdit {
    pub fn from_order(order: &ExamOrder) -> Self {
        OrderEdit {
            status: order.status.clone(),
            scheduled_for: order.scheduled_for,
            admin_notes: order.admin_notes.clone(),
            driver_collection_requested: order.driver_collection_requested,
            driver_requested_at: order.driver_requested_at,
            sample_received_at: order.sample_received_at,
            expected_version: order.version,
        }
    }

    /// Driver toggle. Turning it on stamps the contact time and keeps any
    /// recorded receipt; turning it off restarts tracking from scratch by
    /// clearing both timestamps.
    pub fn set_driver_requested(&mut self, requested: bool, now: DateTime<Utc>) {
        if requested {
            self.driver_collection_requested = true;
            self.driver_requested_at = Some(now);
        } else {
            self.driver_collection_requested = false;
            self.driver_requested_at = None;
            self.sample_received_at = None;
        }
    }

    pub fn set_sample_received(&mut self, now: DateTime<Utc>) {
        self.sample_received_at = Some(now);
    }

    /// Run before persisting. Blank admin notes collapse to none, and an
    /// edit with the driver toggle off cannot carry tracking timestamps.
    pub fn normalized(mut self) -> Self {
        self.admin_notes = self
            .admin_notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());
        if !self.driver_collection_requested {
            self.driver_requested_at = None;
            self.sample_received_at = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> ExamOrder {
        ExamOrder {
            id: 7,
            vet_id: Uuid::new_v4(),
            vet_name_snapshot: Some("Alice Souza".to_string()),
            vet_email_snapshot: Some("alice@clinic.example".to_string()),
            vet_crmv_snapshot: Some("CRMV-12345".to_string()),
            vet_affiliation: Some(ProfessionalAffiliation::Clinic {
                name: "Happy Paws".to_string(),
                address: Some("12 Main St".to_string()),
            }),
            owner_name: "Bruna Lima".to_string(),
            owner_government_id: Masked::new("12345678909".to_string()),
            owner_phone: Masked::new("11988887777".to_string()),
            owner_address: None,
            owner_email: None,
            patient_name: "Rex".to_string(),
            species: Some("Dog".to_string()),
            breed: None,
            age_years: Some(4),
            weight_kg: Some(18.2),
            neuter_status: Some(NeuterStatus::Neutered),
            reactive_status: Some(ReactiveStatus::NotReactive),
            clinical_notes: None,
            selected_exams: vec![
                SelectedExam {
                    exam_id: 1,
                    exam_name: "Blood Panel".to_string(),
                    unit_price_cents: 5000,
                },
                SelectedExam {
                    exam_id: 2,
                    exam_name: "X-Ray".to_string(),
                    unit_price_cents: 3000,
                },
            ],
            total_cents: 8000,
            status: OrderStatus::Requested,
            scheduled_for: None,
            admin_notes: None,
            request_collection: true,
            driver_collection_requested: false,
            driver_requested_at: None,
            sample_received_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Requested,
            OrderStatus::Scheduled,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::InProgress.label(), "in progress");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Requested.is_terminal());
        assert!(!OrderStatus::Scheduled.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_edit_carries_forward_untouched_fields() {
        let order = sample_order();
        let mut edit = OrderEdit::from_order(&order);
        edit.status = OrderStatus::Scheduled;

        assert_eq!(edit.driver_collection_requested, false);
        assert_eq!(edit.admin_notes, None);
        assert_eq!(edit.expected_version, 1);
    }

    #[test]
    fn test_driver_toggle_off_clears_both_timestamps() {
        let order = sample_order();
        let mut edit = OrderEdit::from_order(&order);
        let now = Utc::now();

        edit.set_driver_requested(true, now);
        edit.set_sample_received(now + chrono::Duration::minutes(10));
        assert!(edit.driver_requested_at.is_some());
        assert!(edit.sample_received_at.is_some());

        edit.set_driver_requested(false, now);
        assert_eq!(edit.driver_requested_at, None);
        assert_eq!(edit.sample_received_at, None);
    }

    #[test]
    fn test_driver_toggle_on_preserves_receipt() {
        let order = sample_order();
        let mut edit = OrderEdit::from_order(&order);
        let first = Utc::now();
        let received = first + chrono::Duration::minutes(20);
        let again = first + chrono::Duration::minutes(30);

        edit.set_driver_requested(true, first);
        edit.set_sample_received(received);
        edit.set_driver_requested(true, again);

        assert_eq!(edit.driver_requested_at, Some(again));
        assert_eq!(edit.sample_received_at, Some(received));
    }

    #[test]
    fn test_apply_edit_bumps_version() {
        let mut order = sample_order();
        let mut edit = OrderEdit::from_order(&order);
        edit.status = OrderStatus::Scheduled;
        edit.admin_notes = Some("call first".to_string());

        order.apply_edit(&edit);
        assert_eq!(order.status, OrderStatus::Scheduled);
        assert_eq!(order.admin_notes.as_deref(), Some("call first"));
        assert_eq!(order.version, 2);
    }

    #[test]
    fn test_normalized_blank_notes() {
        let order = sample_order();
        let mut edit = OrderEdit::from_order(&order);
        edit.admin_notes = Some("   ".to_string());
        assert_eq!(edit.normalized().admin_notes, None);
    }

    #[test]
    fn test_normalized_drops_timestamps_when_toggle_is_off() {
        let order = sample_order();
        let mut edit = OrderEdit::from_order(&order);
        let now = Utc::now();
        edit.driver_collection_requested = false;
        edit.driver_requested_at = Some(now);
        edit.sample_received_at = Some(now);

        let cleaned = edit.normalized();
        assert_eq!(cleaned.driver_requested_at, None);
        assert_eq!(cleaned.sample_received_at, None);

        let mut kept = OrderEdit::from_order(&order);
        kept.set_driver_requested(true, now);
        let kept = kept.normalized();
        assert_eq!(kept.driver_requested_at, Some(now));
    }

    #[test]
    fn test_clinic_display_name_fallbacks() {
        let mut order = sample_order();
        assert_eq!(order.clinic_display_name(), "Happy Paws");

        order.vet_affiliation = Some(ProfessionalAffiliation::Independent);
        assert_eq!(order.clinic_display_name(), "Independent Professional");

        order.vet_affiliation = None;
        assert_eq!(order.clinic_display_name(), "Clinic not informed");
    }
}
