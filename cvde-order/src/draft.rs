use serde::Deserialize;
use uuid::Uuid;

use cvde_shared::format::digits_only;
use cvde_shared::{Masked, ProfessionalAffiliation};

use crate::models::{NeuterStatus, NewOrder, ReactiveStatus};
use crate::selection::Selection;

/// Rejections raised before anything touches the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    #[error("Please fill all required patient and owner fields.")]
    MissingRequiredFields,

    #[error("Owner government ID must have 11 digits.")]
    InvalidOwnerGovernmentId,

    #[error("Owner phone must have 11 digits.")]
    InvalidOwnerPhone,

    #[error("Select at least one exam before sending the order.")]
    NoExamsSelected,

    #[error("Complete your registration before ordering exams.")]
    RegistrationIncomplete,
}

/// Vet identity copied into the order at creation time.
#[derive(Debug, Clone)]
pub struct VetSnapshot {
    pub vet_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub crmv: Option<String>,
    pub affiliation: Option<ProfessionalAffiliation>,
}

/// Raw order submission as it arrives from the vet form. Everything defaults
/// so missing fields surface as validation messages instead of decode errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderDraft {
    pub owner_name: String,
    pub owner_government_id: String,
    pub owner_phone: String,
    pub owner_address: String,
    pub owner_email: String,
    pub patient_name: String,
    pub species: String,
    pub breed: String,
    pub age_years: Option<i32>,
    pub weight_kg: Option<f64>,
    pub neuter_status: Option<NeuterStatus>,
    pub reactive_status: Option<ReactiveStatus>,
    pub clinical_notes: String,
    pub selected_exam_ids: Vec<i64>,
    pub request_collection: bool,
}

impl OrderDraft {
    /// Field-level checks: required presence first, then document formats.
    /// Exam selection is validated separately by the selection engine.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        let required = [
            self.owner_name.as_str(),
            self.owner_government_id.as_str(),
            self.owner_phone.as_str(),
            self.patient_name.as_str(),
            self.species.as_str(),
        ];
        let missing_text = required.iter().any(|field| field.trim().is_empty());
        let missing_age = !self.age_years.is_some_and(|age| age >= 0);
        if missing_text || missing_age {
            return Err(OrderValidationError::MissingRequiredFields);
        }

        if digits_only(&self.owner_government_id).len() != 11 {
            return Err(OrderValidationError::InvalidOwnerGovernmentId);
        }
        if digits_only(&self.owner_phone).len() != 11 {
            return Err(OrderValidationError::InvalidOwnerPhone);
        }

        Ok(())
    }

    /// Validates and assembles the insertable order from this draft, the
    /// submitting vet's snapshot and the priced selection. The government ID
    /// and phone are stored digit-normalized.
    pub fn into_new_order(
        self,
        vet: VetSnapshot,
        selection: Selection,
    ) -> Result<NewOrder, OrderValidationError> {
        self.validate()?;

        Ok(NewOrder {
            vet_id: vet.vet_id,
            vet_name_snapshot: vet.name,
            vet_email_snapshot: vet.email,
            vet_crmv_snapshot: vet.crmv,
            vet_affiliation: vet.affiliation,
            owner_name: self.owner_name.trim().to_string(),
            owner_government_id: Masked::new(digits_only(&self.owner_government_id)),
            owner_phone: Masked::new(digits_only(&self.owner_phone)),
            owner_address: trim_to_option(&self.owner_address),
            owner_email: trim_to_option(&self.owner_email),
            patient_name: self.patient_name.trim().to_string(),
            species: trim_to_option(&self.species),
            breed: trim_to_option(&self.breed),
            age_years: self.age_years,
            weight_kg: self.weight_kg,
            neuter_status: self.neuter_status,
            reactive_status: self.reactive_status,
            clinical_notes: trim_to_option(&self.clinical_notes),
            selected_exams: selection.lines,
            total_cents: selection.total_cents,
            request_collection: self.request_collection,
        })
    }
}

fn trim_to_option(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
