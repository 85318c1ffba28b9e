use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cvde_shared::format::digits_only;
use cvde_shared::Masked;
pub use cvde_shared::ProfessionalAffiliation;

use crate::identity::UserRole;

/// A portal account. Admin profiles only carry identity and role; the
/// remaining fields exist for the vet registration gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub crmv: Option<String>,
    pub government_id: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
    pub affiliation: Option<ProfessionalAffiliation>,
    pub registration_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The registration gate. Admins are always through; a stored completion
    /// flag short-circuits; otherwise every basic field must be filled in.
    /// A clinic affiliation carries its clinic name by construction, so the
    /// legacy "clinic implies clinic name" check is the variant existing.
    pub fn is_registration_complete(&self) -> bool {
        if self.role != UserRole::VetUser {
            return true;
        }
        if self.registration_completed {
            return true;
        }

        has_value(&self.full_name)
            && has_value(&self.crmv)
            && has_masked_value(&self.government_id)
            && has_masked_value(&self.phone)
            && self.affiliation.is_some()
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

fn has_masked_value(value: &Option<Masked<String>>) -> bool {
    value
        .as_ref()
        .is_some_and(|masked| !masked.as_str().trim().is_empty())
}

/// Rejections raised by the registration and profile forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Please fill all required registration fields.")]
    MissingRequiredFields,

    #[error("Government ID must have 11 digits.")]
    InvalidGovernmentId,

    #[error("Phone must have 11 digits.")]
    InvalidPhone,

    #[error("Please provide the clinic name.")]
    MissingClinicName,

    #[error("Please provide the clinic address.")]
    MissingClinicAddress,

    #[error("Name is required.")]
    MissingName,
}

/// Raw registration submission. Everything defaults so partial payloads land
/// in validation messages rather than decode failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub crmv: String,
    pub government_id: String,
    pub phone: String,
    pub professional_type: String,
    pub clinic_name: String,
    pub clinic_address: String,
}

/// Validated registration data, ready to persist. Saving this also flips the
/// profile's `registration_completed` flag.
#[derive(Debug, Clone)]
pub struct RegistrationDetails {
    pub full_name: String,
    pub crmv: String,
    pub government_id: Masked<String>,
    pub phone: Masked<String>,
    pub affiliation: ProfessionalAffiliation,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<RegistrationDetails, RegistrationError> {
        let full_name = self.full_name.trim();
        let crmv = self.crmv.trim();
        let government_id = self.government_id.trim();
        let phone = self.phone.trim();
        let professional_type = self.professional_type.trim();

        if full_name.is_empty()
            || crmv.is_empty()
            || government_id.is_empty()
            || phone.is_empty()
            || professional_type.is_empty()
        {
            return Err(RegistrationError::MissingRequiredFields);
        }

        let government_id = digits_only(government_id);
        if government_id.len() != 11 {
            return Err(RegistrationError::InvalidGovernmentId);
        }
        let phone = digits_only(phone);
        if phone.len() != 11 {
            return Err(RegistrationError::InvalidPhone);
        }

        let affiliation = match professional_type {
            "clinic" => {
                let name = self.clinic_name.trim();
                if name.is_empty() {
                    return Err(RegistrationError::MissingClinicName);
                }
                let address = self.clinic_address.trim();
                if address.is_empty() {
                    return Err(RegistrationError::MissingClinicAddress);
                }
                ProfessionalAffiliation::Clinic {
                    name: name.to_string(),
                    address: Some(address.to_string()),
                }
            }
            "independent" => ProfessionalAffiliation::Independent,
            _ => return Err(RegistrationError::MissingRequiredFields),
        };

        Ok(RegistrationDetails {
            full_name: full_name.to_string(),
            crmv: crmv.to_string(),
            government_id: Masked::new(government_id),
            phone: Masked::new(phone),
            affiliation,
        })
    }
}

/// Profile-name edit from the vet profile screen.
pub fn validate_profile_name(input: &str) -> Result<String, RegistrationError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(RegistrationError::MissingName);
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vet_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: Some("alice@clinic.example".to_string()),
            full_name: Some("Alice Souza".to_string()),
            role: UserRole::VetUser,
            crmv: Some("CRMV-12345".to_string()),
            government_id: Some(Masked::new("12345678909".to_string())),
            phone: Some(Masked::new("11988887777".to_string())),
            affiliation: Some(ProfessionalAffiliation::Independent),
            registration_completed: false,
            created_at: Utc::now(),
        }
    }

    fn clinic_form() -> RegistrationForm {
        RegistrationForm {
            full_name: " Alice Souza ".to_string(),
            crmv: "CRMV-12345".to_string(),
            government_id: "123.456.789-09".to_string(),
            phone: "(11) 98888-7777".to_string(),
            professional_type: "clinic".to_string(),
            clinic_name: "Happy Paws".to_string(),
            clinic_address: "12 Main St".to_string(),
        }
    }

    #[test]
    fn test_admins_are_always_complete() {
        let mut profile = vet_profile();
        profile.role = UserRole::AdminUser;
        profile.full_name = None;
        assert!(profile.is_registration_complete());
    }

    #[test]
    fn test_completion_flag_short_circuits() {
        let mut profile = vet_profile();
        profile.crmv = None;
        profile.registration_completed = true;
        assert!(profile.is_registration_complete());
    }

    #[test]
    fn test_legacy_fallback_requires_basics() {
        let profile = vet_profile();
        assert!(profile.is_registration_complete());

        let mut missing_crmv = vet_profile();
        missing_crmv.crmv = Some("   ".to_string());
        assert!(!missing_crmv.is_registration_complete());

        let mut no_affiliation = vet_profile();
        no_affiliation.affiliation = None;
        assert!(!no_affiliation.is_registration_complete());
    }

    #[test]
    fn test_registration_form_happy_path() {
        let details = clinic_form().validate().unwrap();
        assert_eq!(details.full_name, "Alice Souza");
        assert_eq!(details.government_id.as_str(), "12345678909");
        assert_eq!(details.phone.as_str(), "11988887777");
        assert_eq!(
            details.affiliation,
            ProfessionalAffiliation::Clinic {
                name: "Happy Paws".to_string(),
                address: Some("12 Main St".to_string()),
            }
        );
    }

    #[test]
    fn test_registration_form_required_fields() {
        let mut form = clinic_form();
        form.crmv = "  ".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            RegistrationError::MissingRequiredFields
        );
    }

    #[test]
    fn test_registration_form_digit_rules() {
        let mut form = clinic_form();
        form.government_id = "123.456.789-0".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            RegistrationError::InvalidGovernmentId
        );

        let mut form = clinic_form();
        form.phone = "988887777".to_string();
        assert_eq!(form.validate().unwrap_err(), RegistrationError::InvalidPhone);
    }

    #[test]
    fn test_registration_form_clinic_fields() {
        let mut form = clinic_form();
        form.clinic_name = "".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            RegistrationError::MissingClinicName
        );

        let mut form = clinic_form();
        form.clinic_address = "  ".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            RegistrationError::MissingClinicAddress
        );

        let mut form = clinic_form();
        form.professional_type = "independent".to_string();
        form.clinic_name = "".to_string();
        assert_eq!(
            form.validate().unwrap().affiliation,
            ProfessionalAffiliation::Independent
        );
    }

    #[test]
    fn test_profile_name_update_rule() {
        assert_eq!(validate_profile_name("  Alice  ").unwrap(), "Alice");
        assert_eq!(
            validate_profile_name("   ").unwrap_err().to_string(),
            "Name is required."
        );
    }
}
