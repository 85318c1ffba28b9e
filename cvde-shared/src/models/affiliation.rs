use serde::{Deserialize, Serialize};

/// How a vet practices. Clinic affiliations carry the clinic identity; the
/// variant shape makes it impossible to read clinic fields without first
/// establishing that the vet works at one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "professional_type", rename_all = "snake_case")]
pub enum ProfessionalAffiliation {
    Clinic {
        #[serde(rename = "clinic_name")]
        name: String,
        #[serde(rename = "clinic_address", default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
    Independent,
}

impl ProfessionalAffiliation {
    /// Rebuilds the variant from the three nullable storage columns. Rows
    /// claiming `clinic` without a usable clinic name are treated as not
    /// affiliated at all rather than surfacing a half-filled clinic.
    pub fn from_columns(
        professional_type: Option<&str>,
        clinic_name: Option<String>,
        clinic_address: Option<String>,
    ) -> Option<Self> {
        match professional_type {
            Some("clinic") => {
                let name = clinic_name.filter(|name| !name.trim().is_empty())?;
                let address = clinic_address.filter(|addr| !addr.trim().is_empty());
                Some(ProfessionalAffiliation::Clinic { name, address })
            }
            Some("independent") => Some(ProfessionalAffiliation::Independent),
            _ => None,
        }
    }

    pub fn professional_type(&self) -> &'static str {
        match self {
            ProfessionalAffiliation::Clinic { .. } => "clinic",
            ProfessionalAffiliation::Independent => "independent",
        }
    }

    pub fn clinic_name(&self) -> Option<&str> {
        match self {
            ProfessionalAffiliation::Clinic { name, .. } => Some(name.as_str()),
            ProfessionalAffiliation::Independent => None,
        }
    }

    pub fn clinic_address(&self) -> Option<&str> {
        match self {
            ProfessionalAffiliation::Clinic { address, .. } => address.as_deref(),
            ProfessionalAffiliation::Independent => None,
        }
    }

    /// Name shown wherever the order needs a clinic line.
    pub fn display_name(&self) -> &str {
        match self {
            ProfessionalAffiliation::Clinic { name, .. } => name.as_str(),
            ProfessionalAffiliation::Independent => "Independent Professional",
        }
    }
}
