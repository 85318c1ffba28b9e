use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Portal roles. Vets order exams, admins triage them; there is no third kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    VetUser,
    AdminUser,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::VetUser => "vet_user",
            UserRole::AdminUser => "admin_user",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown user role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vet_user" => Ok(UserRole::VetUser),
            "admin_user" => Ok(UserRole::AdminUser),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
