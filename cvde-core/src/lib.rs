pub mod faq;
pub mod identity;
pub mod profile;
pub mod repository;

pub use identity::UserRole;
pub use profile::{Profile, ProfessionalAffiliation, RegistrationDetails, RegistrationForm};
pub use repository::{
    CatalogStore, FaqStore, OrderRepository, OrderScope, ProfileStore, RepoError, RepoResult,
    SettingsStore, DRIVER_PHONE_SETTING,
};
