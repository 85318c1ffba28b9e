pub mod format;
pub mod models;
pub mod pii;

pub use models::affiliation::ProfessionalAffiliation;
pub use models::events::{OrderChangeKind, OrderChangedEvent};
pub use pii::Masked;
