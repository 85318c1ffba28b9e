use async_trait::async_trait;
use uuid::Uuid;

use cvde_catalog::{ExamCatalogItem, ExamDetailsUpdate, NewExam};
use cvde_order::{ExamOrder, NewOrder, OrderEdit};

use crate::faq::{FaqEntry, NewFaqEntry};
use crate::profile::{Profile, RegistrationDetails};

/// The single settings key the portal uses today.
pub const DRIVER_PHONE_SETTING: &str = "driver_phone";

/// Failures shared by every storage backend. Handlers surface `Database`
/// messages verbatim; the named variants carry their own user-facing text.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("An exam with this name already exists.")]
    DuplicateName,

    #[error("This order was updated by someone else. Reload and try again.")]
    VersionConflict,
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Whose orders a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Vet(Uuid),
    All,
}

/// Repository trait for the exam catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Sorted by name; vets pass `only_active`, admins see everything.
    async fn list_exams(&self, only_active: bool) -> RepoResult<Vec<ExamCatalogItem>>;

    /// Duplicate names (case-insensitive) fail with `DuplicateName`.
    async fn create_exam(&self, exam: NewExam) -> RepoResult<ExamCatalogItem>;

    async fn update_exam(&self, id: i64, update: ExamDetailsUpdate) -> RepoResult<ExamCatalogItem>;

    async fn update_exam_price(&self, id: i64, price_cents: i64) -> RepoResult<ExamCatalogItem>;

    async fn set_exam_active(&self, id: i64, active: bool) -> RepoResult<ExamCatalogItem>;
}

/// Repository trait for exam orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> RepoResult<ExamOrder>;

    /// Newest first. Admin scope fills missing vet snapshots from the
    /// submitting vet's current profile.
    async fn list_orders(&self, scope: OrderScope) -> RepoResult<Vec<ExamOrder>>;

    async fn get_order(&self, id: i64) -> RepoResult<ExamOrder>;

    /// Applies the full edit bundle. A stale `expected_version` fails with
    /// `VersionConflict` and leaves the row untouched.
    async fn update_order(&self, id: i64, edit: OrderEdit) -> RepoResult<ExamOrder>;
}

/// Repository trait for portal settings, one value per key
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> RepoResult<()>;
}

/// Repository trait for account profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> RepoResult<Profile>;

    /// Persists the registration details and marks the profile completed.
    async fn complete_registration(
        &self,
        user_id: Uuid,
        details: RegistrationDetails,
    ) -> RepoResult<Profile>;

    async fn update_full_name(&self, user_id: Uuid, full_name: &str) -> RepoResult<Profile>;
}

/// Repository trait for FAQ entries
#[async_trait]
pub trait FaqStore: Send + Sync {
    /// Admin listing is newest first; vets only see active entries.
    async fn list_faq(&self, only_active: bool) -> RepoResult<Vec<FaqEntry>>;

    async fn create_faq(&self, entry: NewFaqEntry) -> RepoResult<FaqEntry>;

    async fn set_faq_active(&self, id: i64, active: bool) -> RepoResult<FaqEntry>;
}
