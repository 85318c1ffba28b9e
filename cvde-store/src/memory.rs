//! In-memory implementations of the portal stores. These back the HTTP tests
//! and local development without a database; semantics mirror the Postgres
//! repositories, including duplicate-name and version-guard behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use uuid::Uuid;

use cvde_catalog::{ExamCatalogItem, ExamDetailsUpdate, NewExam};
use cvde_core::faq::{FaqEntry, NewFaqEntry};
use cvde_core::profile::{Profile, RegistrationDetails};
use cvde_core::repository::{
    CatalogStore, FaqStore, OrderRepository, OrderScope, ProfileStore, RepoError, RepoResult,
    SettingsStore,
};
use cvde_order::{ExamOrder, NewOrder, OrderEdit, OrderStatus};
use cvde_shared::{OrderChangeKind, OrderChangedEvent};

// ==================== Catalog ====================

pub struct MemoryCatalogRepository {
    exams: Mutex<Vec<ExamCatalogItem>>,
    next_id: AtomicI64,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self {
        Self {
            exams: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

fn name_taken(exams: &[ExamCatalogItem], name: &str, except_id: Option<i64>) -> bool {
    exams
        .iter()
        .any(|e| Some(e.id) != except_id && e.name.eq_ignore_ascii_case(name))
}

#[async_trait]
impl CatalogStore for MemoryCatalogRepository {
    async fn list_exams(&self, only_active: bool) -> RepoResult<Vec<ExamCatalogItem>> {
        let exams = self.exams.lock().await;
        let mut listed: Vec<ExamCatalogItem> = exams
            .iter()
            .filter(|e| !only_active || e.active)
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn create_exam(&self, exam: NewExam) -> RepoResult<ExamCatalogItem> {
        let mut exams = self.exams.lock().await;
        if name_taken(&exams, &exam.name, None) {
            return Err(RepoError::DuplicateName);
        }

        let now = Utc::now();
        let created = ExamCatalogItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: exam.name,
            description: exam.description,
            category: exam.category,
            price_cents: exam.price_cents,
            active: true,
            created_at: now,
            updated_at: now,
        };
        exams.push(created.clone());
        Ok(created)
    }

    async fn update_exam(&self, id: i64, update: ExamDetailsUpdate) -> RepoResult<ExamCatalogItem> {
        let mut exams = self.exams.lock().await;
        if name_taken(&exams, &update.name, Some(id)) {
            return Err(RepoError::DuplicateName);
        }

        let exam = exams
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepoError::NotFound("Exam", id.to_string()))?;
        exam.name = update.name;
        exam.description = update.description;
        exam.category = update.category;
        exam.active = update.active;
        exam.updated_at = Utc::now();
        Ok(exam.clone())
    }

    async fn update_exam_price(&self, id: i64, price_cents: i64) -> RepoResult<ExamCatalogItem> {
        let mut exams = self.exams.lock().await;
        let exam = exams
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepoError::NotFound("Exam", id.to_string()))?;
        exam.price_cents = price_cents;
        exam.updated_at = Utc::now();
        Ok(exam.clone())
    }

    async fn set_exam_active(&self, id: i64, active: bool) -> RepoResult<ExamCatalogItem> {
        let mut exams = self.exams.lock().await;
        let exam = exams
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepoError::NotFound("Exam", id.to_string()))?;
        exam.active = active;
        exam.updated_at = Utc::now();
        Ok(exam.clone())
    }
}

// ==================== Orders ====================

pub struct MemoryOrderRepository {
    orders: Mutex<Vec<ExamOrder>>,
    next_id: AtomicI64,
    feed: broadcast::Sender<OrderChangedEvent>,
}

impl MemoryOrderRepository {
    /// Without a database trigger behind it, this repository publishes change
    /// events itself.
    pub fn new(feed: broadcast::Sender<OrderChangedEvent>) -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            feed,
        }
    }

    fn publish(&self, order_id: i64, change: OrderChangeKind) {
        let event = OrderChangedEvent {
            order_id,
            change,
            occurred_at: Utc::now().timestamp(),
        };
        // Send only fails when no subscriber is connected.
        let _ = self.feed.send(event);
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create_order(&self, order: NewOrder) -> RepoResult<ExamOrder> {
        let now = Utc::now();
        let created = ExamOrder {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            vet_id: order.vet_id,
            vet_name_snapshot: order.vet_name_snapshot,
            vet_email_snapshot: order.vet_email_snapshot,
            vet_crmv_snapshot: order.vet_crmv_snapshot,
            vet_affiliation: order.vet_affiliation,
            owner_name: order.owner_name,
            owner_government_id: order.owner_government_id,
            owner_phone: order.owner_phone,
            owner_address: order.owner_address,
            owner_email: order.owner_email,
            patient_name: order.patient_name,
            species: order.species,
            breed: order.breed,
            age_years: order.age_years,
            weight_kg: order.weight_kg,
            neuter_status: order.neuter_status,
            reactive_status: order.reactive_status,
            clinical_notes: order.clinical_notes,
            selected_exams: order.selected_exams,
            total_cents: order.total_cents,
            status: OrderStatus::Requested,
            scheduled_for: None,
            admin_notes: None,
            request_collection: order.request_collection,
            driver_collection_requested: false,
            driver_requested_at: None,
            sample_received_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        self.orders.lock().await.push(created.clone());
        self.publish(created.id, OrderChangeKind::Created);
        Ok(created)
    }

    async fn list_orders(&self, scope: OrderScope) -> RepoResult<Vec<ExamOrder>> {
        let orders = self.orders.lock().await;
        let mut listed: Vec<ExamOrder> = orders
            .iter()
            .filter(|o| match scope {
                OrderScope::Vet(vet_id) => o.vet_id == vet_id,
                OrderScope::All => true,
            })
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(listed)
    }

    async fn get_order(&self, id: i64) -> RepoResult<ExamOrder> {
        let orders = self.orders.lock().await;
        orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound("Order", id.to_string()))
    }

    async fn update_order(&self, id: i64, edit: OrderEdit) -> RepoResult<ExamOrder> {
        let updated = {
            let mut orders = self.orders.lock().await;
            let order = orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| RepoError::NotFound("Order", id.to_string()))?;
            if order.version != edit.expected_version {
                return Err(RepoError::VersionConflict);
            }
            order.apply_edit(&edit);
            order.clone()
        };

        self.publish(id, OrderChangeKind::Updated);
        Ok(updated)
    }
}

// ==================== Profiles ====================

#[derive(Default)]
pub struct MemoryProfileRepository {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl MemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account, standing in for the identity provider's signup hook.
    pub async fn insert(&self, profile: Profile) {
        self.profiles.lock().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileRepository {
    async fn get_profile(&self, user_id: Uuid) -> RepoResult<Profile> {
        let profiles = self.profiles.lock().await;
        profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound("Profile", user_id.to_string()))
    }

    async fn complete_registration(
        &self,
        user_id: Uuid,
        details: RegistrationDetails,
    ) -> RepoResult<Profile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| RepoError::NotFound("Profile", user_id.to_string()))?;
        profile.full_name = Some(details.full_name);
        profile.crmv = Some(details.crmv);
        profile.government_id = Some(details.government_id);
        profile.phone = Some(details.phone);
        profile.affiliation = Some(details.affiliation);
        profile.registration_completed = true;
        Ok(profile.clone())
    }

    async fn update_full_name(&self, user_id: Uuid, full_name: &str) -> RepoResult<Profile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| RepoError::NotFound("Profile", user_id.to_string()))?;
        profile.full_name = Some(full_name.to_string());
        Ok(profile.clone())
    }
}

// ==================== Settings ====================

#[derive(Default)]
pub struct MemorySettingsRepository {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsRepository {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ==================== FAQ ====================

pub struct MemoryFaqRepository {
    entries: Mutex<Vec<FaqEntry>>,
    next_id: AtomicI64,
}

impl MemoryFaqRepository {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl FaqStore for MemoryFaqRepository {
    async fn list_faq(&self, only_active: bool) -> RepoResult<Vec<FaqEntry>> {
        let entries = self.entries.lock().await;
        let mut listed: Vec<FaqEntry> = entries
            .iter()
            .filter(|e| !only_active || e.active)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(listed)
    }

    async fn create_faq(&self, entry: NewFaqEntry) -> RepoResult<FaqEntry> {
        let created = FaqEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            question: entry.question,
            answer: entry.answer,
            category: entry.category,
            active: true,
            created_at: Utc::now(),
        };
        self.entries.lock().await.push(created.clone());
        Ok(created)
    }

    async fn set_faq_active(&self, id: i64, active: bool) -> RepoResult<FaqEntry> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepoError::NotFound("FAQ entry", id.to_string()))?;
        entry.active = active;
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvde_order::SelectedExam;
    use cvde_shared::Masked;

    fn sample_order(vet_id: Uuid) -> NewOrder {
        NewOrder {
            vet_id,
            vet_name_snapshot: Some("Ana Souza".to_string()),
            vet_email_snapshot: Some("ana@vetmail.example".to_string()),
            vet_crmv_snapshot: Some("SP-12345".to_string()),
            vet_affiliation: None,
            owner_name: "Carlos Pereira".to_string(),
            owner_government_id: Masked::new("12345678909".to_string()),
            owner_phone: Masked::new("11987654321".to_string()),
            owner_address: None,
            owner_email: None,
            patient_name: "Rex".to_string(),
            species: Some("Dog".to_string()),
            breed: Some("Beagle".to_string()),
            age_years: Some(4),
            weight_kg: None,
            neuter_status: None,
            reactive_status: None,
            clinical_notes: None,
            selected_exams: vec![SelectedExam {
                exam_id: 1,
                exam_name: "Complete Blood Count".to_string(),
                unit_price_cents: 5000,
            }],
            total_cents: 5000,
            request_collection: false,
        }
    }

    #[tokio::test]
    async fn test_catalog_rejects_duplicate_names_case_insensitively() {
        let catalog = MemoryCatalogRepository::new();
        catalog
            .create_exam(NewExam {
                name: "Complete Blood Count".to_string(),
                description: None,
                category: None,
                price_cents: 5000,
            })
            .await
            .unwrap();

        let dup = catalog
            .create_exam(NewExam {
                name: "complete blood count".to_string(),
                description: None,
                category: None,
                price_cents: 4000,
            })
            .await;
        assert!(matches!(dup, Err(RepoError::DuplicateName)));
    }

    #[tokio::test]
    async fn test_repeating_a_price_update_changes_nothing() {
        let catalog = MemoryCatalogRepository::new();
        let exam = catalog
            .create_exam(NewExam {
                name: "Ultrasound".to_string(),
                description: None,
                category: None,
                price_cents: 3000,
            })
            .await
            .unwrap();

        let first = catalog.update_exam_price(exam.id, 3500).await.unwrap();
        let second = catalog.update_exam_price(exam.id, 3500).await.unwrap();
        assert_eq!(first.price_cents, 3500);
        assert_eq!(second.price_cents, 3500);
        assert_eq!(second.name, "Ultrasound");
        assert!(second.active);

        let listed = catalog.list_exams(false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].price_cents, 3500);
    }

    #[tokio::test]
    async fn test_order_updates_enforce_the_version_guard() {
        let (feed, _rx) = broadcast::channel(16);
        let repo = MemoryOrderRepository::new(feed);
        let order = repo.create_order(sample_order(Uuid::new_v4())).await.unwrap();
        assert_eq!(order.version, 1);

        let mut edit = OrderEdit::from_order(&order);
        edit.status = OrderStatus::Scheduled;
        let updated = repo.update_order(order.id, edit.clone()).await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.status, OrderStatus::Scheduled);

        // Same expected_version again is now stale.
        let stale = repo.update_order(order.id, edit).await;
        assert!(matches!(stale, Err(RepoError::VersionConflict)));
    }

    #[tokio::test]
    async fn test_order_mutations_publish_change_events() {
        let (feed, mut rx) = broadcast::channel(16);
        let repo = MemoryOrderRepository::new(feed);

        let order = repo.create_order(sample_order(Uuid::new_v4())).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.change, OrderChangeKind::Created);

        let mut edit = OrderEdit::from_order(&order);
        edit.status = OrderStatus::InProgress;
        repo.update_order(order.id, edit).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.change, OrderChangeKind::Updated);
    }

    #[tokio::test]
    async fn test_vet_scope_only_lists_own_orders() {
        let (feed, _rx) = broadcast::channel(16);
        let repo = MemoryOrderRepository::new(feed);
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        repo.create_order(sample_order(mine)).await.unwrap();
        repo.create_order(sample_order(theirs)).await.unwrap();

        let listed = repo.list_orders(OrderScope::Vet(mine)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].vet_id, mine);

        let all = repo.list_orders(OrderScope::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_settings_roundtrip_and_overwrite() {
        let settings = MemorySettingsRepository::new();
        assert_eq!(settings.get("driver_phone").await.unwrap(), None);

        settings.put("driver_phone", "+55 (11) 98765-4321").await.unwrap();
        assert_eq!(
            settings.get("driver_phone").await.unwrap().as_deref(),
            Some("+55 (11) 98765-4321")
        );

        settings.put("driver_phone", "+55 (11) 91111-2222").await.unwrap();
        assert_eq!(
            settings.get("driver_phone").await.unwrap().as_deref(),
            Some("+55 (11) 91111-2222")
        );
    }
}
