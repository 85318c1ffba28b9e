use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cvde_core::repository::{OrderRepository, OrderScope, RepoError, RepoResult};
use cvde_order::{parse_selected_exams, ExamOrder, NewOrder, OrderEdit, OrderStatus};
use cvde_shared::{Masked, ProfessionalAffiliation};

/// Postgres-backed order repository. Change events are not published here;
/// a trigger on `exam_orders` raises `pg_notify` and the listener fans the
/// payload out to subscribers.
pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "id, vet_id, vet_name_snapshot, vet_email_snapshot, vet_crmv_snapshot, \
    professional_type, clinic_name, clinic_address, owner_name, owner_government_id, owner_phone, \
    owner_address, owner_email, patient_name, species, breed, age_years, weight_kg, neuter_status, \
    reactive_status, clinical_notes, selected_exams, total_cents, status, scheduled_for, admin_notes, \
    request_collection, driver_collection_requested, driver_requested_at, sample_received_at, \
    created_at, updated_at, version";

// Rows that predate vet snapshotting carry null snapshot columns; the admin
// listing repairs them from the vet's current profile.
const JOINED_ORDER_COLUMNS: &str = "o.id, o.vet_id, \
    COALESCE(o.vet_name_snapshot, p.full_name) AS vet_name_snapshot, \
    COALESCE(o.vet_email_snapshot, p.email) AS vet_email_snapshot, \
    COALESCE(o.vet_crmv_snapshot, p.crmv) AS vet_crmv_snapshot, \
    o.professional_type, o.clinic_name, o.clinic_address, o.owner_name, o.owner_government_id, \
    o.owner_phone, o.owner_address, o.owner_email, o.patient_name, o.species, o.breed, o.age_years, \
    o.weight_kg, o.neuter_status, o.reactive_status, o.clinical_notes, o.selected_exams, \
    o.total_cents, o.status, o.scheduled_for, o.admin_notes, o.request_collection, \
    o.driver_collection_requested, o.driver_requested_at, o.sample_received_at, \
    o.created_at, o.updated_at, o.version";

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    vet_id: Uuid,
    vet_name_snapshot: Option<String>,
    vet_email_snapshot: Option<String>,
    vet_crmv_snapshot: Option<String>,
    professional_type: Option<String>,
    clinic_name: Option<String>,
    clinic_address: Option<String>,
    owner_name: String,
    owner_government_id: String,
    owner_phone: String,
    owner_address: Option<String>,
    owner_email: Option<String>,
    patient_name: String,
    species: Option<String>,
    breed: Option<String>,
    age_years: Option<i32>,
    weight_kg: Option<f64>,
    neuter_status: Option<String>,
    reactive_status: Option<String>,
    clinical_notes: Option<String>,
    selected_exams: serde_json::Value,
    total_cents: i64,
    status: String,
    scheduled_for: Option<DateTime<Utc>>,
    admin_notes: Option<String>,
    request_collection: bool,
    driver_collection_requested: bool,
    driver_requested_at: Option<DateTime<Utc>>,
    sample_received_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl From<OrderRow> for ExamOrder {
    fn from(row: OrderRow) -> Self {
        ExamOrder {
            id: row.id,
            vet_id: row.vet_id,
            vet_name_snapshot: row.vet_name_snapshot,
            vet_email_snapshot: row.vet_email_snapshot,
            vet_crmv_snapshot: row.vet_crmv_snapshot,
            vet_affiliation: ProfessionalAffiliation::from_columns(
                row.professional_type.as_deref(),
                row.clinic_name,
                row.clinic_address,
            ),
            owner_name: row.owner_name,
            owner_government_id: Masked::new(row.owner_government_id),
            owner_phone: Masked::new(row.owner_phone),
            owner_address: row.owner_address,
            owner_email: row.owner_email,
            patient_name: row.patient_name,
            species: row.species,
            breed: row.breed,
            age_years: row.age_years,
            weight_kg: row.weight_kg,
            neuter_status: row.neuter_status.and_then(|s| s.parse().ok()),
            reactive_status: row.reactive_status.and_then(|s| s.parse().ok()),
            clinical_notes: row.clinical_notes,
            selected_exams: parse_selected_exams(&row.selected_exams),
            total_cents: row.total_cents,
            status: row.status.parse().unwrap_or(OrderStatus::Requested),
            scheduled_for: row.scheduled_for,
            admin_notes: row.admin_notes,
            request_collection: row.request_collection,
            driver_collection_requested: row.driver_collection_requested,
            driver_requested_at: row.driver_requested_at,
            sample_received_at: row.sample_received_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: NewOrder) -> RepoResult<ExamOrder> {
        let selected_exams = serde_json::to_value(&order.selected_exams)
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let query = format!(
            "INSERT INTO exam_orders (vet_id, vet_name_snapshot, vet_email_snapshot, \
             vet_crmv_snapshot, professional_type, clinic_name, clinic_address, owner_name, \
             owner_government_id, owner_phone, owner_address, owner_email, patient_name, species, \
             breed, age_years, weight_kg, neuter_status, reactive_status, clinical_notes, \
             selected_exams, total_cents, request_collection) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23) \
             RETURNING {ORDER_COLUMNS}"
        );

        let row: OrderRow = sqlx::query_as(&query)
            .bind(order.vet_id)
            .bind(&order.vet_name_snapshot)
            .bind(&order.vet_email_snapshot)
            .bind(&order.vet_crmv_snapshot)
            .bind(order.vet_affiliation.as_ref().map(|a| a.professional_type()))
            .bind(order.vet_affiliation.as_ref().and_then(|a| a.clinic_name()))
            .bind(order.vet_affiliation.as_ref().and_then(|a| a.clinic_address()))
            .bind(&order.owner_name)
            .bind(order.owner_government_id.as_str())
            .bind(order.owner_phone.as_str())
            .bind(&order.owner_address)
            .bind(&order.owner_email)
            .bind(&order.patient_name)
            .bind(&order.species)
            .bind(&order.breed)
            .bind(order.age_years)
            .bind(order.weight_kg)
            .bind(order.neuter_status.as_ref().map(|s| s.as_str()))
            .bind(order.reactive_status.as_ref().map(|s| s.as_str()))
            .bind(&order.clinical_notes)
            .bind(selected_exams)
            .bind(order.total_cents)
            .bind(order.request_collection)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(row.into())
    }

    async fn list_orders(&self, scope: OrderScope) -> RepoResult<Vec<ExamOrder>> {
        let rows: Vec<OrderRow> = match scope {
            OrderScope::Vet(vet_id) => {
                let query = format!(
                    "SELECT {ORDER_COLUMNS} FROM exam_orders WHERE vet_id = $1 \
                     ORDER BY created_at DESC"
                );
                sqlx::query_as(&query)
                    .bind(vet_id)
                    .fetch_all(&self.pool)
                    .await
            }
            OrderScope::All => {
                let query = format!(
                    "SELECT {JOINED_ORDER_COLUMNS} FROM exam_orders o \
                     LEFT JOIN profiles p ON p.id = o.vet_id \
                     ORDER BY o.created_at DESC"
                );
                sqlx::query_as(&query).fetch_all(&self.pool).await
            }
        }
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(ExamOrder::from).collect())
    }

    async fn get_order(&self, id: i64) -> RepoResult<ExamOrder> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM exam_orders WHERE id = $1");

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(ExamOrder::from)
            .ok_or_else(|| RepoError::NotFound("Order", id.to_string()))
    }

    async fn update_order(&self, id: i64, edit: OrderEdit) -> RepoResult<ExamOrder> {
        let query = format!(
            "UPDATE exam_orders SET status = $2, scheduled_for = $3, admin_notes = $4, \
             driver_collection_requested = $5, driver_requested_at = $6, sample_received_at = $7, \
             updated_at = NOW(), version = version + 1 \
             WHERE id = $1 AND version = $8 \
             RETURNING {ORDER_COLUMNS}"
        );

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(edit.status.as_str())
            .bind(edit.scheduled_for)
            .bind(&edit.admin_notes)
            .bind(edit.driver_collection_requested)
            .bind(edit.driver_requested_at)
            .bind(edit.sample_received_at)
            .bind(edit.expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // The guard missed either the id or the version; tell the caller which.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exam_orders WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        if exists {
            Err(RepoError::VersionConflict)
        } else {
            Err(RepoError::NotFound("Order", id.to_string()))
        }
    }
}
