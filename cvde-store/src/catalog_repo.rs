use async_trait::async_trait;
use sqlx::PgPool;

use cvde_catalog::{ExamCatalogItem, ExamDetailsUpdate, NewExam};
use cvde_core::repository::{CatalogStore, RepoError, RepoResult};

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ExamRow {
    id: i64,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price_cents: i64,
    active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ExamRow> for ExamCatalogItem {
    fn from(row: ExamRow) -> Self {
        ExamCatalogItem {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price_cents: row.price_cents,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// The exam_catalog table carries a unique index on lower(name).
fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[async_trait]
impl CatalogStore for StoreCatalogRepository {
    async fn list_exams(&self, only_active: bool) -> RepoResult<Vec<ExamCatalogItem>> {
        let query = if only_active {
            "SELECT id, name, description, category, price_cents, active, created_at, updated_at \
             FROM exam_catalog WHERE active = TRUE ORDER BY name"
        } else {
            "SELECT id, name, description, category, price_cents, active, created_at, updated_at \
             FROM exam_catalog ORDER BY name"
        };

        let rows: Vec<ExamRow> = sqlx::query_as(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(ExamCatalogItem::from).collect())
    }

    async fn create_exam(&self, exam: NewExam) -> RepoResult<ExamCatalogItem> {
        let row: ExamRow = sqlx::query_as(
            "INSERT INTO exam_catalog (name, description, category, price_cents, active) \
             VALUES ($1, $2, $3, $4, TRUE) \
             RETURNING id, name, description, category, price_cents, active, created_at, updated_at",
        )
        .bind(exam.name)
        .bind(exam.description)
        .bind(exam.category)
        .bind(exam.price_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::DuplicateName
            } else {
                RepoError::Database(e.to_string())
            }
        })?;

        Ok(row.into())
    }

    async fn update_exam(&self, id: i64, update: ExamDetailsUpdate) -> RepoResult<ExamCatalogItem> {
        let row: Option<ExamRow> = sqlx::query_as(
            "UPDATE exam_catalog \
             SET name = $2, description = $3, category = $4, active = $5, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, description, category, price_cents, active, created_at, updated_at",
        )
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.category)
        .bind(update.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::DuplicateName
            } else {
                RepoError::Database(e.to_string())
            }
        })?;

        row.map(ExamCatalogItem::from)
            .ok_or_else(|| RepoError::NotFound("Exam", id.to_string()))
    }

    async fn update_exam_price(&self, id: i64, price_cents: i64) -> RepoResult<ExamCatalogItem> {
        let row: Option<ExamRow> = sqlx::query_as(
            "UPDATE exam_catalog SET price_cents = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, description, category, price_cents, active, created_at, updated_at",
        )
        .bind(id)
        .bind(price_cents)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(ExamCatalogItem::from)
            .ok_or_else(|| RepoError::NotFound("Exam", id.to_string()))
    }

    async fn set_exam_active(&self, id: i64, active: bool) -> RepoResult<ExamCatalogItem> {
        let row: Option<ExamRow> = sqlx::query_as(
            "UPDATE exam_catalog SET active = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, description, category, price_cents, active, created_at, updated_at",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(ExamCatalogItem::from)
            .ok_or_else(|| RepoError::NotFound("Exam", id.to_string()))
    }
}
