use async_trait::async_trait;
use sqlx::PgPool;

use cvde_core::faq::{FaqEntry, NewFaqEntry};
use cvde_core::repository::{FaqStore, RepoError, RepoResult};

pub struct StoreFaqRepository {
    pool: PgPool,
}

impl StoreFaqRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct FaqRow {
    id: i64,
    question: String,
    answer: String,
    category: Option<String>,
    active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<FaqRow> for FaqEntry {
    fn from(row: FaqRow) -> Self {
        FaqEntry {
            id: row.id,
            question: row.question,
            answer: row.answer,
            category: row.category,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FaqStore for StoreFaqRepository {
    async fn list_faq(&self, only_active: bool) -> RepoResult<Vec<FaqEntry>> {
        // Newest entries first, matching the admin editor.
        let query = if only_active {
            "SELECT id, question, answer, category, active, created_at \
             FROM faq_entries WHERE active = TRUE ORDER BY id DESC"
        } else {
            "SELECT id, question, answer, category, active, created_at \
             FROM faq_entries ORDER BY id DESC"
        };

        let rows: Vec<FaqRow> = sqlx::query_as(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FaqEntry::from).collect())
    }

    async fn create_faq(&self, entry: NewFaqEntry) -> RepoResult<FaqEntry> {
        let row: FaqRow = sqlx::query_as(
            "INSERT INTO faq_entries (question, answer, category, active) \
             VALUES ($1, $2, $3, TRUE) \
             RETURNING id, question, answer, category, active, created_at",
        )
        .bind(entry.question)
        .bind(entry.answer)
        .bind(entry.category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(row.into())
    }

    async fn set_faq_active(&self, id: i64, active: bool) -> RepoResult<FaqEntry> {
        let row: Option<FaqRow> = sqlx::query_as(
            "UPDATE faq_entries SET active = $2 WHERE id = $1 \
             RETURNING id, question, answer, category, active, created_at",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(FaqEntry::from)
            .ok_or_else(|| RepoError::NotFound("FAQ entry", id.to_string()))
    }
}
