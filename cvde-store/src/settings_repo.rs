use async_trait::async_trait;
use sqlx::PgPool;

use cvde_core::repository::{RepoError, RepoResult, SettingsStore};

/// Key/value portal settings, e.g. the collection driver's WhatsApp phone.
pub struct StoreSettingsRepository {
    pool: PgPool,
}

impl StoreSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for StoreSettingsRepository {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO app_settings (key, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}
