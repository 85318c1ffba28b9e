use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cvde_core::identity::UserRole;
use cvde_core::profile::{Profile, RegistrationDetails};
use cvde_core::repository::{ProfileStore, RepoError, RepoResult};
use cvde_shared::{Masked, ProfessionalAffiliation};

pub struct StoreProfileRepository {
    pool: PgPool,
}

impl StoreProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROFILE_COLUMNS: &str = "id, email, full_name, role, crmv, government_id, phone, \
    professional_type, clinic_name, clinic_address, registration_completed, created_at";

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: Option<String>,
    full_name: Option<String>,
    role: String,
    crmv: Option<String>,
    government_id: Option<String>,
    phone: Option<String>,
    professional_type: Option<String>,
    clinic_name: Option<String>,
    clinic_address: Option<String>,
    registration_completed: bool,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            // An unrecognized role never grants admin access.
            role: row.role.parse().unwrap_or(UserRole::VetUser),
            crmv: row.crmv,
            government_id: row.government_id.map(Masked::new),
            phone: row.phone.map(Masked::new),
            affiliation: ProfessionalAffiliation::from_columns(
                row.professional_type.as_deref(),
                row.clinic_name,
                row.clinic_address,
            ),
            registration_completed: row.registration_completed,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProfileStore for StoreProfileRepository {
    async fn get_profile(&self, user_id: Uuid) -> RepoResult<Profile> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(Profile::from)
            .ok_or_else(|| RepoError::NotFound("Profile", user_id.to_string()))
    }

    async fn complete_registration(
        &self,
        user_id: Uuid,
        details: RegistrationDetails,
    ) -> RepoResult<Profile> {
        let query = format!(
            "UPDATE profiles SET full_name = $2, crmv = $3, government_id = $4, phone = $5, \
             professional_type = $6, clinic_name = $7, clinic_address = $8, \
             registration_completed = TRUE \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        );

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(user_id)
            .bind(&details.full_name)
            .bind(&details.crmv)
            .bind(details.government_id.as_str())
            .bind(details.phone.as_str())
            .bind(details.affiliation.professional_type())
            .bind(details.affiliation.clinic_name())
            .bind(details.affiliation.clinic_address())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(Profile::from)
            .ok_or_else(|| RepoError::NotFound("Profile", user_id.to_string()))
    }

    async fn update_full_name(&self, user_id: Uuid, full_name: &str) -> RepoResult<Profile> {
        let query =
            format!("UPDATE profiles SET full_name = $2 WHERE id = $1 RETURNING {PROFILE_COLUMNS}");

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(user_id)
            .bind(full_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(Profile::from)
            .ok_or_else(|| RepoError::NotFound("Profile", user_id.to_string()))
    }
}
