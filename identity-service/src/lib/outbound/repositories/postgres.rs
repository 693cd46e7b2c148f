use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::identity::errors::StoreError;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::CredentialStore;
use crate::domain::identity::ports::IdentityResolver;

const USERNAME_UNIQUE_CONSTRAINT: &str = "identities_username_key";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let username = Username::new(row.username).map_err(|e| {
            tracing::error!(identity_id = %row.id, error = %e, "Stored username failed validation");
            StoreError::Unavailable(format!("corrupt identity record {}", row.id))
        })?;

        Ok(Identity {
            id: IdentityId(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, database = "postgresql", "Credential store query failed");
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl IdentityResolver for PostgresCredentialStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, first_name, last_name, username, password_hash, created_at
            FROM identities
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(Identity::try_from).transpose()
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn save(&self, identity: Identity) -> Result<Identity, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, first_name, last_name, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.first_name.as_deref())
        .bind(identity.last_name.as_deref())
        .bind(identity.username.as_str())
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(USERNAME_UNIQUE_CONSTRAINT)
                {
                    return StoreError::DuplicateUsername(identity.username.as_str().to_string());
                }
            }
            unavailable(e)
        })?;

        Ok(identity)
    }
}
