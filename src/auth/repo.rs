use std::{future::Future, time::Duration};

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, ProfileUpdate, User};

/// Ceiling applied to every store call.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("user already exists")]
    Duplicate,
    #[error("store operation timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if matches!(e, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            return StoreError::Duplicate;
        }
        StoreError::Database(e)
    }
}

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Matches on email when given, on phone otherwise; either when both are given.
    async fn find_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, StoreError>;
    async fn find_by_external_id(&self, google_id: &str) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError>;
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    /// Updates name, email and picture only; refreshes `updated_at`.
    async fn update_profile(&self, id: Uuid, fields: ProfileUpdate) -> Result<User, StoreError>;
}

/// Runs a store future under `limit`, mapping an elapsed deadline to [`StoreError::Timeout`].
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => {
            error!(limit_ms = limit.as_millis() as u64, "store operation timed out");
            Err(StoreError::Timeout)
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            timeout: STORE_TIMEOUT,
        }
    }

    async fn fetch_one_or_missing(
        &self,
        query: sqlx::query::QueryAs<'_, sqlx::Postgres, User, sqlx::postgres::PgArguments>,
    ) -> Result<User, StoreError> {
        bounded(self.timeout, async {
            let row = query.fetch_optional(&self.db).await?;
            row.ok_or(StoreError::NotFound)
        })
        .await
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone_number, google_id, name, bio, profile_pic,
                   password_hash, is_google, created_at, updated_at
            FROM users
            WHERE ($1::text IS NOT NULL AND email = $1)
               OR ($2::text IS NOT NULL AND phone_number = $2)
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(phone);
        self.fetch_one_or_missing(query).await
    }

    async fn find_by_external_id(&self, google_id: &str) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone_number, google_id, name, bio, profile_pic,
                   password_hash, is_google, created_at, updated_at
            FROM users
            WHERE google_id = $1
            "#,
        )
        .bind(google_id);
        self.fetch_one_or_missing(query).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, phone_number, google_id, name, bio, profile_pic,
                   password_hash, is_google, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id);
        self.fetch_one_or_missing(query).await
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        bounded(self.timeout, async {
            let row = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, email, phone_number, google_id, name, bio, profile_pic,
                                   password_hash, is_google, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
                RETURNING id, email, phone_number, google_id, name, bio, profile_pic,
                          password_hash, is_google, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.phone_number)
            .bind(&user.google_id)
            .bind(&user.name)
            .bind(&user.bio)
            .bind(&user.profile_pic)
            .bind(&user.password_hash)
            .bind(user.is_google)
            .bind(now)
            .fetch_one(&self.db)
            .await?;
            Ok::<_, StoreError>(row)
        })
        .await
    }

    async fn update_profile(&self, id: Uuid, fields: ProfileUpdate) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, profile_pic = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, email, phone_number, google_id, name, bio, profile_pic,
                      password_hash, is_google, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.email)
        .bind(fields.profile_pic)
        .bind(OffsetDateTime::now_utc());
        self.fetch_one_or_missing(query).await
    }
}
