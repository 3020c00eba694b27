use crate::domain::{SubscriberEmail, ValidSubmission};
use crate::fingerprint::{derive_challenge_key, hash_email};
use crate::utils::error_chain_fmt;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

#[derive(Debug)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub email_hash: String,
    pub user_agent: String,
    pub ip_address: String,
    pub browser_info: String,
    pub created_at: DateTime<Utc>,
    pub verify_token: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub challenge_key: String,
}

impl TryFrom<SqliteRow> for Subscriber {
    type Error = sqlx::Error;

    fn try_from(row: SqliteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            email_hash: row.try_get("email_hash")?,
            user_agent: row.try_get("user_agent")?,
            ip_address: row.try_get("ip_address")?,
            browser_info: row.try_get("browser_info")?,
            created_at: row.try_get("created_at")?,
            verify_token: row.try_get("verify_token")?,
            verified_at: row.try_get("verified_at")?,
            challenge_key: row.try_get("challenge_key")?,
        })
    }
}

/// A subscriber that has not been persisted yet. `id` and `created_at`
/// are only ever assigned by [`NewSubscriber::store`].
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub email_hash: String,
    pub user_agent: String,
    pub ip_address: String,
    pub browser_info: String,
    pub challenge_key: String,
}

impl NewSubscriber {
    pub fn from_submission(
        submission: ValidSubmission,
        user_agent: String,
        ip_address: String,
        now: DateTime<Utc>,
    ) -> Self {
        let email_hash = hash_email(submission.email.as_ref());
        let challenge_key = derive_challenge_key(submission.email.as_ref(), &user_agent, now);

        Self {
            email: submission.email,
            email_hash,
            user_agent,
            ip_address,
            browser_info: submission.browser_data,
            challenge_key,
        }
    }

    #[tracing::instrument(
        name = "Saving new subscriber details in the database",
        skip_all,
        fields(email_hash = %self.email_hash)
    )]
    pub async fn store(self, pool: &SqlitePool) -> Result<Subscriber, StoreError> {
        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
              INSERT INTO subscribers (
                email,
                email_hash,
                user_agent,
                ip_address,
                browser_info,
                created_at,
                verify_token,
                challenge_key
              )
              VALUES (?, ?, ?, ?, ?, ?, '', ?)
              RETURNING id
            "#,
        )
        .bind(self.email.as_ref())
        .bind(&self.email_hash)
        .bind(&self.user_agent)
        .bind(&self.ip_address)
        .bind(&self.browser_info)
        .bind(created_at)
        .bind(&self.challenge_key)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                StoreError::AlreadyExists
            }
            e => StoreError::UnexpectedError(e),
        })?;

        Ok(Subscriber {
            id: row.try_get("id")?,
            email: self.email.as_ref().to_string(),
            email_hash: self.email_hash,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            browser_info: self.browser_info,
            created_at,
            verify_token: String::new(),
            verified_at: None,
            challenge_key: self.challenge_key,
        })
    }
}

impl Subscriber {
    #[tracing::instrument(name = "Fetching subscriber by email", skip_all)]
    pub async fn find_by_email(email: &str, pool: &SqlitePool) -> Result<Self, StoreError> {
        let row = sqlx::query(
            r#"
              SELECT
                id,
                email,
                email_hash,
                user_agent,
                ip_address,
                browser_info,
                created_at,
                verify_token,
                verified_at,
                challenge_key
              FROM subscribers
              WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(Subscriber::try_from(row)?)
    }

    #[tracing::instrument(name = "Fetching all subscribers", skip(pool))]
    pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Self>, StoreError> {
        let rows = sqlx::query(
            r#"
              SELECT
                id,
                email,
                email_hash,
                user_agent,
                ip_address,
                browser_info,
                created_at,
                verify_token,
                verified_at,
                challenge_key
              FROM subscribers
              ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        let subscribers = rows
            .into_iter()
            .map(Subscriber::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(subscribers)
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

/// Sanitized view of a subscriber, safe to return to the submitter.
#[derive(Serialize, Debug)]
pub struct SubscriberAPI {
    pub email_hash: String,
    pub created_at: DateTime<Utc>,
    pub is_verified: bool,
    pub challenge_id: String,
}

impl From<&Subscriber> for SubscriberAPI {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            email_hash: subscriber.email_hash.clone(),
            created_at: subscriber.created_at,
            is_verified: subscriber.is_verified(),
            challenge_id: subscriber.challenge_key.clone(),
        }
    }
}

/// Admin-only view: the sanitized fields plus the raw PII.
#[derive(Serialize, Debug)]
pub struct AdminSubscriberAPI {
    #[serde(flatten)]
    pub summary: SubscriberAPI,
    pub email: String,
    pub user_agent: String,
    pub ip_address: String,
}

impl From<Subscriber> for AdminSubscriberAPI {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            summary: SubscriberAPI::from(&subscriber),
            email: subscriber.email,
            user_agent: subscriber.user_agent,
            ip_address: subscriber.ip_address,
        }
    }
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Email already exists.")]
    AlreadyExists,
    #[error("Subscriber not found.")]
    NotFound,
    #[error("Failed to execute query.")]
    UnexpectedError(#[from] sqlx::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
