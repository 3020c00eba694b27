use crate::configuration::SubmissionSettings;
use crate::domain::{SubmissionError, SubmissionPayload};
use crate::middleware::originating_address;
use crate::models::{NewSubscriber, StoreError, SubscriberAPI};
use crate::startup::HmacSecret;
use crate::utils::{error_chain_fmt, json_error};
use actix_web::http::StatusCode;
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, ResponseError, post, web};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

const THANK_YOU: &str = "Thank you for subscribing";

#[derive(Serialize, Debug)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SubscriberAPI>,
}

#[post("/subscribe")]
#[tracing::instrument(
    name = "Adding a new subscriber",
    skip_all,
    fields(email_hash = tracing::field::Empty)
)]
pub async fn post(
    req: HttpRequest,
    payload: web::Payload,
    pool: web::Data<SqlitePool>,
    hmac_secret: web::Data<HmacSecret>,
    settings: web::Data<SubmissionSettings>,
) -> Result<HttpResponse, SubscribeError> {
    let body = payload
        .to_bytes_limited(settings.max_body_size)
        .await
        .map_err(|_| SubscribeError::BodyTooLarge)?
        .map_err(|e| SubscribeError::InvalidJson(anyhow::anyhow!("{}", e)))?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SubscribeError::EmptyBody);
    }

    let payload: SubmissionPayload = serde_json::from_slice(&body)
        .context("Failed to decode the subscription payload.")
        .map_err(SubscribeError::InvalidJson)?;

    let now = Utc::now();
    let submission = payload.validate(
        now.timestamp(),
        settings.freshness_window_seconds,
        &hmac_secret.0,
    )?;

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let new_subscriber =
        NewSubscriber::from_submission(submission, user_agent, originating_address(&req), now);
    tracing::Span::current().record(
        "email_hash",
        tracing::field::display(&new_subscriber.email_hash),
    );

    // A duplicate answers like a fresh subscription so the endpoint cannot be
    // used to find out which emails are already on the list.
    let data = match new_subscriber.store(&pool).await {
        Ok(subscriber) => Some(SubscriberAPI::from(&subscriber)),
        Err(StoreError::AlreadyExists) => {
            tracing::info!("Email is already subscribed.");
            None
        }
        Err(e) => {
            return Err(SubscribeError::UnexpectedError(
                anyhow::Error::new(e).context("Failed to store the new subscriber."),
            ));
        }
    };

    Ok(HttpResponse::Created()
        .content_type(ContentType::json())
        .json(SubscribeResponse {
            success: true,
            message: THANK_YOU.to_string(),
            data,
        }))
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Request body empty")]
    EmptyBody,
    #[error("Request body too large")]
    BodyTooLarge,
    #[error("Invalid JSON")]
    InvalidJson(#[source] anyhow::Error),
    #[error(transparent)]
    ValidationError(#[from] SubmissionError),
    #[error("Server error")]
    UnexpectedError(#[source] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        match self {
            SubscribeError::UnexpectedError(_) => {
                tracing::error!(error.cause_chain = ?self, "Failed to process a subscription.")
            }
            _ => tracing::info!(reason = %self, "Rejected a subscription request."),
        }
        json_error(self.status_code(), &self.to_string())
    }
}
