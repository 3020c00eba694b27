use crate::configuration::AdminSettings;
use crate::utils::{ResponseErrorMessage, e500, error_chain_fmt};
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{HttpResponse, web};
use anyhow::Context;
use base64::Engine;
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error("Missing or malformed credentials.")]
    MissingCredentials(#[source] anyhow::Error),
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub fn basic_authentication(headers: &HeaderMap) -> Result<Credentials, anyhow::Error> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .context("The 'Authorization' header was missing.")?
        .to_str()
        .context("The 'Authorization' header was not a valid UTF8 string.")?;
    let base64encoded_credentials = header_value
        .strip_prefix("Basic ")
        .context("The authorization scheme was not 'Basic'.")?;
    let decoded_bytes = base64::engine::general_purpose::STANDARD
        .decode(base64encoded_credentials)
        .context("Failed to base64-decode 'Basic' credentials.")?;
    let decoded_credentials = String::from_utf8(decoded_bytes)
        .context("The decoded credential string is not valid UTF8.")?;

    let (username, password) = decoded_credentials
        .split_once(':')
        .context("A password must be provided in 'Basic' auth.")?;

    Ok(Credentials {
        username: username.to_string(),
        password: Secret::new(password.to_string()),
    })
}

pub fn validate_credentials(
    credentials: &Credentials,
    expected: &AdminSettings,
) -> Result<(), AuthError> {
    let username_matches = credentials
        .username
        .as_bytes()
        .ct_eq(expected.username.as_bytes());
    let password_matches = credentials
        .password
        .expose_secret()
        .as_bytes()
        .ct_eq(expected.password.expose_secret().as_bytes());

    if bool::from(username_matches & password_matches) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials(anyhow::anyhow!(
            "Unknown username or wrong password."
        )))
    }
}

/// Guards the admin scope with HTTP Basic auth against the configured
/// credential pair.
pub async fn reject_unauthorized_admins(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let admin = req
        .app_data::<web::Data<AdminSettings>>()
        .cloned()
        .ok_or_else(|| e500("Admin credentials are not configured."))?;

    let outcome = basic_authentication(req.headers())
        .map_err(AuthError::MissingCredentials)
        .and_then(|credentials| validate_credentials(&credentials, &admin));

    match outcome {
        Ok(()) => next.call(req).await.map(ServiceResponse::map_into_left_body),
        Err(e) => {
            tracing::warn!(error.cause_chain = ?e, "Rejected an admin request.");
            let response = HttpResponse::Unauthorized()
                .insert_header((
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(r#"Basic realm="restricted", charset="UTF-8""#),
                ))
                .json(ResponseErrorMessage {
                    error: "Unauthorized".to_string(),
                });
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
