use crate::domain::SubscriberEmail;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Body of a subscription request.
///
/// Every field may be omitted: a missing email surfaces as an invalid
/// email and a missing timestamp as an expired request.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub email: String,
    pub client_token: Option<String>,
    pub client_nonce: Option<String>,
    pub browser_data: Option<String>,
    pub timestamp: i64,
    #[serde(rename = "clientHMAC")]
    pub client_hmac: Option<String>,
}

#[derive(Debug)]
pub struct ValidSubmission {
    pub email: SubscriberEmail,
    pub browser_data: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Request expired or from the future")]
    ExpiredOrFutureTimestamp,
    #[error("Invalid request signature")]
    InvalidSignature,
}

impl SubmissionPayload {
    /// Runs the structural, freshness and signature checks in that order,
    /// stopping at the first failure.
    ///
    /// The signature is only checked when token, nonce and signature are
    /// all present. A client omitting them skips the check entirely.
    pub fn validate(
        self,
        now: i64,
        freshness_window: i64,
        secret: &Secret<String>,
    ) -> Result<ValidSubmission, SubmissionError> {
        let SubmissionPayload {
            email,
            client_token,
            client_nonce,
            browser_data,
            timestamp,
            client_hmac,
        } = self;

        let email = SubscriberEmail::parse(email).map_err(|_| SubmissionError::InvalidEmail)?;

        if now.saturating_sub(timestamp) > freshness_window || timestamp > now {
            return Err(SubmissionError::ExpiredOrFutureTimestamp);
        }

        if let (Some(_), Some(nonce), Some(signature)) = (
            non_empty(&client_token),
            non_empty(&client_nonce),
            non_empty(&client_hmac),
        ) {
            verify_signature(email.as_ref(), nonce, timestamp, signature, secret)?;
        }

        Ok(ValidSubmission {
            email,
            browser_data: browser_data.unwrap_or_default(),
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Hex-encoded HMAC-SHA256 of `email:nonce:timestamp`, the value a client
/// sends as `clientHMAC`.
pub fn compute_signature(
    email: &str,
    nonce: &str,
    timestamp: i64,
    secret: &Secret<String>,
) -> String {
    hex::encode(signing_mac(email, nonce, timestamp, secret).finalize().into_bytes())
}

fn verify_signature(
    email: &str,
    nonce: &str,
    timestamp: i64,
    signature: &str,
    secret: &Secret<String>,
) -> Result<(), SubmissionError> {
    // Compared as lowercase hex text, so any other encoding of a valid MAC
    // is a mismatch.
    let expected = compute_signature(email, nonce, timestamp, secret);
    if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        Ok(())
    } else {
        Err(SubmissionError::InvalidSignature)
    }
}

fn signing_mac(email: &str, nonce: &str, timestamp: i64, secret: &Secret<String>) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{}:{}:{}", email, nonce, timestamp).as_bytes());
    mac
}
