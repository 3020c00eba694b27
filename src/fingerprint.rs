//! Deterministic fingerprints derived from submission data.
//!
//! Both helpers are pure: the same inputs always produce the same output.
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept for a challenge key (16 hex characters).
const CHALLENGE_KEY_BYTES: usize = 8;

/// Hex-encoded SHA-256 digest of an email, used wherever the email must be
/// referenced without being revealed.
pub fn hash_email(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

/// Short identifier tied to a single submission. Stored for a future
/// anti-bot check and never validated today.
pub fn derive_challenge_key(email: &str, user_agent: &str, timestamp: DateTime<Utc>) -> String {
    let data = format!("{}{}{}", email, user_agent, timestamp.to_rfc3339());
    let digest = Sha256::digest(data.as_bytes());
    hex::encode(&digest[..CHALLENGE_KEY_BYTES])
}
