//! Sealed session codec.
//!
//! Turns a [`SessionUser`] into an opaque, tamper-evident, encrypted cookie
//! value and back. AES-256-GCM with a fresh random 12-byte nonce per seal;
//! the 32-byte key is derived from the configured secret with SHA-256. The
//! wire form is `base64url(nonce || ciphertext)` over a JSON envelope that
//! embeds the expiry.
//!
//! Decoding fails closed: tampering, truncation, a wrong key, malformed JSON
//! and an elapsed expiry are all indistinguishable from "no session" (`None`).
//! Nothing here returns an error a caller could leak to a probing client.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::SessionUser;
use crate::config::MIN_SECRET_LEN;
use crate::{AppError, SecretString};

const NONCE_LEN: usize = 12;

#[derive(Serialize, Deserialize)]
struct Envelope {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

/// Seals a session payload under `secret` with the given time to live.
///
/// # Errors
///
/// Returns `AppError::Config` if the secret is shorter than 32 bytes.
pub fn seal(user: &SessionUser, secret: &SecretString, ttl: Duration) -> Result<String, AppError> {
    let cipher = cipher_for(secret)?;

    let envelope = Envelope {
        user: user.clone(),
        expires_at: Utc::now() + ttl,
    };
    let plaintext = serde_json::to_vec(&envelope)
        .map_err(|e| AppError::Config(format!("session payload not serializable: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|_| AppError::Config("session encryption failed".to_owned()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok(URL_SAFE_NO_PAD.encode(sealed))
}

/// Opens a sealed value. Returns `None` for anything that is not a valid,
/// unexpired seal under `secret` — including the empty string.
#[must_use]
pub fn unseal(sealed: &str, secret: &SecretString) -> Option<SessionUser> {
    let cipher = cipher_for(secret).ok()?;

    let raw = URL_SAFE_NO_PAD.decode(sealed).ok()?;
    if raw.len() <= NONCE_LEN {
        return None;
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

    let plaintext = match cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext) {
        Ok(p) => p,
        Err(_) => {
            log::warn!(
                target: "reviewbase::session",
                "msg=\"session cookie failed authentication\" cookie_prefix=\"{}...\"",
                sealed.chars().take(8).collect::<String>()
            );
            return None;
        }
    };

    let envelope: Envelope = serde_json::from_slice(&plaintext).ok()?;
    if envelope.expires_at <= Utc::now() {
        return None;
    }

    Some(envelope.user)
}

fn cipher_for(secret: &SecretString) -> Result<Aes256Gcm, AppError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(AppError::Config(format!(
            "session secret must be at least {MIN_SECRET_LEN} bytes"
        )));
    }

    // SHA-256 output is exactly the 32 bytes AES-256 requires.
    let key = Sha256::digest(secret.expose_secret().as_bytes());
    Aes256Gcm::new_from_slice(&key)
        .map_err(|_| AppError::Config("session key derivation failed".to_owned()))
}
