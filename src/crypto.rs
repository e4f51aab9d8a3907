//! Credential verification.
//!
//! Admin credentials come from configuration; client credentials come from
//! the datastore and are stored either as bcrypt hashes or, for accounts
//! predating the hashing rollout, as plaintext. Both forms verify through
//! [`verify_password`] so handler code never branches on storage format.

/// Verifies a password against a stored credential.
///
/// A stored value with a bcrypt prefix (`$2a$`, `$2b$`, `$2y$`) is verified
/// with bcrypt; anything else is treated as a legacy plaintext credential and
/// compared in constant time. A malformed bcrypt hash fails verification
/// rather than erroring.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with("$2") {
        bcrypt::verify(password, stored).unwrap_or(false)
    } else {
        constant_time_eq(password.as_bytes(), stored.as_bytes())
    }
}

/// Constant-time comparison to prevent timing attacks.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
