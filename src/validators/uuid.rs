use regex::Regex;
use std::sync::LazyLock;

use super::ValidationError;

static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// Matches the canonical 8-4-4-4-12 hex-with-dashes form, case-insensitive.
#[must_use]
pub fn is_valid_uuid(s: &str) -> bool {
    UUID_REGEX.is_match(s)
}

/// Rejects a malformed id with a structured error naming the field.
///
/// Every resource handler runs ids through this before querying, so a
/// guessed or mangled id fails as a 400 instead of reaching the datastore.
pub fn validate_uuid(id: &str, label: &str) -> Result<(), ValidationError> {
    if is_valid_uuid(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUuid {
            label: label.to_owned(),
        })
    }
}

/// Validates a batch of ids; fails on the first malformed one.
pub fn validate_uuids(ids: &[String], label: &str) -> Result<(), ValidationError> {
    for id in ids {
        validate_uuid(id, label)?;
    }
    Ok(())
}
