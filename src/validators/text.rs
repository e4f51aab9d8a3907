use regex::Regex;
use std::sync::LazyLock;

use super::ValidationError;

// Script and style elements are removed with their content; a comment that
// pastes "<script>alert(1)</script>" must not survive as executable-looking
// text either.
static DANGEROUS_ELEMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

// Whitespace runs collapse to a single space, but newlines survive so
// paragraph breaks in comments are preserved.
static SPACE_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Strips markup, collapses whitespace and truncates.
///
/// Intended for comment and reply bodies and for screen names: prevents
/// stored markup injection while keeping paragraph breaks readable.
#[must_use]
pub fn sanitize_text(input: &str, max_length: usize) -> String {
    let without_elements = DANGEROUS_ELEMENT_REGEX.replace_all(input, "");
    let without_tags = TAG_REGEX.replace_all(&without_elements, "");
    let collapsed = SPACE_RUN_REGEX.replace_all(&without_tags, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() > max_length {
        trimmed.chars().take(max_length).collect()
    } else {
        trimmed.to_owned()
    }
}

/// Post-sanitization length check with a structured error.
pub fn validate_text_length(text: &str, max: usize, label: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::Empty {
            label: label.to_owned(),
        });
    }
    if text.chars().count() > max {
        return Err(ValidationError::TooLong {
            label: label.to_owned(),
            max,
        });
    }
    Ok(())
}
