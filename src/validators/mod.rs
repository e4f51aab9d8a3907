pub mod filename;
pub mod status;
pub mod text;
pub mod uuid;

pub use filename::sanitize_filename;
pub use status::{validate_status, CommentStatus};
pub use text::{sanitize_text, validate_text_length};
pub use uuid::{is_valid_uuid, validate_uuid, validate_uuids};

use serde::{Deserialize, Serialize};

/// Structured 400-class validation failures.
///
/// Carries the caller-supplied label so the response names the offending
/// field without any handler-specific formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    InvalidUuid { label: String },
    TooLong { label: String, max: usize },
    Empty { label: String },
    InvalidStatus,
    TooManyIds { label: String, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUuid { label } => write!(f, "{label} is not a valid UUID"),
            Self::TooLong { label, max } => {
                write!(f, "{label} is too long (max {max} characters)")
            }
            Self::Empty { label } => write!(f, "{label} cannot be empty"),
            Self::InvalidStatus => {
                write!(f, "status must be one of: open, in-progress, resolved")
            }
            Self::TooManyIds { label, max } => {
                write!(f, "{label} accepts at most {max} ids")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
