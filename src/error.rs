//! Domain errors for model loading and record validation

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the serialized model artifact.
///
/// These are fatal: no prediction can be served without a model.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read model artifact {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Errors raised when user-supplied fields cannot form a valid customer record.
///
/// These are recoverable: the caller should re-prompt for corrected input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {0} supplied more than once")]
    DuplicateField(&'static str),

    #[error("invalid value {value:?} for {field}; expected one of: {}", allowed.join(", "))]
    OutOfDomain {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}
