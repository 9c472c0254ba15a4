//! Error types for the reservation engine.

use thiserror::Error;

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid id: {0} (ids are positive)")]
    InvalidId(i64),

    #[error("No user matches the supplied credentials")]
    CredentialsNotFound,

    #[error("Party size must be at least 1, got {0}")]
    InvalidPartySize(u32),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Row {id} already exists in table {table}")]
    Conflict { table: &'static str, id: i64 },

    #[error("Could not allocate a unique id after {0} attempts")]
    IdSpaceExhausted(u32),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification callers can branch on without matching every
/// variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced thing cannot exist (structurally invalid id) or no
    /// row matched where one was required (credential miss). Lookup
    /// misses on valid ids are NOT errors; they return empty results.
    NotFound,

    /// A field violated a range invariant.
    InvalidArgument,

    /// The storage substrate refused or failed the operation.
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidId(_) | EngineError::CredentialsNotFound => ErrorKind::NotFound,
            EngineError::InvalidPartySize(_) | EngineError::InvalidRating(_) => {
                ErrorKind::InvalidArgument
            }
            EngineError::Conflict { .. }
            | EngineError::IdSpaceExhausted(_)
            | EngineError::Storage(_)
            | EngineError::Serialization(_) => ErrorKind::Storage,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EngineError::InvalidId(-2).kind(), ErrorKind::NotFound);
        assert_eq!(EngineError::CredentialsNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            EngineError::InvalidPartySize(0).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            EngineError::Conflict {
                table: "users",
                id: 7
            }
            .kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_serde_json_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{");
        let err: EngineError = bad.unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
