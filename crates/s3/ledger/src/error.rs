use thiserror::Error;

/// Errors from transparency log operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("entry at seq {seq} belongs to {found}, expected {expected}")]
    ForeignEntry {
        seq: u64,
        expected: String,
        found: String,
    },
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
