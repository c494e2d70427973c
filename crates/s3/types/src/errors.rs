//! Error types for the S3 domain types

/// Errors raised while parsing domain values from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    #[error("Unknown driver type: {0}")]
    UnknownDriverType(String),

    #[error("Unknown consent level: {0}")]
    UnknownConsentLevel(String),
}
