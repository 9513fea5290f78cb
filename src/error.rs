//! Error types for a3s-rowguard

use thiserror::Error;

/// Errors that can occur while protecting, filtering, or managing policy
#[derive(Debug, Error)]
pub enum RowguardError {
    /// Cursor or column metadata failure (fatal for a scan)
    #[error("Cursor error: {0}")]
    Cursor(String),

    /// Record shape does not match its column list
    #[error("Invalid record: {0}")]
    Record(String),

    /// Text claimed to be protected but is not a well-formed chunk
    #[error("Malformed chunk: {0}")]
    MalformedChunk(String),

    /// No key registered under this id
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// An access rule denies release of the key
    #[error("Access to key '{key_id}' denied by rule '{rule_id}'")]
    AccessDenied {
        key_id: String,
        rule_id: String,
    },

    /// Encrypt/decrypt primitive failure
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Key attribute document has the wrong shape
    #[error("Invalid key attributes: {0}")]
    Attributes(String),

    /// Policy service request failed (status mismatch, transport, or response parsing)
    #[error("Policy request failed: {0}")]
    Request(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RowguardError {
    fn from(err: reqwest::Error) -> Self {
        RowguardError::Request(err.to_string())
    }
}

impl From<hcl::Error> for RowguardError {
    fn from(err: hcl::Error) -> Self {
        RowguardError::Config(err.to_string())
    }
}

/// Result type alias for rowguard operations
pub type Result<T> = std::result::Result<T, RowguardError>;
