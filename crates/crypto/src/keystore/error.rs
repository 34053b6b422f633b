//! Keystore error types

use thiserror::Error;

use crate::entropy::EntropyError;

/// Errors that can occur during keystore operations
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Encryption was asked to use an empty passphrase
    #[error("keystore passphrase must not be empty")]
    EmptyPassphrase,

    /// Record version is not 3
    #[error("unsupported keystore version: {0}")]
    UnsupportedVersion(u64),

    /// Unknown cipher, KDF or PRF name
    #[error("unsupported {kind} algorithm: {name}")]
    UnsupportedAlgorithm { kind: &'static str, name: String },

    /// MAC does not match: wrong passphrase or a tampered record
    #[error("MAC mismatch: wrong passphrase or corrupted keystore")]
    MacMismatch,

    /// KDF cost exceeds the configured ceiling
    #[error("{resource} {required} exceeds the limit of {limit}")]
    ResourceLimitExceeded {
        resource: &'static str,
        required: u64,
        limit: u64,
    },

    /// KDF parameters are structurally invalid
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Record content is unusable (bad hex, wrong lengths, invalid plaintext)
    #[error("malformed keystore: {0}")]
    Malformed(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Salt or IV could not be generated
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;
