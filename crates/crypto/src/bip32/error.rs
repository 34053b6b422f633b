//! Error types for HD key derivation

use thiserror::Error;

/// Result type for derivation operations
pub type DerivationResult<T> = Result<T, DerivationError>;

/// Errors that can occur while deriving extended keys
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// Path text is malformed
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// Seed is outside the 16..=64 byte range
    #[error("invalid seed length: {0} bytes (must be 16 to 64)")]
    InvalidSeedLength(usize),

    /// Master secret from the seed is zero or not below the curve order
    #[error("seed produces an invalid master key")]
    InvalidMasterKey,

    /// This index yields an invalid key; the caller may try the next index
    #[error("child index {index} produces an invalid key")]
    InvalidChildKey { index: u32 },

    /// Hardened children need the parent private key
    #[error("cannot derive hardened child {index} from a public-only key")]
    HardenedFromPublic { index: u32 },

    /// Depth would exceed 255
    #[error("maximum derivation depth exceeded")]
    MaxDepthExceeded,
}
