//! Error types for mnemonic operations

use thiserror::Error;

use crate::entropy::EntropyError;

/// Result type for mnemonic operations
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Errors that can occur while encoding, decoding or generating mnemonics
#[derive(Debug, Error)]
pub enum MnemonicError {
    /// Word count is not 12, 15, 18, 21 or 24
    #[error("invalid word count: {0} (must be 12, 15, 18, 21, or 24)")]
    InvalidWordCount(usize),

    /// A word is not in the wordlist. Only the 1-based position is reported so
    /// that fragments of a secret phrase never reach logs.
    #[error("unknown word at position {position}")]
    UnknownWord { position: usize },

    /// The embedded checksum does not match the recovered entropy
    #[error("invalid mnemonic checksum")]
    InvalidChecksum,

    /// Entropy could not be produced or has an unsupported length
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}
