//! Crate-level error type

use thiserror::Error;

use crate::address::AddressError;
use crate::bip32::DerivationError;
use crate::entropy::EntropyError;
use crate::keystore::KeystoreError;
use crate::mnemonic::MnemonicError;
use crate::secp256k1::KeyError;

/// Result type using [`CryptoError`]
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Any error raised by this crate
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),
}

/// Flat classification of every failure, for callers that branch on cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EntropyUnavailable,
    InvalidEntropyLength,
    InvalidWordCount,
    UnknownWord,
    InvalidChecksum,
    InvalidPath,
    InvalidMasterKey,
    InvalidChildKey,
    InvalidKey,
    InvalidAddress,
    UnsupportedVersion,
    UnsupportedAlgorithm,
    MacMismatch,
    EmptyPassphrase,
    ResourceLimitExceeded,
    MalformedKeystore,
}

impl ErrorKind {
    /// Stable snake_case name, used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntropyUnavailable => "entropy_unavailable",
            Self::InvalidEntropyLength => "invalid_entropy_length",
            Self::InvalidWordCount => "invalid_word_count",
            Self::UnknownWord => "unknown_word",
            Self::InvalidChecksum => "invalid_checksum",
            Self::InvalidPath => "invalid_path",
            Self::InvalidMasterKey => "invalid_master_key",
            Self::InvalidChildKey => "invalid_child_key",
            Self::InvalidKey => "invalid_key",
            Self::InvalidAddress => "invalid_address",
            Self::UnsupportedVersion => "unsupported_version",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::MacMismatch => "mac_mismatch",
            Self::EmptyPassphrase => "empty_passphrase",
            Self::ResourceLimitExceeded => "resource_limit_exceeded",
            Self::MalformedKeystore => "malformed_keystore",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EntropyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) => ErrorKind::EntropyUnavailable,
            Self::InvalidLength(_) => ErrorKind::InvalidEntropyLength,
        }
    }
}

impl MnemonicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidWordCount(_) => ErrorKind::InvalidWordCount,
            Self::UnknownWord { .. } => ErrorKind::UnknownWord,
            Self::InvalidChecksum => ErrorKind::InvalidChecksum,
            Self::Entropy(e) => e.kind(),
        }
    }
}

impl DerivationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath(_) | Self::HardenedFromPublic { .. } | Self::MaxDepthExceeded => {
                ErrorKind::InvalidPath
            }
            Self::InvalidSeedLength(_) | Self::InvalidMasterKey => ErrorKind::InvalidMasterKey,
            Self::InvalidChildKey { .. } => ErrorKind::InvalidChildKey,
        }
    }
}

impl KeystoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPassphrase => ErrorKind::EmptyPassphrase,
            Self::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            Self::UnsupportedAlgorithm { .. } => ErrorKind::UnsupportedAlgorithm,
            Self::MacMismatch => ErrorKind::MacMismatch,
            Self::ResourceLimitExceeded { .. } => ErrorKind::ResourceLimitExceeded,
            Self::InvalidKdfParams(_) | Self::Malformed(_) | Self::Json(_) => {
                ErrorKind::MalformedKeystore
            }
            Self::Entropy(e) => e.kind(),
        }
    }
}

impl CryptoError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Entropy(e) => e.kind(),
            Self::Mnemonic(e) => e.kind(),
            Self::Derivation(e) => e.kind(),
            Self::Key(_) => ErrorKind::InvalidKey,
            Self::Address(_) => ErrorKind::InvalidAddress,
            Self::Keystore(e) => e.kind(),
        }
    }
}
