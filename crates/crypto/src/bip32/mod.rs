//! BIP-32 hierarchical deterministic key derivation
//!
//! A seed becomes a master [`ExtendedKey`] through HMAC-SHA512 keyed with
//! `"Bitcoin seed"`; each [`ChildNumber`] in a [`DerivationPath`] then yields
//! the next key down the tree.
//!
//! # Example
//!
//! ```rust
//! use ethkey_crypto::bip32::{DerivationPath, ExtendedKey, DEFAULT_ETHEREUM_PATH};
//! use ethkey_crypto::mnemonic::Mnemonic;
//!
//! let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
//! let seed = mnemonic.to_seed(None);
//!
//! let master = ExtendedKey::master_from_seed(seed.expose_secret()).unwrap();
//! let path: DerivationPath = DEFAULT_ETHEREUM_PATH.parse().unwrap();
//! let account = master.derive_path(&path).unwrap();
//!
//! assert_eq!(account.depth(), 5);
//! assert_eq!(
//!     account.address().to_string(),
//!     "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
//! );
//! ```
//!
//! # Invalid keys
//!
//! A child index whose tweak is not below the curve order, or whose child
//! scalar is zero, fails with `InvalidChildKey`. The engine never skips to
//! the next index on its own.

mod error;
mod extended;
mod path;

pub use error::{DerivationError, DerivationResult};
pub use extended::{ExtendedKey, MASTER_KEY_SALT};
pub use path::{
    ethereum_path, ChildNumber, DerivationPath, DEFAULT_ETHEREUM_PATH, ETHEREUM_COIN_TYPE,
    HARDENED_OFFSET,
};
