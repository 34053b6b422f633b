//! BIP-39 mnemonic phrases
//!
//! Converts entropy to a checksummed sequence of English words and back, and
//! stretches a phrase plus optional passphrase into the 64-byte seed that
//! feeds HD derivation.
//!
//! # Example
//!
//! ```rust
//! use ethkey_crypto::mnemonic::Mnemonic;
//!
//! let mnemonic = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
//! assert_eq!(mnemonic.word_count(), 12);
//! assert!(mnemonic.phrase().ends_with("abandon about"));
//!
//! let seed = mnemonic.to_seed(Some("TREZOR"));
//! assert_eq!(seed.expose_secret().len(), 64);
//! ```
//!
//! # Security
//!
//! - Phrases are held as `SecretString` and wiped on drop
//! - Errors never include words from the phrase

mod codec;
mod error;
mod wordlist;

pub use codec::{
    decode, encode, word_count_to_entropy_bytes, Mnemonic, Seed, SEED_PBKDF2_ROUNDS,
    VALID_WORD_COUNTS,
};
pub use error::{MnemonicError, MnemonicResult};
pub use wordlist::ENGLISH;
