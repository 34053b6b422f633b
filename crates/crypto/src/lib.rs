//! Key management primitives for Ethereum externally owned accounts
//!
//! This crate provides:
//! - Entropy sources backed by the OS CSPRNG
//! - BIP-39 mnemonic encoding, validation and seed derivation
//! - BIP-32 hierarchical deterministic derivation over secp256k1
//! - Ethereum addresses with EIP-55 checksums
//! - Web3 Secret Storage (v3) keystores with bounded KDF cost
//!
//! Secret material (entropy, seeds, chain codes, private scalars, derived
//! KDF keys) is held in zeroizing containers and never printed by `Debug`.

pub mod address;
pub mod bip32;
pub mod entropy;
pub mod error;
pub mod hash;
pub mod keystore;
pub mod mnemonic;
pub mod secp256k1;
pub mod secure;

// Entropy exports
pub use entropy::{EntropyError, EntropySource, OsEntropy, VALID_ENTROPY_LENGTHS};

// Mnemonic exports
pub use mnemonic::{Mnemonic, MnemonicError, Seed, VALID_WORD_COUNTS};

// HD derivation exports
pub use bip32::{
    ChildNumber, DerivationError, DerivationPath, ExtendedKey, DEFAULT_ETHEREUM_PATH,
};

// Key and address exports
pub use address::{Address, AddressError};
pub use secp256k1::{KeyError, Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1SecretKey};

// Keystore exports
pub use keystore::{KdfLimits, KdfParams, Keystore, KeystoreBuilder, KeystoreError};

// Error exports
pub use error::{CryptoError, CryptoResult, ErrorKind};

// Secure memory exports
pub use secrecy::ExposeSecret;
pub use secure::{SecretArray, SecretBytes, SecretString};
