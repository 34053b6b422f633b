//! Web3 Secret Storage (v3) encrypted keystores
//!
//! The format stores one secp256k1 private key:
//!
//! - Passphrase stretched with scrypt or PBKDF2-HMAC-SHA256
//! - AES-128-CTR encryption with the first half of the derived key
//! - keccak256 MAC over the second half and the ciphertext
//!
//! KDF parameters read from a record are bounded by [`KdfLimits`] before any
//! work is done. Reading and writing files is left to the caller.
//!
//! # Example
//!
//! ```rust
//! use ethkey_crypto::keystore::{KdfParams, Keystore};
//! use ethkey_crypto::Secp256k1SecretKey;
//!
//! let key = Secp256k1SecretKey::from_bytes(&[0x11; 32]).unwrap();
//! let keystore = Keystore::encrypt(&key, "correct horse", KdfParams::Pbkdf2 { c: 1024 }).unwrap();
//!
//! let json = keystore.to_json().unwrap();
//! let loaded = Keystore::from_json(&json).unwrap();
//! assert_eq!(loaded.decrypt("correct horse").unwrap(), key);
//! ```

mod cipher;
mod encrypted;
mod error;
mod kdf;
mod mac;

pub use cipher::{decrypt_secret, encrypt_secret, CipherParams, CIPHER_NAME, IV_LENGTH};
pub use encrypted::{CryptoRecord, Keystore, KeystoreBuilder, KEYSTORE_VERSION};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{
    scrypt_memory_estimate, KdfLimits, KdfParams, KdfRecord, Pbkdf2Params, ScryptParams,
    DEFAULT_MAX_PBKDF2_ITERATIONS, DEFAULT_MAX_SCRYPT_MEMORY_BYTES, PBKDF2_C, SALT_LENGTH,
    SCRYPT_N, SCRYPT_P, SCRYPT_R,
};
pub use mac::{compute_mac, verify_mac};
