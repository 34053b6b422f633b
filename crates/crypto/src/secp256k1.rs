//! Secp256k1 keys for Ethereum accounts
//!
//! Wraps `k256` so private scalars are range-checked on construction and
//! never printed. Public keys expose both SEC1 encodings: the 33-byte
//! compressed form used by BIP-32 and the 65-byte uncompressed form hashed
//! into addresses.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey as K256PublicKey, SecretKey as K256SecretKey};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::address::Address;

/// Errors for key parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Scalar is zero, not below the curve order, or not 32 bytes
    #[error("invalid secp256k1 private key")]
    InvalidPrivateKey,

    /// Bytes are not a valid SEC1 point on the curve
    #[error("invalid secp256k1 public key")]
    InvalidPublicKey,
}

/// Secp256k1 secret key, a scalar in [1, n-1]
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1SecretKey(K256SecretKey);

impl Secp256k1SecretKey {
    /// Load from a 32-byte big-endian scalar
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        K256SecretKey::from_bytes(&(*bytes).into())
            .map(Self)
            .map_err(|_| KeyError::InvalidPrivateKey)
    }

    /// Load from a slice that must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: &[u8; 32] = bytes.try_into().map_err(|_| KeyError::InvalidPrivateKey)?;
        Self::from_bytes(bytes)
    }

    /// Serialize to the 32-byte big-endian scalar
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.0.to_bytes().into())
    }

    /// Lowercase hex with a `0x` prefix
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(*self.to_bytes())))
    }

    /// Public key: the base point multiplied by this scalar
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(self.0.public_key())
    }

    pub(crate) fn inner(&self) -> &K256SecretKey {
        &self.0
    }

    pub(crate) fn from_inner(inner: K256SecretKey) -> Self {
        Self(inner)
    }
}

impl std::fmt::Debug for Secp256k1SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Secp256k1 public key
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1PublicKey(K256PublicKey);

impl Secp256k1PublicKey {
    /// Parse a SEC1 encoding, compressed (33 bytes) or uncompressed (65 bytes)
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        K256PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyError::InvalidPublicKey)
    }

    /// Serialize to compressed bytes (33 bytes)
    pub fn to_bytes(&self) -> [u8; 33] {
        let encoded = self.0.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Serialize to uncompressed bytes (65 bytes, with 0x04 prefix)
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        let encoded = self.0.to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Ethereum address of this key
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    pub(crate) fn inner(&self) -> &K256PublicKey {
        &self.0
    }

    pub(crate) fn from_inner(inner: K256PublicKey) -> Self {
        Self(inner)
    }
}

impl std::fmt::Debug for Secp256k1PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secp256k1PublicKey({})", hex::encode(self.to_bytes()))
    }
}

/// Private key with its public key
#[derive(Clone)]
pub struct Secp256k1KeyPair {
    /// Secret scalar
    pub secret_key: Secp256k1SecretKey,
    /// Matching public point
    pub public_key: Secp256k1PublicKey,
}

impl Secp256k1KeyPair {
    /// Build the pair from a secret key
    pub fn from_secret_key(secret_key: Secp256k1SecretKey) -> Self {
        let public_key = secret_key.public_key();
        Self {
            secret_key,
            public_key,
        }
    }

    /// Ethereum address of the pair
    pub fn address(&self) -> Address {
        self.public_key.address()
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
