//! Ethereum addresses with EIP-55 checksums
//!
//! An address is the last 20 bytes of keccak256 over the 64-byte uncompressed
//! public key (format byte dropped). Its text form upper-cases each hex letter
//! whose nibble in keccak256(lowercase hex) is 8 or more.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::hash::keccak256;
use crate::secp256k1::Secp256k1PublicKey;

/// Address length in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Errors when parsing an address string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Not 40 hex characters after the optional `0x`
    #[error("invalid address length: expected 40 hex characters, got {0}")]
    InvalidLength(usize),

    /// Contains a non-hex character
    #[error("invalid hex in address")]
    InvalidHex,

    /// Mixed-case input that does not match its EIP-55 checksum
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// 20-byte Ethereum account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Address of a public key: keccak256(uncompressed[1..])[12..]
    pub fn from_public_key(public_key: &Secp256k1PublicKey) -> Self {
        let uncompressed = public_key.to_uncompressed_bytes();
        let hash = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Lowercase hex without prefix, as stored in keystore files
    pub fn to_plain_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 mixed-case form with `0x` prefix
    pub fn to_checksum(&self) -> String {
        let lower = self.to_plain_hex();
        let hash = keccak256(lower.as_bytes());
        format!("0x{}", apply_checksum(&lower, &hash))
    }
}

/// Upper-case every hex letter in `lower` whose matching nibble of `hash` is
/// 8 or more. `lower` must be 40 lowercase hex characters.
fn apply_checksum(lower: &str, hash: &[u8; 32]) -> String {
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts 40 hex digits with or without `0x`. Uniform case is taken as
    /// is; mixed case must carry a valid EIP-55 checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(AddressError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
        let address = Self(bytes);

        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && address.to_checksum()[2..] != *digits {
            return Err(AddressError::ChecksumMismatch);
        }

        Ok(address)
    }
}
