//! AES-128-CTR cipher for keystore encryption
//!
//! CTR mode needs no padding: ciphertext and plaintext have the same length.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::error::{KeystoreError, KeystoreResult};

/// Record name of the only supported cipher
pub const CIPHER_NAME: &str = "aes-128-ctr";

/// IV (initialization vector) length for AES-128-CTR
pub const IV_LENGTH: usize = 16;

/// AES-128 key length
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// `cipherparams` of a keystore record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherParams {
    /// Initialization vector as hex string
    pub iv: String,
}

impl CipherParams {
    pub fn new(iv: &[u8; IV_LENGTH]) -> Self {
        Self {
            iv: hex::encode(iv),
        }
    }

    /// Decoded IV; must be exactly 16 bytes
    pub fn iv(&self) -> KeystoreResult<[u8; IV_LENGTH]> {
        let mut iv = [0u8; IV_LENGTH];
        hex::decode_to_slice(&self.iv, &mut iv)
            .map_err(|e| KeystoreError::Malformed(format!("invalid IV: {e}")))?;
        Ok(iv)
    }
}

/// Encrypt with the first 16 bytes of the derived key
pub fn encrypt_secret(
    secret: &[u8],
    derived_key: &[u8],
    iv: &[u8; IV_LENGTH],
) -> KeystoreResult<Vec<u8>> {
    let mut ciphertext = secret.to_vec();
    apply_keystream(derived_key, iv, &mut ciphertext)?;
    Ok(ciphertext)
}

/// Decrypt with the first 16 bytes of the derived key
pub fn decrypt_secret(
    ciphertext: &[u8],
    derived_key: &[u8],
    iv: &[u8; IV_LENGTH],
) -> KeystoreResult<Zeroizing<Vec<u8>>> {
    let mut plaintext = Zeroizing::new(ciphertext.to_vec());
    apply_keystream(derived_key, iv, &mut plaintext)?;
    Ok(plaintext)
}

fn apply_keystream(derived_key: &[u8], iv: &[u8; IV_LENGTH], data: &mut [u8]) -> KeystoreResult<()> {
    let key: Zeroizing<[u8; AES_KEY_LENGTH]> = derived_key
        .get(..AES_KEY_LENGTH)
        .and_then(|k| <[u8; AES_KEY_LENGTH]>::try_from(k).ok())
        .map(Zeroizing::new)
        .ok_or_else(|| {
            KeystoreError::Malformed(format!(
                "derived key must be at least {} bytes, got {}",
                AES_KEY_LENGTH,
                derived_key.len()
            ))
        })?;

    let mut cipher = Aes128Ctr::new(&(*key).into(), &(*iv).into());
    cipher.apply_keystream(data);
    Ok(())
}
