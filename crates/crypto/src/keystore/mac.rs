//! Keystore MAC: keccak256(dk[16..32] ‖ ciphertext)

use subtle::ConstantTimeEq;

use super::error::{KeystoreError, KeystoreResult};
use crate::hash::keccak256_concat;

/// MAC length in bytes
pub const MAC_LENGTH: usize = 32;

const MAC_KEY_RANGE: std::ops::Range<usize> = 16..32;

/// Compute the MAC over `ciphertext` with the second half of the derived key
pub fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<[u8; MAC_LENGTH]> {
    let mac_key = derived_key.get(MAC_KEY_RANGE).ok_or_else(|| {
        KeystoreError::Malformed(format!(
            "derived key must be at least 32 bytes, got {}",
            derived_key.len()
        ))
    })?;
    Ok(keccak256_concat(&[mac_key, ciphertext]))
}

/// Constant-time comparison against the stored MAC
pub fn verify_mac(derived_key: &[u8], ciphertext: &[u8], expected: &[u8]) -> KeystoreResult<()> {
    let computed = compute_mac(derived_key, ciphertext)?;
    if bool::from(computed[..].ct_eq(expected)) {
        Ok(())
    } else {
        Err(KeystoreError::MacMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;

    #[test]
    fn test_mac_uses_second_half_of_key() {
        let mut dk = [0u8; 32];
        dk[16..].copy_from_slice(&[0x11; 16]);
        let ciphertext = [0x22; 32];

        let mut preimage = vec![0x11; 16];
        preimage.extend_from_slice(&ciphertext);
        assert_eq!(compute_mac(&dk, &ciphertext).unwrap(), keccak256(&preimage));

        // First half does not contribute
        let mut other = dk;
        other[0] = 0xff;
        assert_eq!(
            compute_mac(&other, &ciphertext).unwrap(),
            compute_mac(&dk, &ciphertext).unwrap()
        );
    }

    #[test]
    fn test_verify_mac() {
        let dk = [0x33; 32];
        let ciphertext = [0x44; 32];
        let mac = compute_mac(&dk, &ciphertext).unwrap();

        assert!(verify_mac(&dk, &ciphertext, &mac).is_ok());

        let mut flipped = mac;
        flipped[31] ^= 0x01;
        assert!(matches!(
            verify_mac(&dk, &ciphertext, &flipped),
            Err(KeystoreError::MacMismatch)
        ));
        assert!(matches!(
            verify_mac(&dk, &ciphertext, &mac[..31]),
            Err(KeystoreError::MacMismatch)
        ));
    }

    #[test]
    fn test_short_key_is_malformed() {
        assert!(matches!(
            compute_mac(&[0u8; 20], b"ct"),
            Err(KeystoreError::Malformed(_))
        ));
    }
}
