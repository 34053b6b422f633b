//! Entropy sources for mnemonic generation.
//!
//! The production source reads the operating system CSPRNG. A failure to read
//! it is reported as [`EntropyError::Unavailable`]; there is no fallback to a
//! weaker generator.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Entropy lengths accepted by BIP-39, in bytes.
pub const VALID_ENTROPY_LENGTHS: [usize; 5] = [16, 20, 24, 28, 32];

/// Errors raised while gathering entropy
#[derive(Debug, Error)]
pub enum EntropyError {
    /// The random number generator could not be read
    #[error("entropy unavailable: {0}")]
    Unavailable(String),

    /// Requested length is not one of 16, 20, 24, 28 or 32 bytes
    #[error("invalid entropy length: {0} bytes (must be 16, 20, 24, 28, or 32)")]
    InvalidLength(usize),
}

/// Source of cryptographically secure random bytes.
pub trait EntropySource {
    /// Fill `dest` completely or fail.
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError>;

    /// Produce `len` bytes of entropy for a mnemonic.
    ///
    /// `len` must be one of [`VALID_ENTROPY_LENGTHS`]. The buffer is wiped
    /// when dropped.
    fn generate(&mut self, len: usize) -> Result<Zeroizing<Vec<u8>>, EntropyError> {
        if !VALID_ENTROPY_LENGTHS.contains(&len) {
            return Err(EntropyError::InvalidLength(len));
        }
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        self.try_fill(&mut bytes)?;
        Ok(bytes)
    }
}

/// Entropy from the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError::Unavailable(e.to_string()))
    }
}

/// Fill a fixed-size array from the OS RNG. Used for salts and IVs.
pub(crate) fn random_array<const N: usize>() -> Result<[u8; N], EntropyError> {
    let mut out = [0u8; N];
    OsEntropy.try_fill(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenRng;

    impl EntropySource for BrokenRng {
        fn try_fill(&mut self, _dest: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError::Unavailable("device not readable".to_string()))
        }
    }

    #[test]
    fn test_generate_valid_lengths() {
        for len in VALID_ENTROPY_LENGTHS {
            let bytes = OsEntropy.generate(len).unwrap();
            assert_eq!(bytes.len(), len);
        }
    }

    #[test]
    fn test_generate_rejects_invalid_length() {
        for len in [0, 15, 17, 33, 64] {
            assert!(matches!(
                OsEntropy.generate(len),
                Err(EntropyError::InvalidLength(l)) if l == len
            ));
        }
    }

    #[test]
    fn test_generate_is_not_constant() {
        let a = OsEntropy.generate(32).unwrap();
        let b = OsEntropy.generate(32).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_unavailable_source_is_fatal() {
        let result = BrokenRng.generate(16);
        assert!(matches!(result, Err(EntropyError::Unavailable(_))));
    }

    #[test]
    fn test_random_array() {
        let a: [u8; 16] = random_array().unwrap();
        let b: [u8; 16] = random_array().unwrap();
        assert_ne!(a, b);
    }
}
