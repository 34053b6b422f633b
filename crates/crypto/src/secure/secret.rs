//! Secret wrapper types built on `secrecy` and `zeroize`

use secrecy::{SecretBox, SecretString as SecrecySecretString};
use zeroize::Zeroize;

/// A heap-allocated secret byte buffer that is zeroized on drop.
///
/// Used for variable-length secrets such as KDF output and decrypted
/// keystore plaintext.
///
/// ```rust
/// use ethkey_crypto::secure::SecretBytes;
/// use secrecy::ExposeSecret;
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string that is zeroized on drop. Passphrases and phrases.
pub type SecretString = SecrecySecretString;

/// A fixed-size secret byte array, zeroized on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretArray<const N: usize> {
    inner: [u8; N],
}

impl<const N: usize> SecretArray<N> {
    /// Wrap `bytes`. The caller should wipe its own copy.
    pub fn new(bytes: [u8; N]) -> Self {
        Self { inner: bytes }
    }

    /// Expose the secret bytes.
    ///
    /// # Security
    ///
    /// The returned reference should not be stored.
    pub fn expose_secret(&self) -> &[u8; N] {
        &self.inner
    }
}

impl<const N: usize> std::fmt::Debug for SecretArray<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretArray")
            .field("length", &N)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
