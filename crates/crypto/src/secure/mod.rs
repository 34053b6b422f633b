//! Secure memory handling for key material
//!
//! Containers here wipe their contents on drop and print `[REDACTED]` in
//! `Debug` output. Entropy, seeds, derived KDF keys and decrypted plaintext
//! all pass through them.

mod secret;

pub use secret::{SecretArray, SecretBytes, SecretString};
