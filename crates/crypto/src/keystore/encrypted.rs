//! Web3 Secret Storage (version 3) keystore records
//!
//! Combines the KDF, cipher and MAC pieces into the JSON record used by geth,
//! MetaMask and most Ethereum tooling.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::cipher::{decrypt_secret, encrypt_secret, CipherParams, CIPHER_NAME, IV_LENGTH};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{KdfLimits, KdfParams, KdfRecord, SALT_LENGTH};
use super::mac::{compute_mac, verify_mac};
use crate::address::Address;
use crate::entropy::random_array;
use crate::secp256k1::Secp256k1SecretKey;

/// Only record version this codec reads and writes
pub const KEYSTORE_VERSION: u64 = 3;

/// A version 3 keystore record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keystore {
    pub version: u64,
    pub id: String,
    /// Lowercase hex address without prefix; optional on input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Older geth versions wrote `Crypto`
    #[serde(alias = "Crypto")]
    pub crypto: CryptoRecord,
}

/// The `crypto` object of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoRecord {
    pub cipher: String,
    pub cipherparams: CipherParams,
    pub ciphertext: String,
    pub kdf: String,
    /// Kept raw until `kdf` says how to read it
    pub kdfparams: serde_json::Value,
    pub mac: String,
}

impl CryptoRecord {
    /// Typed KDF parameters
    pub fn kdf_record(&self) -> KeystoreResult<KdfRecord> {
        KdfRecord::from_parts(&self.kdf, &self.kdfparams)
    }
}

impl Keystore {
    /// Encrypt `secret_key` under `passphrase` with fresh salt, IV and id
    pub fn encrypt(
        secret_key: &Secp256k1SecretKey,
        passphrase: &str,
        kdf: KdfParams,
    ) -> KeystoreResult<Self> {
        KeystoreBuilder::new(secret_key)
            .passphrase(passphrase)
            .kdf(kdf)
            .build()
    }

    /// Decrypt with the default [`KdfLimits`]
    pub fn decrypt(&self, passphrase: &str) -> KeystoreResult<Secp256k1SecretKey> {
        self.decrypt_with_limits(passphrase, &KdfLimits::default())
    }

    /// Decrypt, refusing KDF parameters above `limits`
    ///
    /// # Errors
    ///
    /// `UnsupportedVersion` and `UnsupportedAlgorithm` for records this codec
    /// does not understand, `ResourceLimitExceeded` before any hashing when
    /// the KDF is too expensive, `MacMismatch` for a wrong passphrase or a
    /// tampered record, and `Malformed` when the plaintext is not a valid
    /// private key.
    pub fn decrypt_with_limits(
        &self,
        passphrase: &str,
        limits: &KdfLimits,
    ) -> KeystoreResult<Secp256k1SecretKey> {
        if self.version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedVersion(self.version));
        }
        if self.crypto.cipher != CIPHER_NAME {
            return Err(KeystoreError::UnsupportedAlgorithm {
                kind: "cipher",
                name: self.crypto.cipher.clone(),
            });
        }

        let kdf = self.crypto.kdf_record()?;
        kdf.validate(limits)?;

        let ciphertext = decode_hex("ciphertext", &self.crypto.ciphertext)?;
        let mac = decode_hex("mac", &self.crypto.mac)?;
        let iv = self.crypto.cipherparams.iv()?;

        debug!(id = %self.id, kdf = kdf.name(), "Decrypting keystore");

        let derived_key = kdf.derive_key(passphrase.as_bytes(), limits)?;
        let dk = derived_key.expose_secret();

        verify_mac(dk, &ciphertext, &mac)?;

        let plaintext = decrypt_secret(&ciphertext, dk, &iv)?;
        let secret_key = Secp256k1SecretKey::from_slice(&plaintext).map_err(|_| {
            KeystoreError::Malformed("decrypted key is not a valid secp256k1 private key".into())
        })?;

        self.check_address(&secret_key);
        Ok(secret_key)
    }

    /// Recorded address, if present and parseable
    pub fn address(&self) -> Option<Address> {
        self.address.as_deref().and_then(|a| a.parse().ok())
    }

    /// Unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The decrypted key is authoritative; a differing record address is only logged
    fn check_address(&self, secret_key: &Secp256k1SecretKey) {
        let Some(recorded) = self.address.as_deref() else {
            return;
        };
        let actual = secret_key.public_key().address();
        if recorded.parse::<Address>().ok() != Some(actual) {
            warn!(
                id = %self.id,
                recorded,
                derived = %actual,
                "Keystore address does not match the decrypted key"
            );
        }
    }
}

fn decode_hex(field: &str, value: &str) -> KeystoreResult<Vec<u8>> {
    hex::decode(value).map_err(|e| KeystoreError::Malformed(format!("invalid {field} hex: {e}")))
}

/// Builder for [`Keystore`] records
///
/// Salt, IV and id default to fresh random values; fixing them is only
/// useful for reproducible fixtures.
pub struct KeystoreBuilder<'a> {
    secret_key: &'a Secp256k1SecretKey,
    passphrase: &'a str,
    kdf: KdfParams,
    limits: KdfLimits,
    salt: Option<Vec<u8>>,
    iv: Option<[u8; IV_LENGTH]>,
    id: Option<Uuid>,
}

impl<'a> KeystoreBuilder<'a> {
    /// Start a builder for `secret_key` with default scrypt cost
    pub fn new(secret_key: &'a Secp256k1SecretKey) -> Self {
        Self {
            secret_key,
            passphrase: "",
            kdf: KdfParams::default(),
            limits: KdfLimits::default(),
            salt: None,
            iv: None,
            id: None,
        }
    }

    /// Set the passphrase for key derivation
    pub fn passphrase(mut self, passphrase: &'a str) -> Self {
        self.passphrase = passphrase;
        self
    }

    pub fn kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn limits(mut self, limits: KdfLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn salt(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    pub fn iv(mut self, iv: [u8; IV_LENGTH]) -> Self {
        self.iv = Some(iv);
        self
    }

    /// Set a custom id (normally a random v4 UUID)
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Build the keystore
    ///
    /// # Errors
    ///
    /// `EmptyPassphrase` is returned before any randomness or hashing.
    pub fn build(self) -> KeystoreResult<Keystore> {
        if self.passphrase.is_empty() {
            return Err(KeystoreError::EmptyPassphrase);
        }
        self.kdf.validate(&self.limits)?;

        let salt = match self.salt {
            Some(salt) => salt,
            None => random_array::<SALT_LENGTH>()?.to_vec(),
        };
        let iv = match self.iv {
            Some(iv) => iv,
            None => random_array::<IV_LENGTH>()?,
        };

        let kdf = KdfRecord::new(self.kdf, &salt);
        let derived_key = kdf.derive_key(self.passphrase.as_bytes(), &self.limits)?;
        let dk = derived_key.expose_secret();

        let ciphertext = encrypt_secret(&*self.secret_key.to_bytes(), dk, &iv)?;
        let mac = compute_mac(dk, &ciphertext)?;

        let (kdf_name, kdfparams) = kdf.to_parts()?;
        let address = self.secret_key.public_key().address();
        let id = self.id.unwrap_or_else(Uuid::new_v4);

        debug!(%id, kdf = kdf_name, %address, "Encrypted keystore");

        Ok(Keystore {
            version: KEYSTORE_VERSION,
            id: id.to_string(),
            address: Some(address.to_plain_hex()),
            crypto: CryptoRecord {
                cipher: CIPHER_NAME.to_string(),
                cipherparams: CipherParams::new(&iv),
                ciphertext: hex::encode(ciphertext),
                kdf: kdf_name.to_string(),
                kdfparams,
                mac: hex::encode(mac),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURE_KEY: &str = "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d";
    const FIXTURE_PASSWORD: &str = "testpassword";

    // Web3 Secret Storage definition, PBKDF2-SHA-256 test vector
    const PBKDF2_VECTOR: &str = r#"{
        "crypto": {
            "cipher": "aes-128-ctr",
            "cipherparams": {"iv": "6087dab2f9fdbbfaddc31a909735c1e6"},
            "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
            "kdf": "pbkdf2",
            "kdfparams": {
                "c": 262144,
                "dklen": 32,
                "prf": "hmac-sha256",
                "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
            },
            "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"
        },
        "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
        "version": 3
    }"#;

    fn fixture_key() -> Secp256k1SecretKey {
        Secp256k1SecretKey::from_slice(&hex::decode(FIXTURE_KEY).unwrap()).unwrap()
    }

    fn cheap_kdf() -> KdfParams {
        KdfParams::Scrypt { n: 1024, r: 8, p: 1 }
    }

    fn fixed_salt() -> Vec<u8> {
        (0u8..32).collect()
    }

    fn fixed_iv() -> [u8; 16] {
        let mut iv = [0u8; 16];
        for (i, b) in iv.iter_mut().enumerate() {
            *b = 0x10 + i as u8;
        }
        iv
    }

    fn cheap_keystore(passphrase: &str) -> Keystore {
        Keystore::encrypt(&fixture_key(), passphrase, cheap_kdf()).unwrap()
    }

    #[test]
    fn test_pbkdf2_vector_decrypts() {
        let keystore = Keystore::from_json(PBKDF2_VECTOR).unwrap();
        let secret = keystore.decrypt(FIXTURE_PASSWORD).unwrap();

        assert_eq!(hex::encode(*secret.to_bytes()), FIXTURE_KEY);
        assert_eq!(
            secret.public_key().address().to_string(),
            "0x008AeEda4D805471dF9b2A5B0f38A0C3bCBA786b"
        );
    }

    #[test]
    fn test_scrypt_fixture_is_reproducible() {
        let key = fixture_key();
        let keystore = KeystoreBuilder::new(&key)
            .passphrase(FIXTURE_PASSWORD)
            .kdf(cheap_kdf())
            .salt(&fixed_salt())
            .iv(fixed_iv())
            .build()
            .unwrap();

        assert_eq!(
            keystore.crypto.ciphertext,
            "b2f0b7ccdba8068a3661fe42fe435e9d672e615aaaaad745b84a08fa1e741ee7"
        );
        assert_eq!(
            keystore.crypto.mac,
            "07d323eed6af56b50142373e46e62d92e2beaa599dec2b7461926353d05b594f"
        );
        assert_eq!(keystore.crypto.cipherparams.iv, "101112131415161718191a1b1c1d1e1f");
        assert_eq!(keystore.crypto.kdf, "scrypt");
        assert_eq!(
            keystore.crypto.kdfparams,
            json!({"dklen": 32, "n": 1024, "p": 1, "r": 8, "salt": hex::encode(fixed_salt())})
        );
        assert_eq!(
            keystore.address.as_deref(),
            Some("008aeeda4d805471df9b2a5b0f38a0c3bcba786b")
        );
        assert_eq!(keystore.decrypt(FIXTURE_PASSWORD).unwrap(), key);
    }

    #[test]
    fn test_record_shape() {
        let keystore = cheap_keystore("passphrase");
        assert_eq!(keystore.version, 3);
        assert_eq!(keystore.crypto.cipher, "aes-128-ctr");
        assert_eq!(keystore.crypto.ciphertext.len(), 64);
        assert_eq!(keystore.crypto.mac.len(), 64);
        assert_eq!(
            keystore.address(),
            Some(fixture_key().public_key().address())
        );

        let id: Uuid = keystore.id().parse().unwrap();
        assert_eq!(id.get_version_num(), 4);

        let value: serde_json::Value = serde_json::from_str(&keystore.to_json().unwrap()).unwrap();
        let salt = value["crypto"]["kdfparams"]["salt"].as_str().unwrap();
        assert_eq!(hex::decode(salt).unwrap().len(), SALT_LENGTH);
    }

    #[test]
    fn test_fresh_randomness_per_encryption() {
        let a = cheap_keystore("passphrase");
        let b = cheap_keystore("passphrase");
        assert_ne!(a.id, b.id);
        assert_ne!(a.crypto.cipherparams, b.crypto.cipherparams);
        assert_ne!(a.crypto.ciphertext, b.crypto.ciphertext);
    }

    #[test]
    fn test_pbkdf2_roundtrip() {
        let keystore =
            Keystore::encrypt(&fixture_key(), "passphrase", KdfParams::Pbkdf2 { c: 1000 }).unwrap();
        assert_eq!(keystore.crypto.kdf, "pbkdf2");
        assert_eq!(keystore.crypto.kdfparams["prf"], "hmac-sha256");
        assert_eq!(keystore.decrypt("passphrase").unwrap(), fixture_key());
    }

    #[test]
    fn test_wrong_passphrase_is_mac_mismatch() {
        let keystore = cheap_keystore("correct");
        assert!(matches!(
            keystore.decrypt("wrong"),
            Err(KeystoreError::MacMismatch)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_is_mac_mismatch() {
        let mut keystore = cheap_keystore("passphrase");
        let mut ciphertext = hex::decode(&keystore.crypto.ciphertext).unwrap();
        ciphertext[0] ^= 0x01;
        keystore.crypto.ciphertext = hex::encode(ciphertext);
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::MacMismatch)
        ));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(
            Keystore::encrypt(&fixture_key(), "", cheap_kdf()),
            Err(KeystoreError::EmptyPassphrase)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut keystore = cheap_keystore("passphrase");
        keystore.version = 4;
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::UnsupportedVersion(4))
        ));
    }

    #[test]
    fn test_unsupported_algorithms() {
        let mut keystore = cheap_keystore("passphrase");
        keystore.crypto.cipher = "aes-128-cbc".to_string();
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::UnsupportedAlgorithm { kind: "cipher", .. })
        ));

        let mut keystore = cheap_keystore("passphrase");
        keystore.crypto.kdf = "argon2id".to_string();
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::UnsupportedAlgorithm { kind: "kdf", .. })
        ));
    }

    #[test]
    fn test_scrypt_cost_above_limit() {
        let mut keystore = cheap_keystore("passphrase");
        keystore.crypto.kdfparams["n"] = json!(1u64 << 30);
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::ResourceLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_oversized_scrypt_record_hits_limit_before_shape_checks() {
        // 2^40 is too large for r = 2 and 3e12 is not a power of two; both are
        // still reported as too expensive
        for (n, r) in [(1u64 << 40, 2u64), (3_000_000_000_000, 8)] {
            let mut keystore = cheap_keystore("passphrase");
            keystore.crypto.kdfparams["n"] = json!(n);
            keystore.crypto.kdfparams["r"] = json!(r);
            assert!(
                matches!(
                    keystore.decrypt("passphrase"),
                    Err(KeystoreError::ResourceLimitExceeded { .. })
                ),
                "n={n} r={r}"
            );
        }
    }

    #[test]
    fn test_pbkdf2_cost_above_custom_limit() {
        let keystore = Keystore::from_json(PBKDF2_VECTOR).unwrap();
        let limits = KdfLimits {
            max_pbkdf2_iterations: 100_000,
            ..KdfLimits::default()
        };
        assert!(matches!(
            keystore.decrypt_with_limits(FIXTURE_PASSWORD, &limits),
            Err(KeystoreError::ResourceLimitExceeded { required: 262_144, .. })
        ));
    }

    #[test]
    fn test_malformed_fields() {
        let mut keystore = cheap_keystore("passphrase");
        keystore.crypto.mac = "zz".to_string();
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::Malformed(_))
        ));

        let mut keystore = cheap_keystore("passphrase");
        keystore.crypto.cipherparams.iv = "0011".to_string();
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::Malformed(_))
        ));

        let mut keystore = cheap_keystore("passphrase");
        keystore.crypto.kdfparams["n"] = json!(1000);
        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
    }

    #[test]
    fn test_invalid_plaintext_scalar() {
        // Re-encrypt a zero scalar under the same derived key
        let mut keystore = cheap_keystore("passphrase");
        let kdf = keystore.crypto.kdf_record().unwrap();
        let dk = kdf
            .derive_key(b"passphrase", &KdfLimits::default())
            .unwrap();
        let iv = keystore.crypto.cipherparams.iv().unwrap();
        let ciphertext = encrypt_secret(&[0u8; 32], dk.expose_secret(), &iv).unwrap();
        keystore.crypto.mac = hex::encode(compute_mac(dk.expose_secret(), &ciphertext).unwrap());
        keystore.crypto.ciphertext = hex::encode(ciphertext);

        assert!(matches!(
            keystore.decrypt("passphrase"),
            Err(KeystoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_address_mismatch_still_decrypts() {
        let mut keystore = cheap_keystore("passphrase");
        keystore.address = Some("0000000000000000000000000000000000000000".to_string());
        assert_eq!(keystore.decrypt("passphrase").unwrap(), fixture_key());
    }

    #[test]
    fn test_lenient_parsing() {
        let keystore = cheap_keystore("passphrase");
        let mut value: serde_json::Value = serde_json::from_str(&keystore.to_json().unwrap()).unwrap();
        let object = value.as_object_mut().unwrap();
        let crypto = object.remove("crypto").unwrap();
        object.insert("Crypto".to_string(), crypto);
        object.remove("address");

        let parsed = Keystore::from_json(&value.to_string()).unwrap();
        assert!(parsed.address.is_none());
        assert_eq!(parsed.decrypt("passphrase").unwrap(), fixture_key());
    }

    #[test]
    fn test_json_roundtrip() {
        let keystore = cheap_keystore("passphrase");
        let parsed = Keystore::from_json(&keystore.to_json().unwrap()).unwrap();
        assert_eq!(parsed, keystore);
        assert!(matches!(
            Keystore::from_json("{\"version\": 3}"),
            Err(KeystoreError::Json(_))
        ));
    }
}
