//! Integration tests for Ethereum key management
//!
//! These tests run the complete pipelines across modules:
//! - Entropy -> mnemonic -> seed -> HD key -> address
//! - Private key -> keystore JSON -> private key
//! - Error classification at the crate boundary

use ethkey_crypto::bip32::{ethereum_path, DerivationPath, ExtendedKey, DEFAULT_ETHEREUM_PATH};
use ethkey_crypto::keystore::{KdfLimits, KdfParams, Keystore};
use ethkey_crypto::mnemonic::Mnemonic;
use ethkey_crypto::{
    CryptoError, EntropyError, EntropySource, ErrorKind, OsEntropy, Secp256k1KeyPair,
};

/// Entropy source that replays fixed bytes
struct FixedEntropy(u8);

impl EntropySource for FixedEntropy {
    fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        dest.fill(self.0);
        Ok(())
    }
}

fn derive_account(mnemonic: &Mnemonic, passphrase: Option<&str>, path: &str) -> ExtendedKey {
    let seed = mnemonic.to_seed(passphrase);
    let master = ExtendedKey::master_from_seed(seed.expose_secret()).unwrap();
    let path: DerivationPath = path.parse().unwrap();
    master.derive_path(&path).unwrap()
}

/// Test the generate -> derive -> address pipeline with fixed entropy
#[test]
fn test_fixed_entropy_pipeline() {
    let mnemonic = Mnemonic::generate(&mut FixedEntropy(0), 12).unwrap();
    assert_eq!(
        mnemonic.phrase(),
        "abandon abandon abandon abandon abandon abandon \
         abandon abandon abandon abandon abandon about"
    );

    let account = derive_account(&mnemonic, None, DEFAULT_ETHEREUM_PATH);
    assert_eq!(
        account.address().to_string(),
        "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
    );
    assert_eq!(
        account.private_key().unwrap().to_hex().as_str(),
        "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    );
}

/// A restored phrase derives the same account as the generated one
#[test]
fn test_generate_then_restore() {
    let generated = Mnemonic::generate(&mut OsEntropy, 24).unwrap();
    assert_eq!(generated.word_count(), 24);

    let restored = Mnemonic::from_phrase(generated.phrase()).unwrap();
    let a = derive_account(&generated, None, DEFAULT_ETHEREUM_PATH);
    let b = derive_account(&restored, None, DEFAULT_ETHEREUM_PATH);
    assert_eq!(a, b);
}

/// BIP-39 passphrase and account index both change the derived address
#[test]
fn test_passphrase_and_index_separate_accounts() {
    let mnemonic = Mnemonic::generate(&mut FixedEntropy(7), 24).unwrap();

    let plain = derive_account(&mnemonic, None, DEFAULT_ETHEREUM_PATH);
    let protected = derive_account(&mnemonic, Some("hunter2"), DEFAULT_ETHEREUM_PATH);
    let second = derive_account(&mnemonic, None, &ethereum_path(0, 1).unwrap().to_string());

    assert_ne!(plain.address(), protected.address());
    assert_ne!(plain.address(), second.address());
}

/// Derived key -> keystore JSON -> same key and address
#[test]
fn test_keystore_roundtrip_from_hd_key() {
    let mnemonic = Mnemonic::generate(&mut FixedEntropy(0), 12).unwrap();
    let account = derive_account(&mnemonic, None, DEFAULT_ETHEREUM_PATH);
    let pair = account.key_pair().unwrap();

    let keystore = Keystore::encrypt(
        &pair.secret_key,
        "integration-passphrase",
        KdfParams::Scrypt { n: 1024, r: 8, p: 1 },
    )
    .unwrap();
    assert_eq!(
        keystore.address.as_deref(),
        Some("9858effd232b4033e47d90003d41ec34ecaeda94")
    );

    let json = keystore.to_json().unwrap();
    let restored = Keystore::from_json(&json)
        .unwrap()
        .decrypt("integration-passphrase")
        .unwrap();
    let restored = Secp256k1KeyPair::from_secret_key(restored);
    assert_eq!(restored.address(), pair.address());
}

/// Errors from each stage classify through CryptoError
#[test]
fn test_error_kinds_at_boundary() {
    let bad_phrase = CryptoError::from(Mnemonic::from_phrase("abandon abandon").unwrap_err());
    assert_eq!(bad_phrase.kind(), ErrorKind::InvalidWordCount);

    let bad_path = CryptoError::from("m/44'/60'/x".parse::<DerivationPath>().unwrap_err());
    assert_eq!(bad_path.kind(), ErrorKind::InvalidPath);

    let key = ExtendedKey::master_from_seed(&[1u8; 32]).unwrap();
    let keystore = Keystore::encrypt(
        key.private_key().unwrap(),
        "pw",
        KdfParams::Pbkdf2 { c: 10 },
    )
    .unwrap();

    let wrong = CryptoError::from(keystore.decrypt("other").unwrap_err());
    assert_eq!(wrong.kind(), ErrorKind::MacMismatch);

    let tight = KdfLimits {
        max_pbkdf2_iterations: 5,
        ..KdfLimits::default()
    };
    let limited = CryptoError::from(keystore.decrypt_with_limits("pw", &tight).unwrap_err());
    assert_eq!(limited.kind(), ErrorKind::ResourceLimitExceeded);
}
