//! Result of a completed wallet workflow

use ethkey_crypto::bip32::DerivationPath;
use ethkey_crypto::{Address, ExposeSecret, Mnemonic, SecretString};

use crate::engine::Mode;

/// Everything the caller needs to show the user once
///
/// Holds the mnemonic and private key; both are wiped on drop and hidden
/// from `Debug`.
pub struct WalletReport {
    pub mode: Mode,
    pub mnemonic: Option<Mnemonic>,
    pub derivation_path: Option<DerivationPath>,
    pub address: Address,
    private_key_hex: SecretString,
    pub keystore_json: Option<String>,
}

impl WalletReport {
    pub(crate) fn new(
        mode: Mode,
        mnemonic: Option<Mnemonic>,
        derivation_path: Option<DerivationPath>,
        address: Address,
        private_key_hex: SecretString,
        keystore_json: Option<String>,
    ) -> Self {
        Self {
            mode,
            mnemonic,
            derivation_path,
            address,
            private_key_hex,
            keystore_json,
        }
    }

    /// `0x`-prefixed lowercase hex of the private key
    pub fn private_key_hex(&self) -> &str {
        self.private_key_hex.expose_secret()
    }
}

impl std::fmt::Debug for WalletReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletReport")
            .field("mode", &self.mode)
            .field("mnemonic", &self.mnemonic)
            .field(
                "derivation_path",
                &self.derivation_path.as_ref().map(ToString::to_string),
            )
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .field("keystore_json", &self.keystore_json.is_some())
            .finish()
    }
}
