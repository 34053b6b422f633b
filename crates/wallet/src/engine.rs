//! Wallet workflow state machine
//!
//! One pass through:
//!
//! ```text
//! Start -> ConfirmedOffline -> ModeSelected(mode)
//!       -> MnemonicProduced | KeystoreDecrypted
//!       -> Derived -> Reported -> End
//! ```
//!
//! Any prompt may cancel, which moves to `Cancelled -> End`. The engine owns
//! no I/O: questions go to the [`Prompter`], randomness comes from the
//! [`EntropySource`], and the result is returned as an [`Outcome`].

use std::fmt;

use ethkey_crypto::bip32::{DerivationError, DerivationPath, ExtendedKey};
use ethkey_crypto::keystore::{Keystore, KeystoreBuilder, KeystoreError};
use ethkey_crypto::{
    CryptoError, EntropySource, ErrorKind, ExposeSecret, Mnemonic, MnemonicError,
    Secp256k1SecretKey, SecretString,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, WalletConfig};
use crate::prompt::{Cancelled, Prompter};
use crate::report::WalletReport;

pub(crate) const OFFLINE_WARNING: &str = "Please make sure you are offline before creating a \
wallet. Keys generated on a networked machine can leak before you ever use them.";
pub(crate) const OFFLINE_PROMPT: &str = "Are you offline or want to proceed anyway (yes/no)? ";
pub(crate) const MODE_PROMPT: &str = "What would you like to do?";
pub(crate) const MNEMONIC_PROMPT: &str = "Enter your mnemonic phrase: ";
pub(crate) const BIP39_PASSPHRASE_PROMPT: &str = "BIP-39 passphrase (leave empty for none): ";
pub(crate) const BIP39_PASSPHRASE_CONFIRM: &str = "Repeat BIP-39 passphrase: ";
pub(crate) const KEYSTORE_PROMPT: &str = "Path to keystore file: ";
pub(crate) const KEYSTORE_PASSPHRASE_PROMPT: &str = "Keystore passphrase: ";
pub(crate) const EXPORT_PROMPT: &str = "Export an encrypted keystore file (yes/no)? ";
pub(crate) const EXPORT_PASSPHRASE_PROMPT: &str = "New keystore passphrase: ";
pub(crate) const EXPORT_PASSPHRASE_CONFIRM: &str = "Repeat keystore passphrase: ";
pub(crate) const PASSPHRASE_MISMATCH: &str = "Passphrases do not match, try again.";

/// How the account is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Fresh mnemonic from the entropy source
    New,
    /// Restore from an existing mnemonic
    FromMnemonic,
    /// Decrypt an existing keystore; no HD derivation
    FromKeystore,
}

impl Mode {
    /// All modes, in the order offered to the user
    pub const ALL: [Mode; 3] = [Mode::New, Mode::FromMnemonic, Mode::FromKeystore];

    pub fn description(&self) -> &'static str {
        match self {
            Self::New => "Create a new wallet",
            Self::FromMnemonic => "Restore a wallet from a mnemonic phrase",
            Self::FromKeystore => "Open a keystore file",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::FromMnemonic => "from-mnemonic",
            Self::FromKeystore => "from-keystore",
        })
    }
}

/// States the engine passes through, recorded in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    ConfirmedOffline,
    ModeSelected(Mode),
    MnemonicProduced,
    KeystoreDecrypted,
    Derived,
    Reported,
    Cancelled,
    Failed,
    End,
}

/// Errors that end a workflow run
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("choice {index} is out of range for {options} options")]
    InvalidChoice { index: usize, options: usize },
}

impl WorkflowError {
    /// Crypto error classification, if this came from the core
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Crypto(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// How a run ended
#[derive(Debug)]
pub enum Outcome {
    Completed(WalletReport),
    Cancelled,
    Failed(WorkflowError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Early exit from a run
enum Interrupt {
    Cancelled,
    Failed(WorkflowError),
}

impl From<Cancelled> for Interrupt {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<WorkflowError> for Interrupt {
    fn from(e: WorkflowError) -> Self {
        Self::Failed(e)
    }
}

macro_rules! interrupt_from_crypto {
    ($($error:ty),*) => {
        $(
            impl From<$error> for Interrupt {
                fn from(e: $error) -> Self {
                    Self::Failed(WorkflowError::Crypto(e.into()))
                }
            }
        )*
    };
}

interrupt_from_crypto!(CryptoError, MnemonicError, DerivationError, KeystoreError);

/// Key material produced by the mode-specific steps
struct Account {
    mnemonic: Option<Mnemonic>,
    path: Option<DerivationPath>,
    secret_key: Secp256k1SecretKey,
}

/// Drives one wallet workflow run
pub struct WorkflowEngine<P, E> {
    config: WalletConfig,
    prompter: P,
    entropy: E,
    history: Vec<WorkflowState>,
}

impl<P: Prompter, E: EntropySource> WorkflowEngine<P, E> {
    pub fn new(config: WalletConfig, prompter: P, entropy: E) -> Self {
        Self {
            config,
            prompter,
            entropy,
            history: Vec::new(),
        }
    }

    /// States visited by the last run
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Run the workflow once from `Start`
    pub fn run(&mut self) -> Outcome {
        self.history.clear();
        let outcome = match self.run_steps() {
            Ok(report) => Outcome::Completed(report),
            Err(Interrupt::Cancelled) => {
                self.enter(WorkflowState::Cancelled);
                info!("Wallet workflow cancelled");
                Outcome::Cancelled
            }
            Err(Interrupt::Failed(error)) => {
                self.enter(WorkflowState::Failed);
                warn!(
                    error = %error,
                    kind = error.kind().map(|k| k.as_str()).unwrap_or("other"),
                    "Wallet workflow failed"
                );
                Outcome::Failed(error)
            }
        };
        self.enter(WorkflowState::End);
        outcome
    }

    fn enter(&mut self, state: WorkflowState) {
        debug!(?state, "Workflow state");
        self.history.push(state);
    }

    fn run_steps(&mut self) -> Result<WalletReport, Interrupt> {
        self.enter(WorkflowState::Start);
        self.prompter.notify(OFFLINE_WARNING);
        if !self.prompter.prompt_confirmation(OFFLINE_PROMPT)? {
            return Err(Interrupt::Cancelled);
        }
        self.enter(WorkflowState::ConfirmedOffline);

        let mode = match self.config.mode {
            Some(mode) => mode,
            None => self.select_mode()?,
        };
        self.enter(WorkflowState::ModeSelected(mode));
        info!(%mode, "Wallet workflow started");

        let account = match mode {
            Mode::New => {
                let mnemonic = Mnemonic::generate(&mut self.entropy, self.config.word_count)?;
                self.enter(WorkflowState::MnemonicProduced);
                self.derive_from_mnemonic(mnemonic, true)?
            }
            Mode::FromMnemonic => {
                let phrase = self.prompter.prompt_secret(MNEMONIC_PROMPT)?;
                let mnemonic = Mnemonic::from_phrase(phrase.expose_secret())?;
                self.enter(WorkflowState::MnemonicProduced);
                self.derive_from_mnemonic(mnemonic, false)?
            }
            Mode::FromKeystore => {
                let secret_key = self.open_keystore()?;
                self.enter(WorkflowState::KeystoreDecrypted);
                Account {
                    mnemonic: None,
                    path: None,
                    secret_key,
                }
            }
        };
        self.enter(WorkflowState::Derived);

        let address = account.secret_key.public_key().address();
        let keystore_json = if self.config.export_keystore {
            self.export_keystore(&account.secret_key)?
        } else {
            None
        };

        let private_key_hex = SecretString::from(account.secret_key.to_hex().to_string());
        let report = WalletReport::new(
            mode,
            account.mnemonic,
            account.path,
            address,
            private_key_hex,
            keystore_json,
        );
        self.enter(WorkflowState::Reported);
        info!(%mode, %address, "Wallet workflow completed");
        Ok(report)
    }

    fn select_mode(&mut self) -> Result<Mode, Interrupt> {
        let options: Vec<&str> = Mode::ALL.iter().map(Mode::description).collect();
        let index = self.prompter.prompt_choice(MODE_PROMPT, &options)?;
        Mode::ALL.get(index).copied().ok_or_else(|| {
            Interrupt::Failed(WorkflowError::InvalidChoice {
                index,
                options: options.len(),
            })
        })
    }

    /// Seed, master key and the configured path
    fn derive_from_mnemonic(
        &mut self,
        mnemonic: Mnemonic,
        confirm_passphrase: bool,
    ) -> Result<Account, Interrupt> {
        let path = self.config.derivation_path().map_err(WorkflowError::from)?;

        let passphrase = if self.config.bip39_passphrase {
            let passphrase = if confirm_passphrase {
                self.prompt_new_secret(BIP39_PASSPHRASE_PROMPT, BIP39_PASSPHRASE_CONFIRM)?
            } else {
                self.prompter.prompt_secret(BIP39_PASSPHRASE_PROMPT)?
            };
            Some(passphrase)
        } else {
            None
        };

        let seed = mnemonic.to_seed(passphrase.as_ref().map(|p| p.expose_secret()));
        let master = ExtendedKey::master_from_seed(seed.expose_secret())?;
        let account = master.derive_path(&path)?;

        let secret_key = match account.private_key() {
            Some(key) => key.clone(),
            None => return Err(DerivationError::InvalidMasterKey.into()),
        };
        debug!(%path, word_count = mnemonic.word_count(), "Derived account key");

        Ok(Account {
            mnemonic: Some(mnemonic),
            path: Some(path),
            secret_key,
        })
    }

    fn open_keystore(&mut self) -> Result<Secp256k1SecretKey, Interrupt> {
        let json = self.prompter.prompt_keystore(KEYSTORE_PROMPT)?;
        let keystore = Keystore::from_json(&json)?;
        let passphrase = self.prompter.prompt_secret(KEYSTORE_PASSPHRASE_PROMPT)?;
        let secret_key =
            keystore.decrypt_with_limits(passphrase.expose_secret(), &self.config.limits)?;
        Ok(secret_key)
    }

    fn export_keystore(
        &mut self,
        secret_key: &Secp256k1SecretKey,
    ) -> Result<Option<String>, Interrupt> {
        if !self.prompter.prompt_confirmation(EXPORT_PROMPT)? {
            debug!("Keystore export declined");
            return Ok(None);
        }

        let passphrase = self.prompt_new_secret(EXPORT_PASSPHRASE_PROMPT, EXPORT_PASSPHRASE_CONFIRM)?;
        let keystore = KeystoreBuilder::new(secret_key)
            .passphrase(passphrase.expose_secret())
            .kdf(self.config.kdf)
            .limits(self.config.limits)
            .build()?;
        Ok(Some(keystore.to_json()?))
    }

    /// Ask twice until both entries agree
    fn prompt_new_secret(&mut self, label: &str, confirm: &str) -> Result<SecretString, Interrupt> {
        loop {
            let first = self.prompter.prompt_secret(label)?;
            let second = self.prompter.prompt_secret(confirm)?;
            if first.expose_secret() == second.expose_secret() {
                return Ok(first);
            }
            self.prompter.notify(PASSPHRASE_MISMATCH);
        }
    }
}
