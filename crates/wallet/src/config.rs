//! Wallet configuration
//!
//! Loaded from a TOML file (`--config` or `ETHKEY_CONFIG`), with a couple of
//! single-field overrides from the environment. Every field has a default so
//! an empty file, or no file at all, is a valid configuration.

use std::path::{Path, PathBuf};

use ethkey_crypto::bip32::DerivationPath;
use ethkey_crypto::keystore::{KdfLimits, KdfParams};
use ethkey_crypto::mnemonic::VALID_WORD_COUNTS;
use ethkey_crypto::DEFAULT_ETHEREUM_PATH;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::engine::Mode;

/// Environment variable naming the configuration file
pub const ETHKEY_CONFIG_ENV: &str = "ETHKEY_CONFIG";

/// Environment override for `derivation_path`
pub const ETHKEY_DERIVATION_PATH_ENV: &str = "ETHKEY_DERIVATION_PATH";

/// Environment override for `word_count`
pub const ETHKEY_WORD_COUNT_ENV: &str = "ETHKEY_WORD_COUNT";

/// Default number of words for new mnemonics
pub const DEFAULT_WORD_COUNT: usize = 24;

/// Exit code for configuration errors (EX_CONFIG from sysexits.h)
pub const EXIT_CONFIG_ERROR: i32 = 78;

/// Errors while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} in {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Wallet workflow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Skip the mode question and run this mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Words in a newly generated mnemonic
    pub word_count: usize,

    /// HD path for mnemonic modes
    pub derivation_path: String,

    /// Ask for a BIP-39 passphrase before deriving the seed
    pub bip39_passphrase: bool,

    /// Offer to export an encrypted keystore
    pub export_keystore: bool,

    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,

    pub log_format: LogFormat,

    /// KDF for exported keystores
    pub kdf: KdfParams,

    /// Ceilings for KDFs read from keystore files
    pub limits: KdfLimits,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            mode: None,
            word_count: DEFAULT_WORD_COUNT,
            derivation_path: DEFAULT_ETHEREUM_PATH.to_string(),
            bip39_passphrase: false,
            export_keystore: true,
            log_level: "warn".to_string(),
            log_format: LogFormat::Plain,
            kdf: KdfParams::default(),
            limits: KdfLimits::default(),
        }
    }
}

impl WalletConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded wallet config");
        Ok(config)
    }

    /// Resolve the effective configuration
    ///
    /// Priority:
    /// 1. `path` (from `--config`)
    /// 2. `ETHKEY_CONFIG`
    /// 3. Built-in defaults
    ///
    /// Environment overrides are applied on top and the result is validated.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(ETHKEY_CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.or(env_path.as_deref()) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply single-field overrides looked up by variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ETHKEY_DERIVATION_PATH_ENV) {
            debug!(path = %path, "Derivation path overridden from environment");
            self.derivation_path = path;
        }
        if let Some(value) = lookup(ETHKEY_WORD_COUNT_ENV) {
            self.word_count = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ETHKEY_WORD_COUNT_ENV,
                value,
            })?;
        }
        Ok(())
    }

    /// Check everything that would otherwise fail halfway through a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_WORD_COUNTS.contains(&self.word_count) {
            return Err(ConfigError::Invalid(format!(
                "word_count must be one of 12, 15, 18, 21 or 24, got {}",
                self.word_count
            )));
        }
        self.derivation_path()?;
        self.kdf
            .validate(&self.limits)
            .map_err(|e| ConfigError::Invalid(format!("kdf: {e}")))?;
        Ok(())
    }

    /// Parsed `derivation_path`
    pub fn derivation_path(&self) -> Result<DerivationPath, ConfigError> {
        self.derivation_path
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("derivation_path: {e}")))
    }
}
