//! Key derivation for keystore passphrases
//!
//! Two functions are supported: scrypt and PBKDF2-HMAC-SHA256. Parameters
//! read from a record are checked twice before any hashing: structurally
//! (power-of-two N, dklen range, hex salt) and against [`KdfLimits`], so a
//! hostile file cannot make us allocate gigabytes or spin for hours.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{KeystoreError, KeystoreResult};
use crate::hash::pbkdf2_sha256;
use crate::secure::SecretBytes;

/// Standard scrypt parameters, matching geth's "standard" profile
pub const SCRYPT_N: u64 = 1 << 18;
pub const SCRYPT_R: u32 = 8;
pub const SCRYPT_P: u32 = 1;

/// Default PBKDF2 iteration count
pub const PBKDF2_C: u32 = 262_144;

/// The only PRF accepted for PBKDF2
pub const PBKDF2_PRF: &str = "hmac-sha256";

/// Derived key length written by encryption
pub const DKLEN: u32 = 32;

const MIN_DKLEN: u32 = 32;
const MAX_DKLEN: u32 = 64;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 32;

/// Default ceiling on scrypt memory, 512 MiB
pub const DEFAULT_MAX_SCRYPT_MEMORY_BYTES: u64 = 512 * 1024 * 1024;

/// Default ceiling on PBKDF2 iterations
pub const DEFAULT_MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

pub(crate) const SCRYPT_NAME: &str = "scrypt";
pub(crate) const PBKDF2_NAME: &str = "pbkdf2";

/// KDF choice and cost for new keystores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum KdfParams {
    Scrypt { n: u64, r: u32, p: u32 },
    Pbkdf2 { c: u32 },
}

impl KdfParams {
    /// geth's standard scrypt cost
    pub const fn scrypt_default() -> Self {
        Self::Scrypt {
            n: SCRYPT_N,
            r: SCRYPT_R,
            p: SCRYPT_P,
        }
    }

    pub const fn pbkdf2_default() -> Self {
        Self::Pbkdf2 { c: PBKDF2_C }
    }

    /// Name written to the record's `kdf` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scrypt { .. } => SCRYPT_NAME,
            Self::Pbkdf2 { .. } => PBKDF2_NAME,
        }
    }

    /// Resource ceilings first, then structural checks
    pub fn validate(&self, limits: &KdfLimits) -> KeystoreResult<()> {
        match *self {
            Self::Scrypt { n, r, p } => {
                limits.check_scrypt(n, u64::from(r), u64::from(p))?;
                validate_scrypt_shape(n, r, p)
            }
            Self::Pbkdf2 { c } => {
                limits.check_pbkdf2(u64::from(c))?;
                if c == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "c must be positive".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::scrypt_default()
    }
}

/// Ceilings applied before running a KDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfLimits {
    /// Largest accepted scrypt memory estimate, 128·r·(N+p) bytes
    pub max_scrypt_memory_bytes: u64,
    /// Largest accepted PBKDF2 `c`
    pub max_pbkdf2_iterations: u32,
}

impl Default for KdfLimits {
    fn default() -> Self {
        Self {
            max_scrypt_memory_bytes: DEFAULT_MAX_SCRYPT_MEMORY_BYTES,
            max_pbkdf2_iterations: DEFAULT_MAX_PBKDF2_ITERATIONS,
        }
    }
}

impl KdfLimits {
    /// Takes raw record values so oversized fields still count as too expensive
    pub fn check_scrypt(&self, n: u64, r: u64, p: u64) -> KeystoreResult<()> {
        let required = scrypt_memory_estimate(n, r, p);
        if required > self.max_scrypt_memory_bytes {
            return Err(KeystoreError::ResourceLimitExceeded {
                resource: "scrypt memory (bytes)",
                required,
                limit: self.max_scrypt_memory_bytes,
            });
        }
        Ok(())
    }

    pub fn check_pbkdf2(&self, c: u64) -> KeystoreResult<()> {
        if c > u64::from(self.max_pbkdf2_iterations) {
            return Err(KeystoreError::ResourceLimitExceeded {
                resource: "pbkdf2 iterations",
                required: c,
                limit: u64::from(self.max_pbkdf2_iterations),
            });
        }
        Ok(())
    }
}

/// scrypt working-set estimate: 128·r·(N+p) bytes, saturating
pub fn scrypt_memory_estimate(n: u64, r: u64, p: u64) -> u64 {
    128u64.saturating_mul(r).saturating_mul(n.saturating_add(p))
}

fn validate_scrypt_shape(n: u64, r: u32, p: u32) -> KeystoreResult<()> {
    if n <= 1 || !n.is_power_of_two() {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "n must be a power of two greater than 1, got {n}"
        )));
    }
    if r == 0 || p == 0 {
        return Err(KeystoreError::InvalidKdfParams(
            "r and p must be positive".to_string(),
        ));
    }
    // scrypt requires log2(N) < 16·r
    if u64::from(n.trailing_zeros()) >= 16 * u64::from(r) {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "n = 2^{} is too large for r = {r}",
            n.trailing_zeros()
        )));
    }
    Ok(())
}

/// `kdfparams` for scrypt as stored in a record
///
/// Cost fields are read wide so the resource check sees the value the file
/// asked for; they are narrowed only after it passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    pub dklen: u32,
    pub n: u64,
    pub p: u64,
    pub r: u64,
    pub salt: String,
}

/// `kdfparams` for PBKDF2 as stored in a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pbkdf2Params {
    pub c: u64,
    pub dklen: u32,
    pub prf: String,
    pub salt: String,
}

/// Typed view of a record's `kdf` and `kdfparams` fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfRecord {
    Scrypt(ScryptParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfRecord {
    /// Record fields for fresh encryption with `params` and `salt`
    pub fn new(params: KdfParams, salt: &[u8]) -> Self {
        let salt = hex::encode(salt);
        match params {
            KdfParams::Scrypt { n, r, p } => Self::Scrypt(ScryptParams {
                dklen: DKLEN,
                n,
                p: u64::from(p),
                r: u64::from(r),
                salt,
            }),
            KdfParams::Pbkdf2 { c } => Self::Pbkdf2(Pbkdf2Params {
                c: u64::from(c),
                dklen: DKLEN,
                prf: PBKDF2_PRF.to_string(),
                salt,
            }),
        }
    }

    /// Interpret raw `kdfparams` once the `kdf` name is known
    pub fn from_parts(name: &str, params: &serde_json::Value) -> KeystoreResult<Self> {
        let record = match name {
            SCRYPT_NAME => Self::Scrypt(parse_params(params)?),
            PBKDF2_NAME => Self::Pbkdf2(parse_params(params)?),
            other => {
                return Err(KeystoreError::UnsupportedAlgorithm {
                    kind: "kdf",
                    name: other.to_string(),
                })
            }
        };
        Ok(record)
    }

    /// The `kdf` name and `kdfparams` object for serialization
    pub fn to_parts(&self) -> KeystoreResult<(&'static str, serde_json::Value)> {
        let value = match self {
            Self::Scrypt(params) => serde_json::to_value(params)?,
            Self::Pbkdf2(params) => serde_json::to_value(params)?,
        };
        Ok((self.name(), value))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scrypt(_) => SCRYPT_NAME,
            Self::Pbkdf2(_) => PBKDF2_NAME,
        }
    }

    fn dklen(&self) -> u32 {
        match self {
            Self::Scrypt(params) => params.dklen,
            Self::Pbkdf2(params) => params.dklen,
        }
    }

    fn salt(&self) -> KeystoreResult<Vec<u8>> {
        let salt = match self {
            Self::Scrypt(params) => &params.salt,
            Self::Pbkdf2(params) => &params.salt,
        };
        hex::decode(salt)
            .map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {e}")))
    }

    /// Cost parameters without the salt and length
    ///
    /// Fails when `r`, `p` or `c` does not fit in 32 bits.
    pub fn cost(&self) -> KeystoreResult<KdfParams> {
        let cost = match self {
            Self::Scrypt(params) => KdfParams::Scrypt {
                n: params.n,
                r: narrow("r", params.r)?,
                p: narrow("p", params.p)?,
            },
            Self::Pbkdf2(params) => KdfParams::Pbkdf2 {
                c: narrow("c", params.c)?,
            },
        };
        Ok(cost)
    }

    /// Check the record against `limits`, then structural rules
    pub fn validate(&self, limits: &KdfLimits) -> KeystoreResult<()> {
        match self {
            Self::Scrypt(params) => limits.check_scrypt(params.n, params.r, params.p)?,
            Self::Pbkdf2(params) => limits.check_pbkdf2(params.c)?,
        }
        if let Self::Pbkdf2(params) = self {
            if params.prf != PBKDF2_PRF {
                return Err(KeystoreError::UnsupportedAlgorithm {
                    kind: "prf",
                    name: params.prf.clone(),
                });
            }
        }
        let dklen = self.dklen();
        if !(MIN_DKLEN..=MAX_DKLEN).contains(&dklen) {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "dklen must be between {MIN_DKLEN} and {MAX_DKLEN}, got {dklen}"
            )));
        }
        self.salt()?;
        self.cost()?.validate(limits)
    }

    /// Validate, then stretch `passphrase` into `dklen` bytes
    pub fn derive_key(&self, passphrase: &[u8], limits: &KdfLimits) -> KeystoreResult<SecretBytes> {
        self.validate(limits)?;
        let salt = self.salt()?;
        let mut output = vec![0u8; self.dklen() as usize];

        debug!(kdf = self.name(), dklen = output.len(), "Deriving keystore key");

        match self.cost()? {
            KdfParams::Scrypt { n, r, p } => {
                let log_n = n.trailing_zeros() as u8;
                let scrypt_params = scrypt::Params::new(log_n, r, p, output.len())
                    .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
                scrypt::scrypt(passphrase, &salt, &scrypt_params, &mut output)
                    .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;
            }
            KdfParams::Pbkdf2 { c } => pbkdf2_sha256(passphrase, &salt, c, &mut output),
        }

        Ok(SecretBytes::new(Box::new(output)))
    }
}

fn narrow(field: &str, value: u64) -> KeystoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| KeystoreError::InvalidKdfParams(format!("{field} = {value} is out of range")))
}

fn parse_params<T: serde::de::DeserializeOwned>(params: &serde_json::Value) -> KeystoreResult<T> {
    T::deserialize(params).map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))
}
