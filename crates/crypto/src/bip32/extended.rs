//! Extended keys and child key derivation

use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::error::{DerivationError, DerivationResult};
use super::path::{ChildNumber, DerivationPath};
use crate::address::Address;
use crate::hash::{hash160, hmac_sha512};
use crate::secp256k1::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1SecretKey};

/// HMAC key for master key generation
pub const MASTER_KEY_SALT: &[u8] = b"Bitcoin seed";

const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// A BIP-32 extended key
///
/// Private extended keys can derive any child. Public-only keys, produced by
/// [`ExtendedKey::neuter`], can derive normal children only.
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: Option<Secp256k1SecretKey>,
    public_key: Secp256k1PublicKey,
    chain_code: Zeroizing<[u8; 32]>,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
}

impl ExtendedKey {
    /// Master key from a BIP-39 (or raw) seed
    ///
    /// # Errors
    ///
    /// `InvalidSeedLength` outside 16..=64 bytes; `InvalidMasterKey` when the
    /// left half of the HMAC output is zero or not below the curve order.
    pub fn master_from_seed(seed: &[u8]) -> DerivationResult<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }

        let i = Zeroizing::new(hmac_sha512(MASTER_KEY_SALT, &[seed]));
        let key = Self::master_from_digest(&i)?;

        debug!(fingerprint = %hex::encode(key.fingerprint()), "Derived master key");
        Ok(key)
    }

    fn master_from_digest(i: &[u8; 64]) -> DerivationResult<Self> {
        let (il, ir) = i.split_at(32);
        let secret =
            Secp256k1SecretKey::from_slice(il).map_err(|_| DerivationError::InvalidMasterKey)?;

        Ok(Self {
            public_key: secret.public_key(),
            private_key: Some(secret),
            chain_code: chain_code_from(ir),
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: ChildNumber::Normal(0),
        })
    }

    /// Derive one child
    ///
    /// Hardened: HMAC-SHA512(chain, 0x00 ‖ k ‖ i). Normal:
    /// HMAC-SHA512(chain, compressed(K) ‖ i). The child secret is
    /// (IL + k) mod n.
    ///
    /// # Errors
    ///
    /// `InvalidChildKey` when IL ≥ n or the child is zero (or the point at
    /// infinity for public derivation). `HardenedFromPublic` when asked for a
    /// hardened child of a public-only key.
    pub fn derive_child(&self, child: ChildNumber) -> DerivationResult<Self> {
        let depth = self
            .depth
            .checked_add(1)
            .ok_or(DerivationError::MaxDepthExceeded)?;
        let index = child.index();
        let index_bytes = index.to_be_bytes();
        let invalid = DerivationError::InvalidChildKey { index };

        let (private_key, public_key, chain_code) = match &self.private_key {
            Some(secret) => {
                let i = if child.is_hardened() {
                    let secret_bytes = secret.to_bytes();
                    Zeroizing::new(hmac_sha512(
                        &*self.chain_code,
                        &[&[0u8][..], &secret_bytes[..], &index_bytes[..]],
                    ))
                } else {
                    Zeroizing::new(hmac_sha512(
                        &*self.chain_code,
                        &[&self.public_key.to_bytes()[..], &index_bytes[..]],
                    ))
                };
                let (il, ir) = i.split_at(32);
                let child_secret = tweak_secret(secret, il).ok_or(invalid)?;
                let child_public = child_secret.public_key();
                (Some(child_secret), child_public, chain_code_from(ir))
            }
            None => {
                if child.is_hardened() {
                    return Err(DerivationError::HardenedFromPublic { index });
                }
                let i = Zeroizing::new(hmac_sha512(
                    &*self.chain_code,
                    &[&self.public_key.to_bytes()[..], &index_bytes[..]],
                ));
                let (il, ir) = i.split_at(32);
                let child_public = tweak_public(&self.public_key, il).ok_or(invalid)?;
                (None, child_public, chain_code_from(ir))
            }
        };

        trace!(depth, child = %child, "Derived child key");

        Ok(Self {
            private_key,
            public_key,
            chain_code,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_number: child,
        })
    }

    /// Walk `path` from this key. An empty path returns a copy of `self`.
    pub fn derive_path(&self, path: &DerivationPath) -> DerivationResult<Self> {
        let key = path
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(*child))?;
        debug!(path = %path, depth = key.depth, "Derived key for path");
        Ok(key)
    }

    /// Public-only copy of this key
    pub fn neuter(&self) -> Self {
        Self {
            private_key: None,
            public_key: self.public_key.clone(),
            chain_code: self.chain_code.clone(),
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
        }
    }

    /// First four bytes of Hash160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        let id = hash160(&self.public_key.to_bytes());
        [id[0], id[1], id[2], id[3]]
    }

    pub fn private_key(&self) -> Option<&Secp256k1SecretKey> {
        self.private_key.as_ref()
    }

    pub fn public_key(&self) -> &Secp256k1PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    /// Serialized child index (hardened offset applied)
    pub fn child_index(&self) -> u32 {
        self.child_number.index()
    }

    /// Whether this key carries a private scalar
    pub fn is_private(&self) -> bool {
        self.private_key.is_some()
    }

    /// Key pair for signing; `None` for public-only keys
    pub fn key_pair(&self) -> Option<Secp256k1KeyPair> {
        self.private_key
            .clone()
            .map(Secp256k1KeyPair::from_secret_key)
    }

    /// Ethereum address of this key's public point
    pub fn address(&self) -> Address {
        self.public_key.address()
    }
}

fn chain_code_from(ir: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut chain_code = Zeroizing::new([0u8; 32]);
    chain_code.copy_from_slice(ir);
    chain_code
}

/// IL as a scalar, or `None` when IL ≥ n
fn parse_tweak(il: &[u8]) -> Option<Scalar> {
    Scalar::from_repr(FieldBytes::clone_from_slice(il)).into()
}

/// (IL + k) mod n, or `None` if IL ≥ n or the sum is zero
fn tweak_secret(parent: &Secp256k1SecretKey, il: &[u8]) -> Option<Secp256k1SecretKey> {
    let tweak = parse_tweak(il)?;
    let sum = tweak + *parent.inner().to_nonzero_scalar();
    let child: Option<NonZeroScalar> = NonZeroScalar::new(sum).into();
    child.map(|scalar| Secp256k1SecretKey::from_inner(k256::SecretKey::from(scalar)))
}

/// IL·G + K, or `None` if IL ≥ n or the sum is the point at infinity
fn tweak_public(parent: &Secp256k1PublicKey, il: &[u8]) -> Option<Secp256k1PublicKey> {
    let tweak = parse_tweak(il)?;
    let point = ProjectivePoint::GENERATOR * tweak + parent.inner().to_projective();
    k256::PublicKey::from_affine(AffinePoint::from(point))
        .ok()
        .map(Secp256k1PublicKey::from_inner)
}

impl PartialEq for ExtendedKey {
    fn eq(&self, other: &Self) -> bool {
        let private_eq = match (&self.private_key, &other.private_key) {
            (Some(a), Some(b)) => bool::from(a.to_bytes()[..].ct_eq(&b.to_bytes()[..])),
            (None, None) => true,
            _ => false,
        };
        private_eq
            && self.public_key == other.public_key
            && bool::from(self.chain_code[..].ct_eq(&other.chain_code[..]))
            && self.depth == other.depth
            && self.parent_fingerprint == other.parent_fingerprint
            && self.child_number == other.child_number
    }
}

impl Eq for ExtendedKey {}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}
