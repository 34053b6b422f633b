//! Derivation path parsing and formatting

use std::fmt;
use std::str::FromStr;

use super::error::{DerivationError, DerivationResult};

/// Indices at or above this value are hardened
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// SLIP-44 coin type for Ether
pub const ETHEREUM_COIN_TYPE: u32 = 60;

/// First account, first external address: `m/44'/60'/0'/0/0`
pub const DEFAULT_ETHEREUM_PATH: &str = "m/44'/60'/0'/0/0";

/// One step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildNumber {
    /// Derived from the parent public key; index below 2^31
    Normal(u32),
    /// Derived from the parent private key; stored without the offset
    Hardened(u32),
}

impl ChildNumber {
    /// Normal child `index` (< 2^31)
    pub fn normal(index: u32) -> DerivationResult<Self> {
        if index >= HARDENED_OFFSET {
            return Err(DerivationError::InvalidPath(format!(
                "index {} out of range",
                index
            )));
        }
        Ok(Self::Normal(index))
    }

    /// Hardened child `index'` (index < 2^31)
    pub fn hardened(index: u32) -> DerivationResult<Self> {
        if index >= HARDENED_OFFSET {
            return Err(DerivationError::InvalidPath(format!(
                "index {} out of range",
                index
            )));
        }
        Ok(Self::Hardened(index))
    }

    /// Decode a serialized 32-bit index
    pub fn from_index(raw: u32) -> Self {
        if raw >= HARDENED_OFFSET {
            Self::Hardened(raw - HARDENED_OFFSET)
        } else {
            Self::Normal(raw)
        }
    }

    /// The serialized 32-bit index (hardened offset applied)
    pub fn index(&self) -> u32 {
        match self {
            Self::Normal(i) => *i,
            Self::Hardened(i) => i | HARDENED_OFFSET,
        }
    }

    /// Whether the hardened offset is applied
    pub fn is_hardened(&self) -> bool {
        matches!(self, Self::Hardened(_))
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(i) => write!(f, "{}", i),
            Self::Hardened(i) => write!(f, "{}'", i),
        }
    }
}

/// Sequence of child numbers from the master key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The empty path, `m`
    pub fn master() -> Self {
        Self::default()
    }

    /// Components in derivation order
    pub fn components(&self) -> &[ChildNumber] {
        &self.0
    }

    /// True for `m`
    pub fn is_master(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by one step
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut components = self.0.clone();
        components.push(child);
        Self(components)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChildNumber> {
        self.0.iter()
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(components: Vec<ChildNumber>) -> Self {
        Self(components)
    }
}

/// BIP-44 Ethereum path `m/44'/60'/{account}'/0/{index}`
pub fn ethereum_path(account: u32, index: u32) -> DerivationResult<DerivationPath> {
    Ok(DerivationPath(vec![
        ChildNumber::hardened(44)?,
        ChildNumber::hardened(ETHEREUM_COIN_TYPE)?,
        ChildNumber::hardened(account)?,
        ChildNumber::normal(0)?,
        ChildNumber::normal(index)?,
    ]))
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    /// Parses paths like `m/44'/60'/0'/0/0`. Hardened steps may use `'`, `h`
    /// or `H`.
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let path = path.trim();
        let mut parts = path.split('/');

        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(DerivationError::InvalidPath(
                    "path must start with 'm'".to_string(),
                ))
            }
        }

        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                Some(digits) => (digits, true),
                None => (part, false),
            };

            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DerivationError::InvalidPath(format!(
                    "invalid path component: {:?}",
                    part
                )));
            }

            let index: u32 = digits.parse().map_err(|_| {
                DerivationError::InvalidPath(format!("index out of range: {}", part))
            })?;

            let child = if hardened {
                ChildNumber::hardened(index)?
            } else {
                ChildNumber::normal(index)?
            };
            components.push(child);
        }

        Ok(Self(components))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ethereum_path() {
        let path: DerivationPath = DEFAULT_ETHEREUM_PATH.parse().unwrap();
        assert_eq!(
            path.components(),
            &[
                ChildNumber::Hardened(44),
                ChildNumber::Hardened(60),
                ChildNumber::Hardened(0),
                ChildNumber::Normal(0),
                ChildNumber::Normal(0),
            ]
        );
        assert_eq!(path, ethereum_path(0, 0).unwrap());
    }

    #[test]
    fn test_parse_master() {
        let path: DerivationPath = "m".parse().unwrap();
        assert!(path.is_master());
        assert_eq!(path.to_string(), "m");
    }

    #[test]
    fn test_alternate_hardened_markers() {
        let a: DerivationPath = "m/44h/60H/0'".parse().unwrap();
        let b: DerivationPath = "m/44'/60'/0'".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "m/44'/60'/0'");
    }

    #[test]
    fn test_display_roundtrip() {
        let text = "m/0'/1/2'/2/1000000000";
        let path: DerivationPath = text.parse().unwrap();
        assert_eq!(path.to_string(), text);
    }

    #[test]
    fn test_invalid_paths() {
        for bad in [
            "",
            "44'/60'",
            "n/0",
            "m/",
            "m//0",
            "m/abc",
            "m/-1",
            "m/+1",
            "m/0''",
            "m/ 1",
            "m/2147483648",
            "m/2147483648'",
            "m/4294967296",
            "mm/0",
        ] {
            assert!(
                matches!(
                    bad.parse::<DerivationPath>(),
                    Err(DerivationError::InvalidPath(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_max_index() {
        let path: DerivationPath = "m/2147483647'/2147483647".parse().unwrap();
        assert_eq!(path.components()[0].index(), u32::MAX);
        assert_eq!(path.components()[1].index(), HARDENED_OFFSET - 1);
    }

    #[test]
    fn test_child_number_from_index() {
        assert_eq!(ChildNumber::from_index(5), ChildNumber::Normal(5));
        assert_eq!(
            ChildNumber::from_index(HARDENED_OFFSET + 5),
            ChildNumber::Hardened(5)
        );
        assert!(ChildNumber::Hardened(0).is_hardened());
        assert!(!ChildNumber::Normal(0).is_hardened());
    }

    #[test]
    fn test_ethereum_path_helper() {
        let path = ethereum_path(3, 7).unwrap();
        assert_eq!(path.to_string(), "m/44'/60'/3'/0/7");
        assert!(ethereum_path(HARDENED_OFFSET, 0).is_err());
    }

    #[test]
    fn test_child_extends_path() {
        let path = DerivationPath::master().child(ChildNumber::Hardened(44));
        assert_eq!(path.to_string(), "m/44'");
    }
}
