//! Mnemonic encoding, decoding and seed derivation

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, Zeroizing};

use super::error::{MnemonicError, MnemonicResult};
use super::wordlist::ENGLISH;
use crate::entropy::{EntropyError, EntropySource, VALID_ENTROPY_LENGTHS};
use crate::hash::{pbkdf2_sha512, sha256};
use crate::secure::SecretArray;

/// Word counts accepted by BIP-39.
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// PBKDF2 iteration count for mnemonic-to-seed stretching.
pub const SEED_PBKDF2_ROUNDS: u32 = 2048;

const BITS_PER_WORD: usize = 11;

/// 64-byte BIP-39 seed, wiped on drop.
pub type Seed = SecretArray<64>;

/// A validated BIP-39 mnemonic
///
/// Holds the canonical phrase (NFKD, lowercase, single spaces) and the entropy
/// it encodes. Both are wiped on drop and neither appears in `Debug` output.
pub struct Mnemonic {
    phrase: SecretString,
    entropy: Zeroizing<Vec<u8>>,
    word_count: usize,
}

impl Mnemonic {
    /// Generate a fresh mnemonic with `word_count` words.
    ///
    /// # Errors
    ///
    /// `InvalidWordCount` for an unsupported count, or `Entropy` when the
    /// source cannot be read.
    pub fn generate<E: EntropySource + ?Sized>(
        source: &mut E,
        word_count: usize,
    ) -> MnemonicResult<Self> {
        let entropy_bytes = word_count_to_entropy_bytes(word_count)?;
        let entropy = source.generate(entropy_bytes)?;
        Self::from_entropy(&entropy)
    }

    /// Encode entropy as a mnemonic.
    ///
    /// The checksum is the first `len * 8 / 32` bits of SHA-256(entropy),
    /// appended to the entropy bits before splitting into 11-bit word indices.
    pub fn from_entropy(entropy: &[u8]) -> MnemonicResult<Self> {
        if !VALID_ENTROPY_LENGTHS.contains(&entropy.len()) {
            return Err(EntropyError::InvalidLength(entropy.len()).into());
        }

        let checksum_bits = entropy.len() * 8 / 32;
        let word_count = (entropy.len() * 8 + checksum_bits) / BITS_PER_WORD;

        // At most 8 checksum bits, so one hash byte is enough
        let mut bits = Zeroizing::new(Vec::with_capacity(entropy.len() + 1));
        bits.extend_from_slice(entropy);
        bits.push(sha256(entropy)[0]);

        let mut phrase = String::with_capacity(word_count * 9);
        for word in 0..word_count {
            let mut index = 0usize;
            for bit in 0..BITS_PER_WORD {
                let pos = word * BITS_PER_WORD + bit;
                index = (index << 1) | usize::from((bits[pos / 8] >> (7 - pos % 8)) & 1);
            }
            if word > 0 {
                phrase.push(' ');
            }
            phrase.push_str(ENGLISH[index]);
        }

        debug!(word_count, "Encoded mnemonic from entropy");

        Ok(Self {
            phrase: phrase.into(),
            entropy: Zeroizing::new(entropy.to_vec()),
            word_count,
        })
    }

    /// Parse and validate a user-supplied phrase.
    ///
    /// Leading, trailing and repeated whitespace is ignored and words are
    /// matched case-insensitively after NFKD normalization.
    pub fn from_phrase(phrase: &str) -> MnemonicResult<Self> {
        let words = normalize(phrase);
        let entropy = decode_words(&words)?;
        let canonical: String = words.split_whitespace().collect::<Vec<_>>().join(" ");
        let word_count = canonical.split(' ').count();

        Ok(Self {
            phrase: canonical.into(),
            entropy,
            word_count,
        })
    }

    /// Check a phrase without keeping it.
    pub fn validate(phrase: &str) -> MnemonicResult<()> {
        decode(phrase).map(|_| ())
    }

    /// The canonical phrase.
    ///
    /// # Security
    ///
    /// Only expose this for the one-time backup display.
    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Words of the phrase in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase().split(' ')
    }

    /// The entropy this phrase encodes.
    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    /// Derive the 64-byte seed.
    ///
    /// PBKDF2-HMAC-SHA512 over the NFKD phrase, salted with `"mnemonic"` plus
    /// the NFKD passphrase, 2048 rounds. `None` is the empty passphrase.
    pub fn to_seed(&self, passphrase: Option<&str>) -> Seed {
        let password = Zeroizing::new(self.phrase().nfkd().collect::<String>());
        let mut salt = Zeroizing::new(String::from("mnemonic"));
        salt.extend(passphrase.unwrap_or("").nfkd());

        let mut seed = [0u8; 64];
        pbkdf2_sha512(
            password.as_bytes(),
            salt.as_bytes(),
            SEED_PBKDF2_ROUNDS,
            &mut seed,
        );
        let out = SecretArray::new(seed);
        seed.zeroize();
        out
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

/// Encode entropy to a mnemonic. Same as [`Mnemonic::from_entropy`].
pub fn encode(entropy: &[u8]) -> MnemonicResult<Mnemonic> {
    Mnemonic::from_entropy(entropy)
}

/// Decode a phrase back to the entropy it carries.
///
/// # Errors
///
/// - `UnknownWord` for the first word not in the list
/// - `InvalidWordCount` if the phrase does not have 12, 15, 18, 21 or 24 words
/// - `InvalidChecksum` if the trailing checksum bits do not match
pub fn decode(phrase: &str) -> MnemonicResult<Zeroizing<Vec<u8>>> {
    decode_words(&normalize(phrase))
}

/// Convert word count to entropy bytes
pub fn word_count_to_entropy_bytes(word_count: usize) -> MnemonicResult<usize> {
    match word_count {
        12 => Ok(16),
        15 => Ok(20),
        18 => Ok(24),
        21 => Ok(28),
        24 => Ok(32),
        _ => Err(MnemonicError::InvalidWordCount(word_count)),
    }
}

fn normalize(phrase: &str) -> Zeroizing<String> {
    let decomposed = Zeroizing::new(phrase.nfkd().collect::<String>());
    Zeroizing::new(decomposed.to_lowercase())
}

fn word_index(word: &str) -> Option<usize> {
    ENGLISH.binary_search(&word).ok()
}

fn decode_words(normalized: &str) -> MnemonicResult<Zeroizing<Vec<u8>>> {
    let mut indices = Zeroizing::new(Vec::with_capacity(24));
    for (i, word) in normalized.split_whitespace().enumerate() {
        let index = word_index(word).ok_or(MnemonicError::UnknownWord { position: i + 1 })?;
        indices.push(index);
    }

    let word_count = indices.len();
    if !VALID_WORD_COUNTS.contains(&word_count) {
        return Err(MnemonicError::InvalidWordCount(word_count));
    }

    let total_bits = word_count * BITS_PER_WORD;
    let checksum_bits = total_bits / 33;
    let entropy_len = (total_bits - checksum_bits) / 8;

    let mut bits = Zeroizing::new(vec![0u8; total_bits.div_ceil(8)]);
    for (word, index) in indices.iter().enumerate() {
        for bit in 0..BITS_PER_WORD {
            if (index >> (BITS_PER_WORD - 1 - bit)) & 1 == 1 {
                let pos = word * BITS_PER_WORD + bit;
                bits[pos / 8] |= 1 << (7 - pos % 8);
            }
        }
    }

    let entropy = Zeroizing::new(bits[..entropy_len].to_vec());
    let expected = sha256(&entropy)[0] >> (8 - checksum_bits);
    let actual = bits[entropy_len] >> (8 - checksum_bits);
    if expected != actual {
        return Err(MnemonicError::InvalidChecksum);
    }

    Ok(entropy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const LEGAL_WINNER: &str =
        "legal winner thank year wave sausage worth useful legal winner thank yellow";

    struct FixedEntropy(u8);

    impl EntropySource for FixedEntropy {
        fn try_fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
            dest.fill(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_wordlist_sorted_and_unique() {
        assert_eq!(ENGLISH.len(), 2048);
        assert!(ENGLISH.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(word_index("abandon"), Some(0));
        assert_eq!(word_index("zoo"), Some(2047));
    }

    #[test]
    fn test_encode_zero_entropy_16() {
        let mnemonic = encode(&[0u8; 16]).unwrap();
        assert_eq!(mnemonic.phrase(), ABANDON_ABOUT);
        assert_eq!(mnemonic.word_count(), 12);
    }

    #[test]
    fn test_encode_zero_entropy_32() {
        let mnemonic = encode(&[0u8; 32]).unwrap();
        let mut expected = vec!["abandon"; 23];
        expected.push("art");
        assert_eq!(mnemonic.phrase(), expected.join(" "));
    }

    #[test]
    fn test_encode_7f_entropy() {
        let mnemonic = encode(&[0x7f; 16]).unwrap();
        assert_eq!(mnemonic.phrase(), LEGAL_WINNER);
    }

    #[test]
    fn test_encode_ff_entropy_32() {
        let mnemonic = encode(&[0xff; 32]).unwrap();
        let mut expected = vec!["zoo"; 23];
        expected.push("vote");
        assert_eq!(mnemonic.phrase(), expected.join(" "));
    }

    #[test]
    fn test_word_count_per_entropy_length() {
        for (len, words) in VALID_ENTROPY_LENGTHS.iter().zip(VALID_WORD_COUNTS) {
            let mnemonic = encode(&vec![0x5a; *len]).unwrap();
            assert_eq!(mnemonic.word_count(), words);
            assert_eq!(mnemonic.words().count(), words);
        }
    }

    #[test]
    fn test_encode_rejects_bad_length() {
        let result = encode(&[0u8; 17]);
        assert!(matches!(
            result,
            Err(MnemonicError::Entropy(EntropyError::InvalidLength(17)))
        ));
    }

    #[test]
    fn test_decode_roundtrip_vectors() {
        assert_eq!(*decode(ABANDON_ABOUT).unwrap(), vec![0u8; 16]);
        assert_eq!(*decode(LEGAL_WINNER).unwrap(), vec![0x7f; 16]);
    }

    #[test]
    fn test_decode_unknown_word() {
        let phrase = ABANDON_ABOUT.replacen("abandon", "abandonn", 1);
        assert!(matches!(
            decode(&phrase),
            Err(MnemonicError::UnknownWord { position: 1 })
        ));

        let phrase = ABANDON_ABOUT.replace("about", "bitcoin");
        assert!(matches!(
            decode(&phrase),
            Err(MnemonicError::UnknownWord { position: 12 })
        ));
    }

    #[test]
    fn test_decode_invalid_word_count() {
        let eleven = vec!["abandon"; 11].join(" ");
        assert!(matches!(
            decode(&eleven),
            Err(MnemonicError::InvalidWordCount(11))
        ));

        let thirteen = format!("{} abandon", ABANDON_ABOUT);
        assert!(matches!(
            decode(&thirteen),
            Err(MnemonicError::InvalidWordCount(13))
        ));

        assert!(matches!(decode(""), Err(MnemonicError::InvalidWordCount(0))));
    }

    #[test]
    fn test_decode_invalid_checksum() {
        let phrase = vec!["abandon"; 12].join(" ");
        assert!(matches!(
            decode(&phrase),
            Err(MnemonicError::InvalidChecksum)
        ));
    }

    #[test]
    fn test_from_phrase_normalizes_input() {
        let messy = "  ABANDON abandon\tAbandon abandon abandon abandon abandon abandon abandon abandon  abandon about\n";
        let mnemonic = Mnemonic::from_phrase(messy).unwrap();
        assert_eq!(mnemonic.phrase(), ABANDON_ABOUT);
        assert_eq!(mnemonic.word_count(), 12);
        assert_eq!(mnemonic.entropy(), &[0u8; 16]);
    }

    #[test]
    fn test_seed_vector_no_passphrase() {
        let mnemonic = Mnemonic::from_phrase(ABANDON_ABOUT).unwrap();
        assert_eq!(
            hex::encode(mnemonic.to_seed(None).expose_secret()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_seed_vector_trezor() {
        let mnemonic = Mnemonic::from_phrase(ABANDON_ABOUT).unwrap();
        assert_eq!(
            hex::encode(mnemonic.to_seed(Some("TREZOR")).expose_secret()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e5349553\
             1f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );

        let mnemonic = Mnemonic::from_phrase(LEGAL_WINNER).unwrap();
        assert_eq!(
            hex::encode(mnemonic.to_seed(Some("TREZOR")).expose_secret()),
            "2e8905819b8723fe2c1d161860e5ee1830318dbf49a83bd451cfb8440c28bd6f\
             a457fe1296106559a3c80937a1c1069be3a3a5bd381ee6260e8d9739fce1f607"
        );
    }

    #[test]
    fn test_seed_passphrase_is_nfkd_normalized() {
        let mnemonic = Mnemonic::from_phrase(ABANDON_ABOUT).unwrap();
        // Fullwidth letters decompose to ASCII under NFKD
        let fullwidth = mnemonic.to_seed(Some("\u{ff34}\u{ff32}\u{ff25}\u{ff3a}\u{ff2f}\u{ff32}"));
        let ascii = mnemonic.to_seed(Some("TREZOR"));
        assert_eq!(fullwidth.expose_secret(), ascii.expose_secret());
    }

    #[test]
    fn test_empty_passphrase_equals_none() {
        let mnemonic = Mnemonic::from_phrase(ABANDON_ABOUT).unwrap();
        assert_eq!(
            mnemonic.to_seed(None).expose_secret(),
            mnemonic.to_seed(Some("")).expose_secret()
        );
    }

    #[test]
    fn test_generate_with_source() {
        let mnemonic = Mnemonic::generate(&mut FixedEntropy(0x7f), 12).unwrap();
        assert_eq!(mnemonic.phrase(), LEGAL_WINNER);

        let mnemonic = Mnemonic::generate(&mut FixedEntropy(0x00), 24).unwrap();
        assert_eq!(mnemonic.word_count(), 24);
    }

    #[test]
    fn test_generate_invalid_word_count() {
        let result = Mnemonic::generate(&mut FixedEntropy(0), 13);
        assert!(matches!(result, Err(MnemonicError::InvalidWordCount(13))));
    }

    #[test]
    fn test_validate() {
        assert!(Mnemonic::validate(ABANDON_ABOUT).is_ok());
        assert!(Mnemonic::validate("not a valid mnemonic").is_err());
    }

    #[test]
    fn test_debug_output_redacted() {
        let mnemonic = Mnemonic::from_phrase(ABANDON_ABOUT).unwrap();
        let debug = format!("{:?}", mnemonic);

        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("word_count"));
        assert!(!debug.contains("abandon"));
    }
}
