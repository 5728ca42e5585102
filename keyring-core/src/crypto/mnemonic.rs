// keyring-core/src/crypto/mnemonic.rs
//
// Recovery phrase handling: master seed derivation (BIP-39 PBKDF2-HMAC-SHA512,
// empty passphrase) and an advisory BIP-39 wordlist/checksum check.

use crate::error::{KeyRingError, KeyRingResult, MnemonicError};
use bip39::Mnemonic;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of a BIP-39 seed in bytes.
pub const MASTER_SEED_LEN: usize = 64;

const PBKDF2_ROUNDS: u32 = 2048;
const SEED_SALT_PREFIX: &str = "mnemonic";

/// A recovery phrase as the user entered it.
///
/// Only surrounding whitespace is stripped; the seed is computed over the
/// exact remaining text, so phrases outside the English BIP-39 wordlist still
/// derive the same seed other BIP-39 wallets produce for them.
/// The phrase is overwritten on drop and never shows up in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MnemonicPhrase {
    phrase: String,
}

impl std::fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

impl MnemonicPhrase {
    /// Fails with `InvalidArgument` when nothing but whitespace is given
    pub fn new(text: &str) -> KeyRingResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(KeyRingError::InvalidArgument("mnemonic must not be empty".into()));
        }
        Ok(Self {
            phrase: trimmed.to_string(),
        })
    }

    /// The trimmed phrase. Handle with care: this is the wallet secret.
    #[inline]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Derive the 64-byte master seed (no BIP-39 passphrase)
    pub fn master_seed(&self) -> Zeroizing<[u8; MASTER_SEED_LEN]> {
        let mut seed = Zeroizing::new([0u8; MASTER_SEED_LEN]);
        pbkdf2_hmac::<Sha512>(
            self.phrase.as_bytes(),
            SEED_SALT_PREFIX.as_bytes(),
            PBKDF2_ROUNDS,
            seed.as_mut(),
        );
        seed
    }

    /// Check the word count, every word against the English wordlist, and
    /// the checksum.
    ///
    /// Advisory only: key rings accept phrases that fail it. Error messages
    /// carry word positions, never the words.
    pub fn check_bip39(&self) -> KeyRingResult<()> {
        let count = self.phrase.split_whitespace().count();
        if !matches!(count, 12 | 15 | 18 | 21 | 24) {
            return Err(MnemonicError::InvalidWordCount(count).into());
        }
        Mnemonic::parse(self.phrase.as_str())
            .map(|_| ())
            .map_err(map_bip39_error)
    }
}

fn map_bip39_error(err: bip39::Error) -> KeyRingError {
    let mapped = match err {
        bip39::Error::BadWordCount(count) => MnemonicError::InvalidWordCount(count),
        bip39::Error::UnknownWord(index) => MnemonicError::UnknownWord(index),
        bip39::Error::InvalidChecksum => MnemonicError::ChecksumFailed,
        other => MnemonicError::Bip39Error(other.to_string()),
    };
    KeyRingError::Mnemonic(mapped)
}
