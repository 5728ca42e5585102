// keyring-core/src/crypto/key_deriver/mod.rs
//
// Seed → private key derivation. Only secp256k1 (BIP-32) is wired in; every
// key-ring backend signs with secp256k1.

pub mod secp256k1;

pub use secp256k1::Secp256k1Deriver;

use crate::crypto::mnemonic::MASTER_SEED_LEN;
use crate::error::{CryptoError, KeyRingResult};
use zeroize::Zeroizing;

/// Entry point used by the backends: validates the seed, then derives.
pub struct KeyDeriver;

impl KeyDeriver {
    /// Derive a secp256k1 private key
    ///
    /// # Arguments
    /// * `seed` - BIP-39 seed (64 bytes)
    /// * `path` - Derivation path (e.g. "m/44'/118'/0'/0/0")
    pub fn derive_secp256k1(seed: &[u8], path: &str) -> KeyRingResult<Zeroizing<[u8; 32]>> {
        Self::validate_seed(seed)?;
        Secp256k1Deriver::derive(seed, path)
    }

    #[inline]
    fn validate_seed(seed: &[u8]) -> KeyRingResult<()> {
        if seed.len() != MASTER_SEED_LEN {
            return Err(CryptoError::DerivationFailed(format!(
                "Invalid seed length: expected {} bytes, got {}",
                MASTER_SEED_LEN,
                seed.len()
            ))
            .into());
        }
        Ok(())
    }
}
