// keyring-core/src/crypto/key_deriver/secp256k1.rs
//
// secp256k1 key derivation, BIP-32 over HMAC-SHA512.
// Reference: https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki

use crate::error::{CryptoError, KeyRingResult};
use bip32::{DerivationPath, XPrv};
use std::str::FromStr;
use zeroize::Zeroizing;

/// BIP-32 deriver for secp256k1
///
/// # Security
/// - Private keys come back in `Zeroizing<[u8; 32]>`
/// - Intermediate extended keys are dropped as the walk advances
///   (`XPrv` zeroizes its signing key on drop)
pub struct Secp256k1Deriver;

impl Secp256k1Deriver {
    /// Derive a single private key from seed + path
    ///
    /// # Arguments
    /// * `seed` - 64 bytes BIP-39 seed
    /// * `path` - Derivation path (e.g. "m/44'/118'/0'/0/0")
    pub fn derive(seed: &[u8], path: &str) -> KeyRingResult<Zeroizing<[u8; 32]>> {
        let root_xprv = XPrv::new(seed).map_err(|e| {
            CryptoError::DerivationFailed(format!("Failed to create master key: {}", e))
        })?;

        let derivation_path = DerivationPath::from_str(path).map_err(|e| {
            CryptoError::DerivationFailed(format!("Invalid path '{}': {}", path, e))
        })?;

        let mut child = root_xprv;
        for child_num in derivation_path {
            child = child.derive_child(child_num).map_err(|e| {
                CryptoError::DerivationFailed(format!("Child derivation failed: {}", e))
            })?;
        }

        let key_bytes: [u8; 32] = child.private_key().to_bytes().into();
        Ok(Zeroizing::new(key_bytes))
    }
}
