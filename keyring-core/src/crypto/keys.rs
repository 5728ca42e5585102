// keyring-core/src/crypto/keys.rs
//
// secp256k1 key pair wrappers: digest signing (RFC 6979) and verification.

use crate::error::{CryptoError, KeyRingResult};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// secp256k1 private key.
///
/// The inner `SigningKey` zeroizes its scalar on drop. Instances are meant
/// to live only for the duration of one derive or sign call.
pub struct PrivKeySecp256k1 {
    key: SigningKey,
}

impl std::fmt::Debug for PrivKeySecp256k1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivKeySecp256k1")
            .field("pub_key", &self.pub_key().to_hex())
            .finish_non_exhaustive()
    }
}

impl PrivKeySecp256k1 {
    /// Build from 32 raw bytes
    pub fn from_bytes(bytes: &[u8]) -> KeyRingResult<Self> {
        let key = SigningKey::from_slice(bytes).map_err(|e| {
            CryptoError::InvalidKeyFormat(format!(
                "Invalid secp256k1 private key (must be 32 bytes): {}",
                e
            ))
        })?;
        Ok(Self { key })
    }

    pub fn pub_key(&self) -> PubKeySecp256k1 {
        PubKeySecp256k1 {
            key: VerifyingKey::from(&self.key),
        }
    }

    /// Sign a 32-byte digest.
    ///
    /// Deterministic nonce (RFC 6979), low-S normalized, returned as the
    /// 64-byte compact `r || s` encoding.
    pub fn sign_digest32(&self, digest: &[u8; 32]) -> KeyRingResult<Vec<u8>> {
        let signature: Signature = self
            .key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_bytes().to_vec())
    }
}

/// secp256k1 public key, safe to cache in plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKeySecp256k1 {
    key: VerifyingKey,
}

impl PubKeySecp256k1 {
    /// Parse a compressed SEC1 key, the only form the key rings cache
    pub fn from_bytes(bytes: &[u8]) -> KeyRingResult<Self> {
        if bytes.len() != COMPRESSED_PUBKEY_LEN {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "Expected a {}-byte compressed public key, got {} bytes",
                COMPRESSED_PUBKEY_LEN,
                bytes.len()
            ))
            .into());
        }
        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|e| {
            CryptoError::InvalidKeyFormat(format!("Invalid secp256k1 public key: {}", e))
        })?;
        Ok(Self { key })
    }

    pub fn from_hex(text: &str) -> KeyRingResult<Self> {
        let bytes = hex::decode(text)
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("Invalid public key hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Compressed SEC1 encoding (33 bytes)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.key.to_encoded_point(true).as_bytes().to_vec()
    }

    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Verify a compact 64-byte signature over a 32-byte digest
    pub fn verify_digest32(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.key.verify_prehash(digest, &signature).is_ok()
    }
}
