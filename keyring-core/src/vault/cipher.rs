// keyring-core/src/vault/cipher.rs
//
// AES-256-GCM envelope for the sensitive partition and Argon2id derivation
// of the envelope key from the user password.

use crate::config::KdfParams;
use crate::error::{VaultError, VaultResult};
use crate::vault::model::{SensitiveBlob, SENSITIVE_BLOB_VERSION};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Additional authenticated data bound to every sensitive envelope.
pub const SENSITIVE_AAD: &[u8] = b"keyring-core.vault.sensitive.v1";

/// Salt length for the password KDF.
pub const SALT_LEN: usize = 16;

const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Symmetric envelope keyed by the password-derived 256-bit key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for VaultCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultCipher").finish_non_exhaustive()
    }
}

impl VaultCipher {
    pub const fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Derive the envelope key from a password with Argon2id
    pub fn from_password(password: &str, salt: &[u8], params: &KdfParams) -> VaultResult<Self> {
        let argon_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(32),
        )
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(password.as_bytes(), salt, key.as_mut())
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

        Ok(Self::new(*key))
    }

    /// Fresh random salt for [`from_password`](Self::from_password)
    pub fn generate_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    fn aead(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    /// Seal `plaintext` under a random nonce
    pub fn encrypt(&self, plaintext: &[u8]) -> VaultResult<SensitiveBlob> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .aead()
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: SENSITIVE_AAD,
                },
            )
            .map_err(|_| VaultError::Encryption("AES-256-GCM encryption failed".into()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        out.push(SENSITIVE_BLOB_VERSION);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(SensitiveBlob::from_bytes(out))
    }

    /// Open an envelope. Fails closed: no bytes are returned unless the tag
    /// authenticates.
    pub fn decrypt(&self, blob: &SensitiveBlob) -> VaultResult<Zeroizing<Vec<u8>>> {
        let bytes = blob.as_bytes();
        if bytes.len() <= HEADER_LEN {
            return Err(VaultError::Decryption("sensitive blob is truncated".into()));
        }
        if bytes[0] != SENSITIVE_BLOB_VERSION {
            return Err(VaultError::Decryption(format!(
                "unsupported sensitive blob version {}",
                bytes[0]
            )));
        }

        let (nonce, ciphertext) = bytes[1..].split_at(NONCE_LEN);
        self.aead()
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: SENSITIVE_AAD,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| VaultError::Decryption("authentication failed".into()))
    }
}
