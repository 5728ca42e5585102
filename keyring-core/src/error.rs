// keyring-core/src/error.rs
//
// Error taxonomy for the key-ring core. Every error is terminal for the call
// that produced it; nothing here is retried internally.

use crate::vault::VaultId;
use thiserror::Error;

pub type KeyRingResult<T> = std::result::Result<T, KeyRingError>;

pub type VaultResult<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyRingError {
    #[error("Invalid arguments: {0}")]
    InvalidArgument(String),

    #[error("Vault has no usable bip44Path")]
    MissingPath,

    #[error("Failed to decrypt sensitive data: {0}")]
    Decryption(String),

    #[error("masterSeedText is missing from the sensitive data")]
    MissingSeed,

    #[error("Unknown digest method: {0}")]
    UnsupportedDigest(String),

    #[error("Unknown key ring type: {0}")]
    UnknownKeyRingType(String),

    #[error("Key ring type '{0}' is already registered")]
    DuplicateKeyRingType(String),

    #[error("Vault not found: {0}")]
    VaultNotFound(VaultId),

    #[error("Mnemonic Error: {0}")]
    Mnemonic(#[from] MnemonicError),

    #[error("Cryptography Error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Vault Error: {0}")]
    Vault(VaultError),
}

impl From<VaultError> for KeyRingError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Decryption(msg) => KeyRingError::Decryption(msg),
            VaultError::Locked => KeyRingError::Decryption("vault service is locked".to_string()),
            VaultError::NotFound(id) => KeyRingError::VaultNotFound(id),
            other => KeyRingError::Vault(other),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Invalid word count: {0}. Expected 12, 15, 18, 21 or 24 words.")]
    InvalidWordCount(usize),

    #[error("Word at position {0} not found in the BIP39 wordlist.")]
    UnknownWord(usize),

    #[error("Checksum validation failed.")]
    ChecksumFailed,

    #[error("BIP39 internal error: {0}")]
    Bip39Error(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Failures raised by the vault store. Messages never carry plaintext.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    #[error("Vault service is locked")]
    Locked,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Vault not found: {0}")]
    NotFound(VaultId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Serialization(err.to_string())
    }
}
