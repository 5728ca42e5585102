// keyring-core/src/crypto/digest.rs
//
// Message digests applied before signing.

use crate::error::KeyRingError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

/// Hash function applied to the payload before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestMethod {
    /// SHA-256 (Cosmos SDK sign docs)
    Sha256,
    /// Keccak-256 (Ethereum, EVM-based Cosmos chains)
    Keccak256,
}

impl DigestMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            DigestMethod::Sha256 => "sha256",
            DigestMethod::Keccak256 => "keccak256",
        }
    }

    /// Hash `data` into a 32-byte digest
    pub fn digest(self, data: &[u8]) -> [u8; 32] {
        match self {
            DigestMethod::Sha256 => Sha256::digest(data).into(),
            DigestMethod::Keccak256 => {
                let mut hasher = Keccak::v256();
                let mut out = [0u8; 32];
                hasher.update(data);
                hasher.finalize(&mut out);
                out
            }
        }
    }
}

impl FromStr for DigestMethod {
    type Err = KeyRingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(DigestMethod::Sha256),
            "keccak256" => Ok(DigestMethod::Keccak256),
            other => Err(KeyRingError::UnsupportedDigest(other.to_string())),
        }
    }
}

impl fmt::Display for DigestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
