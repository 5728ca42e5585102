// keyring-core/src/vault/model.rs
//
// Vault records: plaintext (insensitive) metadata next to an encrypted
// (sensitive) envelope.

use crate::config::KdfParams;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// JSON-like map with string keys used for both partitions.
pub type PlainObject = Map<String, Value>;

/// Insensitive key naming the backend that owns a vault.
pub const KEY_RING_TYPE_KEY: &str = "keyRingType";
/// Insensitive key holding the `{account, change, addressIndex}` triple.
pub const BIP44_PATH_KEY: &str = "bip44Path";
/// Insensitive key holding the user-facing key ring name.
pub const KEY_RING_NAME_KEY: &str = "keyRingName";

/// Current version byte of [`SensitiveBlob`] envelopes.
pub const SENSITIVE_BLOB_VERSION: u8 = 1;

/// Opaque vault identifier, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultId(Uuid);

impl VaultId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VaultId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for VaultId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Encrypted sensitive partition: `version || nonce(12) || ciphertext+tag`.
///
/// Serialized as a base64 string. `Debug` shows only the length.
#[derive(Clone, PartialEq, Eq)]
pub struct SensitiveBlob(Vec<u8>);

impl SensitiveBlob {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SensitiveBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBlob({} bytes)", self.0.len())
    }
}

impl Serialize for SensitiveBlob {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for SensitiveBlob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// One vault as held in memory and persisted to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: VaultId,
    pub insensitive: PlainObject,
    pub sensitive: SensitiveBlob,
}

impl Vault {
    /// Backend tag stored at creation, if any
    pub fn key_ring_type(&self) -> Option<&str> {
        self.insensitive.get(KEY_RING_TYPE_KEY)?.as_str()
    }

    /// Merge `partial` into the insensitive partition key by key.
    ///
    /// Returns `true` when any value changed.
    pub fn merge_insensitive(&mut self, partial: &PlainObject) -> bool {
        let mut changed = false;
        for (key, value) in partial {
            if self.insensitive.get(key) != Some(value) {
                self.insensitive.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Store-wide metadata: the password salt, KDF parameters and an encrypted
/// marker used to check a password on unlock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub version: u32,
    pub salt: SensitiveBlob,
    pub kdf: KdfParams,
    pub password_check: SensitiveBlob,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vault_with(insensitive: Value) -> Vault {
        Vault {
            id: VaultId::new(),
            insensitive: insensitive.as_object().cloned().unwrap_or_default(),
            sensitive: SensitiveBlob::from_bytes(vec![1, 2, 3]),
        }
    }

    #[test]
    fn test_vault_id_parse_round_trip() {
        let id = VaultId::new();
        assert_eq!(id.to_string().parse::<VaultId>().unwrap(), id);
        assert!("nope".parse::<VaultId>().is_err());
    }

    #[test]
    fn test_record_layout() {
        let vault = vault_with(json!({"keyRingType": "mnemonic"}));
        let value = serde_json::to_value(&vault).unwrap();

        assert_eq!(value["id"], json!(vault.id.to_string()));
        assert_eq!(value["insensitive"], json!({"keyRingType": "mnemonic"}));
        assert_eq!(value["sensitive"], json!("AQID"));

        let back: Vault = serde_json::from_value(value).unwrap();
        assert_eq!(back, vault);
    }

    #[test]
    fn test_key_ring_type() {
        assert_eq!(
            vault_with(json!({"keyRingType": "mnemonic"})).key_ring_type(),
            Some("mnemonic")
        );
        assert_eq!(vault_with(json!({})).key_ring_type(), None);
    }

    #[test]
    fn test_merge_is_key_wise() {
        let mut vault = vault_with(json!({"a": 1, "b": 2}));
        let partial = json!({"b": 3, "c": 4});

        assert!(vault.merge_insensitive(partial.as_object().unwrap()));
        assert_eq!(Value::Object(vault.insensitive.clone()), json!({"a": 1, "b": 3, "c": 4}));

        // same input again is a no-op
        assert!(!vault.merge_insensitive(partial.as_object().unwrap()));
    }

    #[test]
    fn test_blob_debug_hides_bytes() {
        let blob = SensitiveBlob::from_bytes(vec![0xde, 0xad]);
        assert_eq!(format!("{:?}", blob), "SensitiveBlob(2 bytes)");
    }
}
