// keyring-core/src/keyring/mod.rs
//
// Key-ring backends
//
// ┌───────────────────────────────────────────────────────────┐
// │  KeyRingService (dispatcher, routes by "keyRingType")     │
// │          │                               │                │
// │          ▼                               ▼                │
// │  KeyRingMnemonicService         KeyRingPrivateKeyService  │
// │  ("mnemonic")                   ("private-key")           │
// │          │                               │                │
// │          └──────────► VaultService ◄─────┘                │
// │               decrypt / merge insensitive                 │
// └───────────────────────────────────────────────────────────┘

pub mod mnemonic;
pub mod private_key;
pub mod service;

pub use mnemonic::{KeyRingMnemonicService, MNEMONIC_KEY_RING_TYPE};
pub use private_key::{KeyRingPrivateKeyService, PRIVATE_KEY_KEY_RING_TYPE};
pub use service::KeyRingService;

use crate::crypto::{Bip44Path, DigestMethod, PubKeySecp256k1};
use crate::error::{KeyRingError, KeyRingResult};
use crate::vault::{PlainObject, SensitiveMap, Vault};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use zeroize::Zeroizing;

/// Caller context forwarded by the routing layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    /// Origin of the request (extension page, dApp URL, ...)
    pub origin: String,
    /// Whether the request came from the wallet itself
    pub is_internal_msg: bool,
}

impl Env {
    pub fn internal() -> Self {
        Self {
            origin: "internal".to_string(),
            is_internal_msg: true,
        }
    }

    pub fn external(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            is_internal_msg: false,
        }
    }
}

/// Backend-specific secret material for creating a vault.
pub enum CreateKeyRingArgs {
    Mnemonic {
        mnemonic: Zeroizing<String>,
        bip44_path: Bip44Path,
    },
    PrivateKey {
        private_key: Zeroizing<Vec<u8>>,
    },
}

impl std::fmt::Debug for CreateKeyRingArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateKeyRingArgs::Mnemonic { bip44_path, .. } => f
                .debug_struct("Mnemonic")
                .field("bip44_path", bip44_path)
                .finish_non_exhaustive(),
            CreateKeyRingArgs::PrivateKey { .. } => {
                f.debug_struct("PrivateKey").finish_non_exhaustive()
            }
        }
    }
}

impl CreateKeyRingArgs {
    pub fn mnemonic(mnemonic: &str, bip44_path: Bip44Path) -> Self {
        CreateKeyRingArgs::Mnemonic {
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            bip44_path,
        }
    }

    pub fn private_key(private_key: &[u8]) -> Self {
        CreateKeyRingArgs::PrivateKey {
            private_key: Zeroizing::new(private_key.to_vec()),
        }
    }

    /// Backend type these arguments are meant for
    pub fn key_ring_type(&self) -> &'static str {
        match self {
            CreateKeyRingArgs::Mnemonic { .. } => MNEMONIC_KEY_RING_TYPE,
            CreateKeyRingArgs::PrivateKey { .. } => PRIVATE_KEY_KEY_RING_TYPE,
        }
    }

    pub fn bip44_path(&self) -> Option<Bip44Path> {
        match self {
            CreateKeyRingArgs::Mnemonic { bip44_path, .. } => Some(*bip44_path),
            CreateKeyRingArgs::PrivateKey { .. } => None,
        }
    }

    /// Parse untyped arguments coming from the routing layer.
    ///
    /// - `"mnemonic"`: `{"mnemonic": string, "bip44Path": {account, change, addressIndex}}`
    /// - `"private-key"`: `{"privateKey": hex string}`
    pub fn from_json(key_ring_type: &str, args: &Value) -> KeyRingResult<Self> {
        match key_ring_type {
            MNEMONIC_KEY_RING_TYPE => {
                let mnemonic = args
                    .get("mnemonic")
                    .and_then(Value::as_str)
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| {
                        KeyRingError::InvalidArgument("mnemonic must be a non-empty string".into())
                    })?;
                let bip44_path = args
                    .get("bip44Path")
                    .ok_or_else(|| KeyRingError::InvalidArgument("bip44Path is required".into()))
                    .and_then(Bip44Path::parse_argument)?;
                Ok(Self::mnemonic(mnemonic, bip44_path))
            }
            PRIVATE_KEY_KEY_RING_TYPE => {
                let text = args.get("privateKey").and_then(Value::as_str).ok_or_else(|| {
                    KeyRingError::InvalidArgument("privateKey must be a hex string".into())
                })?;
                let bytes = Zeroizing::new(hex::decode(text).map_err(|_| {
                    KeyRingError::InvalidArgument("privateKey must be a hex string".into())
                })?);
                Ok(Self::private_key(&bytes))
            }
            other => Err(KeyRingError::UnknownKeyRingType(other.to_string())),
        }
    }
}

/// What a backend hands back from vault creation. The sensitive half scrubs
/// itself on drop.
#[derive(Debug)]
pub struct VaultPayload {
    pub insensitive: PlainObject,
    pub sensitive: SensitiveMap,
}

/// Insensitive-partition write requested by a public key lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWrite {
    pub tag: String,
    pub pub_key_hex: String,
}

impl CacheWrite {
    pub fn into_object(self) -> PlainObject {
        let mut partial = PlainObject::new();
        partial.insert(self.tag, Value::String(self.pub_key_hex));
        partial
    }
}

/// Result of a public key lookup plus the cache write it implies, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKeyLookup {
    pub pub_key: PubKeySecp256k1,
    pub cache_write: Option<CacheWrite>,
}

/// Read a cached public key from the insensitive partition.
///
/// An unreadable entry counts as a miss so it gets rederived and rewritten.
pub(crate) fn cached_pub_key(vault: &Vault, tag: &str) -> Option<PubKeySecp256k1> {
    let text = vault.insensitive.get(tag)?.as_str()?;
    match PubKeySecp256k1::from_hex(text) {
        Ok(pub_key) => Some(pub_key),
        Err(e) => {
            warn!(vault_id = %vault.id, tag, error = %e, "Ignoring malformed cached public key");
            None
        }
    }
}

/// Capabilities every key-ring backend provides.
///
/// Backends are stateless across calls: each method depends only on the
/// vault contents and its arguments. The single side effect is the public
/// key cache write performed by `get_pub_key`.
#[async_trait]
pub trait KeyRing: Send + Sync {
    /// Setup hook, run once by the dispatcher
    async fn init(&self) -> KeyRingResult<()> {
        Ok(())
    }

    /// Stable routing tag stored as `keyRingType`; unique per backend
    fn supported_key_ring_type(&self) -> &'static str;

    /// Vault namespace this backend writes its public key cache to
    fn namespace(&self) -> &str;

    /// Build the insensitive/sensitive payload for a new vault. Persists nothing.
    async fn create_key_ring_vault(
        &self,
        env: &Env,
        args: CreateKeyRingArgs,
    ) -> KeyRingResult<VaultPayload>;

    fn get_pub_key(&self, env: &Env, vault: &Vault, coin_type: u32)
        -> KeyRingResult<PubKeySecp256k1>;

    /// Hash `data` with `digest_method` and sign the 32-byte digest
    fn sign(
        &self,
        env: &Env,
        vault: &Vault,
        coin_type: u32,
        data: &[u8],
        digest_method: DigestMethod,
    ) -> KeyRingResult<Vec<u8>>;
}
