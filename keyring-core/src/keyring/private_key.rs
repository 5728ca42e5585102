// keyring-core/src/keyring/private_key.rs
//
// Imported private key key-ring. One secp256k1 secret, the same key for
// every coin type.

use crate::crypto::{DigestMethod, PrivKeySecp256k1, PubKeySecp256k1};
use crate::error::{KeyRingError, KeyRingResult};
use crate::keyring::{
    cached_pub_key, CacheWrite, CreateKeyRingArgs, Env, KeyRing, PubKeyLookup, VaultPayload,
};
use crate::vault::{PlainObject, SensitiveMap, Vault, VaultService};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

pub const PRIVATE_KEY_KEY_RING_TYPE: &str = "private-key";

/// Cache tag for the single public key. Prefixed like the mnemonic tags but
/// namespaced by backend so the two never collide.
pub const PRIVATE_KEY_PUB_KEY_TAG: &str = "pubKey-private-key";

const PRIVATE_KEY_KEY: &str = "privateKey";

/// Backend for vaults holding a raw imported key: sensitive partition is
/// `{"privateKey": hex}`.
#[derive(Debug, Clone)]
pub struct KeyRingPrivateKeyService {
    vault_service: Arc<VaultService>,
    namespace: String,
}

impl KeyRingPrivateKeyService {
    pub fn new(vault_service: Arc<VaultService>, namespace: impl Into<String>) -> Self {
        Self {
            vault_service,
            namespace: namespace.into(),
        }
    }

    pub fn build_vault_payload(private_key: &[u8]) -> KeyRingResult<VaultPayload> {
        PrivKeySecp256k1::from_bytes(private_key).map_err(|_| {
            KeyRingError::InvalidArgument("private key must be a valid 32-byte secp256k1 secret".into())
        })?;

        let mut sensitive = PlainObject::new();
        sensitive.insert(PRIVATE_KEY_KEY.to_string(), Value::String(hex::encode(private_key)));

        Ok(VaultPayload {
            insensitive: PlainObject::new(),
            sensitive: SensitiveMap::new(sensitive),
        })
    }

    pub fn resolve_pub_key(&self, vault: &Vault) -> KeyRingResult<PubKeyLookup> {
        if let Some(pub_key) = cached_pub_key(vault, PRIVATE_KEY_PUB_KEY_TAG) {
            return Ok(PubKeyLookup {
                pub_key,
                cache_write: None,
            });
        }

        let pub_key = self.get_priv_key(vault)?.pub_key();
        debug!(vault_id = %vault.id, "Derived public key from imported key");
        Ok(PubKeyLookup {
            cache_write: Some(CacheWrite {
                tag: PRIVATE_KEY_PUB_KEY_TAG.to_string(),
                pub_key_hex: pub_key.to_hex(),
            }),
            pub_key,
        })
    }

    fn get_priv_key(&self, vault: &Vault) -> KeyRingResult<PrivKeySecp256k1> {
        self.vault_service
            .with_decrypted(&vault.sensitive, |sensitive| -> KeyRingResult<PrivKeySecp256k1> {
                let text = sensitive
                    .get_str(PRIVATE_KEY_KEY)
                    .filter(|text| !text.is_empty())
                    .ok_or(KeyRingError::MissingSeed)?;
                let bytes =
                    Zeroizing::new(hex::decode(text).map_err(|_| KeyRingError::MissingSeed)?);
                PrivKeySecp256k1::from_bytes(&bytes)
            })?
    }
}

#[async_trait]
impl KeyRing for KeyRingPrivateKeyService {
    fn supported_key_ring_type(&self) -> &'static str {
        PRIVATE_KEY_KEY_RING_TYPE
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_key_ring_vault(
        &self,
        _env: &Env,
        args: CreateKeyRingArgs,
    ) -> KeyRingResult<VaultPayload> {
        match args {
            CreateKeyRingArgs::PrivateKey { private_key } => Self::build_vault_payload(&private_key),
            other => Err(KeyRingError::InvalidArgument(format!(
                "private key ring cannot be created from {} arguments",
                other.key_ring_type()
            ))),
        }
    }

    /// `coin_type` is ignored: an imported key is the same on every chain
    fn get_pub_key(
        &self,
        _env: &Env,
        vault: &Vault,
        _coin_type: u32,
    ) -> KeyRingResult<PubKeySecp256k1> {
        let lookup = self.resolve_pub_key(vault)?;
        if let Some(write) = lookup.cache_write {
            self.vault_service.set_and_merge_insensitive_to_vault(
                &self.namespace,
                &vault.id,
                write.into_object(),
            )?;
        }
        Ok(lookup.pub_key)
    }

    fn sign(
        &self,
        _env: &Env,
        vault: &Vault,
        _coin_type: u32,
        data: &[u8],
        digest_method: DigestMethod,
    ) -> KeyRingResult<Vec<u8>> {
        let digest = digest_method.digest(data);
        self.get_priv_key(vault)?.sign_digest32(&digest)
    }
}
