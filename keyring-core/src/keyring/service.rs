// keyring-core/src/keyring/service.rs
//
// Dispatcher: owns the backend registry and routes every operation to the
// backend named by the vault's "keyRingType".

use crate::config::KeyRingConfig;
use crate::crypto::{Bip44Path, DigestMethod, PubKeySecp256k1};
use crate::error::{KeyRingError, KeyRingResult};
use crate::keyring::{
    CreateKeyRingArgs, Env, KeyRing, KeyRingMnemonicService, KeyRingPrivateKeyService,
    VaultPayload,
};
use crate::logging::log_security_event;
use crate::vault::{
    Vault, VaultId, VaultService, BIP44_PATH_KEY, KEY_RING_NAME_KEY, KEY_RING_TYPE_KEY,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for key-ring operations.
///
/// Backends register under their `supported_key_ring_type`; vaults carry
/// that string in their insensitive partition and every call is routed on it.
pub struct KeyRingService {
    vault_service: Arc<VaultService>,
    namespace: String,
    key_rings: HashMap<&'static str, Arc<dyn KeyRing>>,
}

impl std::fmt::Debug for KeyRingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRingService")
            .field("namespace", &self.namespace)
            .field("key_rings", &self.supported_key_ring_types())
            .finish_non_exhaustive()
    }
}

impl KeyRingService {
    /// Dispatcher with an empty registry
    pub fn new(vault_service: Arc<VaultService>, namespace: impl Into<String>) -> Self {
        Self {
            vault_service,
            namespace: namespace.into(),
            key_rings: HashMap::new(),
        }
    }

    /// Dispatcher with the mnemonic and private key backends registered
    pub fn with_default_key_rings(
        vault_service: Arc<VaultService>,
        namespace: impl Into<String>,
    ) -> KeyRingResult<Self> {
        let namespace = namespace.into();
        let mut service = Self::new(vault_service.clone(), namespace.clone());
        service.register(Arc::new(KeyRingMnemonicService::new(
            vault_service.clone(),
            namespace.clone(),
        )))?;
        service.register(Arc::new(KeyRingPrivateKeyService::new(
            vault_service,
            namespace,
        )))?;
        Ok(service)
    }

    /// Open the vault store described by `config` and register the default
    /// backends on it
    pub fn from_config(config: &KeyRingConfig) -> KeyRingResult<Self> {
        let vault_service = Arc::new(VaultService::from_config(config)?);
        Self::with_default_key_rings(vault_service, config.namespace.clone())
    }

    /// Add a backend. Its type must be new and it must share this
    /// dispatcher's namespace, since it caches into the vaults routed to it.
    pub fn register(&mut self, key_ring: Arc<dyn KeyRing>) -> KeyRingResult<()> {
        let key_ring_type = key_ring.supported_key_ring_type();
        if self.key_rings.contains_key(key_ring_type) {
            return Err(KeyRingError::DuplicateKeyRingType(key_ring_type.to_string()));
        }
        if key_ring.namespace() != self.namespace {
            return Err(KeyRingError::InvalidArgument(format!(
                "key ring '{}' uses namespace '{}' but the dispatcher uses '{}'",
                key_ring_type,
                key_ring.namespace(),
                self.namespace
            )));
        }
        self.key_rings.insert(key_ring_type, key_ring);
        debug!(key_ring_type, "Key ring registered");
        Ok(())
    }

    /// Run every backend's setup hook
    pub async fn init(&self) -> KeyRingResult<()> {
        for key_ring in self.key_rings.values() {
            key_ring.init().await?;
        }
        info!(backends = self.key_rings.len(), "Key ring service initialized");
        Ok(())
    }

    pub fn vault_service(&self) -> &Arc<VaultService> {
        &self.vault_service
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registered type strings, sorted
    pub fn supported_key_ring_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.key_rings.keys().copied().collect();
        types.sort_unstable();
        types
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    pub async fn create_mnemonic_key_ring(
        &self,
        env: &Env,
        mnemonic: &str,
        bip44_path: Bip44Path,
        name: &str,
    ) -> KeyRingResult<VaultId> {
        self.create_key_ring(env, CreateKeyRingArgs::mnemonic(mnemonic, bip44_path), name)
            .await
    }

    pub async fn create_private_key_key_ring(
        &self,
        env: &Env,
        private_key: &[u8],
        name: &str,
    ) -> KeyRingResult<VaultId> {
        self.create_key_ring(env, CreateKeyRingArgs::private_key(private_key), name)
            .await
    }

    /// Build the payload with the matching backend, tag it, and persist it
    /// as a new vault.
    ///
    /// The stored insensitive partition always carries `keyRingType` and
    /// `keyRingName`, plus `bip44Path` for path-based backends. These win
    /// over anything the backend put under the same keys.
    pub async fn create_key_ring(
        &self,
        env: &Env,
        args: CreateKeyRingArgs,
        name: &str,
    ) -> KeyRingResult<VaultId> {
        let key_ring_type = args.key_ring_type();
        let key_ring = self.key_ring(key_ring_type)?;
        let bip44_path = args.bip44_path();

        let payload = match key_ring.create_key_ring_vault(env, args).await {
            Ok(payload) => payload,
            Err(e) => {
                log_security_event("KEYRING_CREATE", key_ring_type, false);
                return Err(e);
            }
        };

        let VaultPayload {
            mut insensitive,
            sensitive,
        } = payload;
        insensitive.insert(
            KEY_RING_TYPE_KEY.to_string(),
            Value::String(key_ring_type.to_string()),
        );
        insensitive.insert(KEY_RING_NAME_KEY.to_string(), Value::String(name.to_string()));
        if let Some(path) = bip44_path {
            insensitive.insert(BIP44_PATH_KEY.to_string(), path.to_value());
        }

        let id = self
            .vault_service
            .add_vault(&self.namespace, insensitive, &sensitive)?;
        log_security_event("KEYRING_CREATE", key_ring_type, true);
        info!(vault_id = %id, key_ring_type, origin = %env.origin, "Key ring created");
        Ok(id)
    }

    // =========================================================================
    // KEY OPERATIONS
    // =========================================================================

    pub fn get_pub_key(
        &self,
        env: &Env,
        vault_id: &VaultId,
        coin_type: u32,
    ) -> KeyRingResult<PubKeySecp256k1> {
        let vault = self.vault(vault_id)?;
        self.key_ring_for(&vault)?.get_pub_key(env, &vault, coin_type)
    }

    /// Sign `data` with the key for `coin_type`.
    ///
    /// `digest_method` is parsed before the vault is touched, so an unknown
    /// method never decrypts or derives anything.
    pub fn sign(
        &self,
        env: &Env,
        vault_id: &VaultId,
        coin_type: u32,
        data: &[u8],
        digest_method: &str,
    ) -> KeyRingResult<Vec<u8>> {
        let digest_method: DigestMethod = digest_method.parse()?;
        let vault = self.vault(vault_id)?;
        let signature = self
            .key_ring_for(&vault)?
            .sign(env, &vault, coin_type, data, digest_method)?;
        debug!(vault_id = %vault_id, coin_type, digest = %digest_method, origin = %env.origin, "Signed digest");
        Ok(signature)
    }

    // =========================================================================
    // MANAGEMENT
    // =========================================================================

    pub fn remove_key_ring(&self, vault_id: &VaultId) -> KeyRingResult<()> {
        self.vault_service.remove_vault(&self.namespace, vault_id)?;
        log_security_event("KEYRING_REMOVE", &vault_id.to_string(), true);
        Ok(())
    }

    /// Ids of every stored key ring, ordered
    pub fn key_ring_ids(&self) -> Vec<VaultId> {
        self.vault_service
            .get_vaults(&self.namespace)
            .into_iter()
            .map(|vault| vault.id)
            .collect()
    }

    fn vault(&self, vault_id: &VaultId) -> KeyRingResult<Vault> {
        self.vault_service
            .get_vault(&self.namespace, vault_id)
            .ok_or(KeyRingError::VaultNotFound(*vault_id))
    }

    fn key_ring(&self, key_ring_type: &str) -> KeyRingResult<&Arc<dyn KeyRing>> {
        self.key_rings
            .get(key_ring_type)
            .ok_or_else(|| KeyRingError::UnknownKeyRingType(key_ring_type.to_string()))
    }

    fn key_ring_for(&self, vault: &Vault) -> KeyRingResult<&Arc<dyn KeyRing>> {
        let key_ring_type = vault.key_ring_type().ok_or_else(|| {
            KeyRingError::UnknownKeyRingType(format!("<missing on vault {}>", vault.id))
        })?;
        self.key_ring(key_ring_type)
    }
}
