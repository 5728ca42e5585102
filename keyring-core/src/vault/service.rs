// keyring-core/src/vault/service.rs
//
// The vault store: owns every vault record, the lock state, and the only
// code path that turns an encrypted sensitive blob back into plaintext.

use crate::config::{KdfParams, KeyRingConfig};
use crate::error::{VaultError, VaultResult};
use crate::logging::log_security_event;
use crate::vault::cipher::VaultCipher;
use crate::vault::model::{PlainObject, SensitiveBlob, StoreMeta, Vault, VaultId};
use crate::vault::sensitive::SensitiveMap;
use crate::vault::storage::{FileStorage, MemoryStorage, VaultStorage};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

const STORE_META_VERSION: u32 = 1;
const PASSWORD_CHECK_MARKER: &[u8] = b"keyring-core:password-check";

type VaultKey = (String, VaultId);

/// Encrypted vault store.
///
/// # Concurrency
/// - Vault records sit in a sharded map; a merge runs under the entry's
///   write guard, so writers to distinct keys of the same vault never lose
///   each other's updates.
/// - Readers get a cloned snapshot, never a half-applied merge.
/// - Each decrypt returns its own [`SensitiveMap`]; plaintext is never shared
///   between calls.
pub struct VaultService {
    storage: Arc<dyn VaultStorage>,
    kdf: KdfParams,
    vaults: DashMap<VaultKey, Vault>,
    meta: RwLock<Option<StoreMeta>>,
    cipher: RwLock<Option<VaultCipher>>,
    decrypt_calls: AtomicU64,
}

impl std::fmt::Debug for VaultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService")
            .field("vaults", &self.vaults.len())
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

impl VaultService {
    /// Open a store over `storage`, loading every persisted record.
    ///
    /// `kdf` only applies when the store is initialized on first unlock;
    /// existing stores keep the parameters they were created with.
    pub fn new(storage: Arc<dyn VaultStorage>, kdf: KdfParams) -> VaultResult<Self> {
        let meta = storage.load_meta()?;
        let vaults = DashMap::new();
        for (namespace, vault) in storage.load_vaults()? {
            vaults.insert((namespace, vault.id), vault);
        }

        info!(
            vaults = vaults.len(),
            initialized = meta.is_some(),
            "Vault service opened"
        );

        Ok(Self {
            storage,
            kdf,
            vaults,
            meta: RwLock::new(meta),
            cipher: RwLock::new(None),
            decrypt_calls: AtomicU64::new(0),
        })
    }

    /// In-memory store, nothing persisted across restarts
    pub fn in_memory(kdf: KdfParams) -> VaultResult<Self> {
        Self::new(Arc::new(MemoryStorage::new()), kdf)
    }

    /// File-backed store when `storage_dir` is set, in-memory otherwise
    pub fn from_config(config: &KeyRingConfig) -> VaultResult<Self> {
        config.validate()?;
        match &config.storage_dir {
            Some(dir) => Self::new(Arc::new(FileStorage::new(dir)?), config.kdf),
            None => Self::in_memory(config.kdf),
        }
    }

    // =========================================================================
    // LOCK STATE
    // =========================================================================

    /// Whether a password has ever been set for this store
    pub fn is_initialized(&self) -> bool {
        self.meta.read().is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.cipher.read().is_none()
    }

    /// Derive the envelope key from `password`.
    ///
    /// The first unlock of a fresh store picks a salt and records a password
    /// check; later unlocks must match it.
    pub fn unlock(&self, password: &str) -> VaultResult<()> {
        let mut meta_guard = self.meta.write();

        let cipher = match meta_guard.as_ref() {
            Some(meta) => {
                let cipher = VaultCipher::from_password(password, meta.salt.as_bytes(), &meta.kdf)?;
                let check = cipher.decrypt(&meta.password_check);
                if !matches!(&check, Ok(marker) if marker.as_slice() == PASSWORD_CHECK_MARKER) {
                    log_security_event("VAULT_UNLOCK", "password check failed", false);
                    return Err(VaultError::InvalidPassword);
                }
                cipher
            }
            None => {
                let salt = VaultCipher::generate_salt();
                let cipher = VaultCipher::from_password(password, &salt, &self.kdf)?;
                let meta = StoreMeta {
                    version: STORE_META_VERSION,
                    salt: SensitiveBlob::from_bytes(salt.to_vec()),
                    kdf: self.kdf,
                    password_check: cipher.encrypt(PASSWORD_CHECK_MARKER)?,
                };
                self.storage.save_meta(&meta)?;
                *meta_guard = Some(meta);
                log_security_event("VAULT_INIT", "store initialized", true);
                cipher
            }
        };

        *self.cipher.write() = Some(cipher);
        log_security_event("VAULT_UNLOCK", "store unlocked", true);
        Ok(())
    }

    /// Drop the envelope key; decrypts fail until the next unlock
    pub fn lock(&self) {
        *self.cipher.write() = None;
        log_security_event("VAULT_LOCK", "store locked", true);
    }

    // =========================================================================
    // VAULT RECORDS
    // =========================================================================

    /// Encrypt `sensitive`, persist a new vault and return its id
    pub fn add_vault(
        &self,
        namespace: &str,
        insensitive: PlainObject,
        sensitive: &SensitiveMap,
    ) -> VaultResult<VaultId> {
        let plaintext = Zeroizing::new(serde_json::to_vec(sensitive.as_object())?);
        let blob = {
            let guard = self.cipher.read();
            let cipher = guard.as_ref().ok_or(VaultError::Locked)?;
            cipher.encrypt(&plaintext)?
        };

        let vault = Vault {
            id: VaultId::new(),
            insensitive,
            sensitive: blob,
        };
        self.storage.save_vault(namespace, &vault)?;

        let id = vault.id;
        self.vaults.insert((namespace.to_string(), id), vault);
        debug!(namespace, vault_id = %id, "Vault added");
        Ok(id)
    }

    /// Snapshot of one vault
    pub fn get_vault(&self, namespace: &str, id: &VaultId) -> Option<Vault> {
        self.vaults
            .get(&(namespace.to_string(), *id))
            .map(|entry| entry.value().clone())
    }

    /// Snapshots of every vault in `namespace`, ordered by id
    pub fn get_vaults(&self, namespace: &str) -> Vec<Vault> {
        let mut vaults: Vec<Vault> = self
            .vaults
            .iter()
            .filter(|entry| entry.key().0 == namespace)
            .map(|entry| entry.value().clone())
            .collect();
        vaults.sort_by_key(|vault| vault.id);
        vaults
    }

    /// Delete a vault from storage and memory.
    ///
    /// The entry stays locked until both are gone, so a concurrent merge
    /// either lands before the delete or fails with `NotFound`.
    pub fn remove_vault(&self, namespace: &str, id: &VaultId) -> VaultResult<()> {
        match self.vaults.entry((namespace.to_string(), *id)) {
            Entry::Occupied(entry) => {
                self.storage.delete_vault(namespace, id)?;
                entry.remove();
            }
            Entry::Vacant(_) => return Err(VaultError::NotFound(*id)),
        }
        debug!(namespace, vault_id = %id, "Vault removed");
        Ok(())
    }

    /// Merge `partial` into a vault's insensitive partition.
    ///
    /// Keys not in `partial` are kept; keys in it are overwritten. The merged
    /// record is persisted before it becomes visible. Identical input is a
    /// no-op.
    pub fn set_and_merge_insensitive_to_vault(
        &self,
        namespace: &str,
        id: &VaultId,
        partial: PlainObject,
    ) -> VaultResult<()> {
        let mut entry = self
            .vaults
            .get_mut(&(namespace.to_string(), *id))
            .ok_or(VaultError::NotFound(*id))?;

        let mut merged = entry.value().clone();
        if !merged.merge_insensitive(&partial) {
            return Ok(());
        }

        self.storage.save_vault(namespace, &merged)?;
        *entry.value_mut() = merged;
        debug!(namespace, vault_id = %id, keys = partial.len(), "Insensitive data merged");
        Ok(())
    }

    // =========================================================================
    // DECRYPTION
    // =========================================================================

    /// Decrypt a sensitive blob into a fresh, call-scoped map.
    ///
    /// Fails with `Locked` before unlock, `Decryption` on a malformed or
    /// unauthenticated blob. Error messages never include plaintext.
    pub fn decrypt(&self, blob: &SensitiveBlob) -> VaultResult<SensitiveMap> {
        self.decrypt_calls.fetch_add(1, Ordering::Relaxed);

        let plaintext = {
            let guard = self.cipher.read();
            let cipher = guard.as_ref().ok_or(VaultError::Locked)?;
            cipher.decrypt(blob)?
        };

        let object: PlainObject = serde_json::from_slice(&plaintext).map_err(|_| {
            VaultError::Decryption("sensitive payload is not a JSON object".into())
        })?;
        Ok(SensitiveMap::new(object))
    }

    /// Decrypt, hand a borrowed view to `f`, then scrub the plaintext on every
    /// exit path.
    pub fn with_decrypted<R>(
        &self,
        blob: &SensitiveBlob,
        f: impl FnOnce(&SensitiveMap) -> R,
    ) -> VaultResult<R> {
        let sensitive = self.decrypt(blob)?;
        Ok(f(&sensitive))
    }

    /// Number of decrypt attempts since the service was opened
    pub fn decrypt_count(&self) -> u64 {
        self.decrypt_calls.load(Ordering::Relaxed)
    }
}
