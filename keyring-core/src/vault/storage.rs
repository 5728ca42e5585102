// keyring-core/src/vault/storage.rs
//
// Persistence backends for vault records.
//
// File layout:
//   <root>/meta.json                 store metadata (salt, kdf, password check)
//   <root>/<namespace>/<id>.json     {id, insensitive, sensitive}

use crate::error::{VaultError, VaultResult};
use crate::vault::model::{StoreMeta, Vault, VaultId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const META_FILE: &str = "meta.json";
const RECORD_EXTENSION: &str = "json";

/// Where vault records live between process runs.
///
/// Writes must be durable when they return: the vault service treats a
/// successful `save_vault` as "persisted".
pub trait VaultStorage: Send + Sync {
    fn load_vaults(&self) -> VaultResult<Vec<(String, Vault)>>;

    fn save_vault(&self, namespace: &str, vault: &Vault) -> VaultResult<()>;

    fn delete_vault(&self, namespace: &str, id: &VaultId) -> VaultResult<()>;

    fn load_meta(&self) -> VaultResult<Option<StoreMeta>>;

    fn save_meta(&self, meta: &StoreMeta) -> VaultResult<()>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    vaults: Mutex<HashMap<(String, VaultId), Vault>>,
    meta: Mutex<Option<StoreMeta>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored copy of a vault, as last written
    pub fn stored(&self, namespace: &str, id: &VaultId) -> Option<Vault> {
        self.vaults.lock().get(&(namespace.to_string(), *id)).cloned()
    }
}

impl VaultStorage for MemoryStorage {
    fn load_vaults(&self) -> VaultResult<Vec<(String, Vault)>> {
        Ok(self
            .vaults
            .lock()
            .iter()
            .map(|((namespace, _), vault)| (namespace.clone(), vault.clone()))
            .collect())
    }

    fn save_vault(&self, namespace: &str, vault: &Vault) -> VaultResult<()> {
        self.vaults
            .lock()
            .insert((namespace.to_string(), vault.id), vault.clone());
        Ok(())
    }

    fn delete_vault(&self, namespace: &str, id: &VaultId) -> VaultResult<()> {
        self.vaults.lock().remove(&(namespace.to_string(), *id));
        Ok(())
    }

    fn load_meta(&self) -> VaultResult<Option<StoreMeta>> {
        Ok(self.meta.lock().clone())
    }

    fn save_meta(&self, meta: &StoreMeta) -> VaultResult<()> {
        *self.meta.lock() = Some(meta.clone());
        Ok(())
    }
}

/// JSON files on disk, one per vault. Writes go through a temp file and a
/// rename so a crash never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> VaultResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn namespace_dir(&self, namespace: &str) -> VaultResult<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(VaultError::Configuration(format!(
                "invalid vault namespace '{}'",
                namespace
            )));
        }
        Ok(self.root.join(namespace))
    }

    fn record_path(&self, namespace: &str, id: &VaultId) -> VaultResult<PathBuf> {
        Ok(self
            .namespace_dir(namespace)?
            .join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Write to a sibling temp file, flush it to disk, then rename over
    /// `path`
    fn write_atomic(path: &Path, bytes: &[u8]) -> VaultResult<()> {
        let tmp = path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl VaultStorage for FileStorage {
    fn load_vaults(&self) -> VaultResult<Vec<(String, Vault)>> {
        let mut vaults = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(namespace) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            for record in fs::read_dir(entry.path())? {
                let path = record?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                    continue;
                }
                let bytes = fs::read(&path)?;
                match serde_json::from_slice::<Vault>(&bytes) {
                    Ok(vault) => vaults.push((namespace.clone(), vault)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable vault record");
                    }
                }
            }
        }

        debug!(root = %self.root.display(), count = vaults.len(), "Loaded vault records");
        Ok(vaults)
    }

    fn save_vault(&self, namespace: &str, vault: &Vault) -> VaultResult<()> {
        fs::create_dir_all(self.namespace_dir(namespace)?)?;
        let path = self.record_path(namespace, &vault.id)?;
        let bytes = serde_json::to_vec_pretty(vault)?;
        Self::write_atomic(&path, &bytes)
    }

    fn delete_vault(&self, namespace: &str, id: &VaultId) -> VaultResult<()> {
        let path = self.record_path(namespace, id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_meta(&self) -> VaultResult<Option<StoreMeta>> {
        let path = self.root.join(META_FILE);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_meta(&self, meta: &StoreMeta) -> VaultResult<()> {
        let bytes = serde_json::to_vec_pretty(meta)?;
        Self::write_atomic(&self.root.join(META_FILE), &bytes)
    }
}
