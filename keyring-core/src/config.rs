// keyring-core/src/config.rs
//
// Runtime configuration for the key-ring core, loadable from TOML.

use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Namespace the dispatcher stores key ring vaults under.
pub const DEFAULT_NAMESPACE: &str = "keyRing";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyRingConfig {
    /// Vault namespace used for key rings
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Directory for persisted vault records. `None` keeps everything in memory.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Password KDF cost for newly initialized stores
    #[serde(default)]
    pub kdf: KdfParams,
}

/// Argon2id parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    #[serde(default = "default_memory_cost")]
    pub memory_kib: u32,
    /// Time cost (iterations)
    #[serde(default = "default_time_cost")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_memory_cost() -> u32 {
    64 * 1024 // 64 MiB
}

fn default_time_cost() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_cost(),
            iterations: default_time_cost(),
            parallelism: default_parallelism(),
        }
    }
}

impl KdfParams {
    /// Minimal cost accepted by Argon2. Only for tests and throwaway stores.
    pub const fn fast_insecure() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for KeyRingConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            storage_dir: None,
            kdf: KdfParams::default(),
        }
    }
}

impl KeyRingConfig {
    pub fn from_toml_str(text: &str) -> VaultResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| VaultError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn load(path: impl AsRef<Path>) -> VaultResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), namespace = %config.namespace, "Loaded key ring config");
        Ok(config)
    }

    pub fn validate(&self) -> VaultResult<()> {
        if self.namespace.is_empty() {
            return Err(VaultError::Configuration("namespace must not be empty".into()));
        }
        if self.kdf.parallelism == 0 || self.kdf.iterations == 0 {
            return Err(VaultError::Configuration(
                "kdf iterations and parallelism must be at least 1".into(),
            ));
        }
        if self.kdf.memory_kib < 8 * self.kdf.parallelism {
            return Err(VaultError::Configuration(
                "kdf memory_kib must be at least 8 * parallelism".into(),
            ));
        }
        Ok(())
    }
}
