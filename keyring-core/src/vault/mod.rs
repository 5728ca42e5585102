// keyring-core/src/vault/mod.rs

//! Vault store
//!
//! Every vault is split into an *insensitive* plaintext map (key ring type,
//! BIP-44 path, cached public keys) and a *sensitive* AES-256-GCM envelope
//! whose key is derived from the user password with Argon2id.
//!
//! [`VaultService`] is the only place sensitive blobs are opened; it hands
//! out call-scoped [`SensitiveMap`]s that scrub themselves on drop.

pub mod cipher;
pub mod model;
pub mod sensitive;
pub mod service;
pub mod storage;

pub use cipher::VaultCipher;
pub use model::{
    PlainObject, SensitiveBlob, StoreMeta, Vault, VaultId, BIP44_PATH_KEY, KEY_RING_NAME_KEY,
    KEY_RING_TYPE_KEY,
};
pub use sensitive::SensitiveMap;
pub use service::VaultService;
pub use storage::{FileStorage, MemoryStorage, VaultStorage};
