// keyring-core/src/lib.rs
//
// Vault-backed key-ring core.
//
// Layers, bottom up:
//   crypto   - BIP-39 / BIP-32 / BIP-44, secp256k1 keys, digests
//   vault    - encrypted vault records, lock state, scoped decryption
//   keyring  - pluggable backends (mnemonic, private key) + dispatcher

pub mod config;
pub mod crypto;
pub mod error;
pub mod keyring;
pub mod logging;
pub mod vault;

pub use config::{KdfParams, KeyRingConfig};
pub use crypto::{coin_type, Bip44Path, DigestMethod, PubKeySecp256k1};
pub use error::{CryptoError, KeyRingError, KeyRingResult, MnemonicError, VaultError, VaultResult};
pub use keyring::{
    CreateKeyRingArgs, Env, KeyRing, KeyRingMnemonicService, KeyRingPrivateKeyService,
    KeyRingService,
};
pub use vault::{Vault, VaultId, VaultService};
