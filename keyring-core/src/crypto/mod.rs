// keyring-core/src/crypto/mod.rs

//! Cryptographic building blocks for the key-ring backends
//!
//! - **Mnemonic**: BIP-39 master seed derivation and phrase checks via [`MnemonicPhrase`].
//! - **Paths**: SLIP-44 coin types and the stored [`Bip44Path`] triple.
//! - **Key Derivation**: BIP-32 secp256k1 derivation via [`KeyDeriver`].
//! - **Digests**: sha256 / keccak256 via [`DigestMethod`].
//! - **Keys**: [`PrivKeySecp256k1`] / [`PubKeySecp256k1`] digest signing and verification.

pub mod digest;
pub mod key_deriver;
pub mod keys;
pub mod mnemonic;
pub mod paths;

pub use digest::DigestMethod;
pub use key_deriver::{KeyDeriver, Secp256k1Deriver};
pub use keys::{PrivKeySecp256k1, PubKeySecp256k1};
pub use mnemonic::{MnemonicPhrase, MASTER_SEED_LEN};
pub use paths::{coin_type, Bip44Path};
