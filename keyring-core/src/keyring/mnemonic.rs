// keyring-core/src/keyring/mnemonic.rs
//
// Mnemonic key-ring: a BIP-39 phrase and its master seed live in the
// sensitive partition; keys are derived per coin type on every use.

use crate::crypto::{
    Bip44Path, DigestMethod, KeyDeriver, MnemonicPhrase, PrivKeySecp256k1, PubKeySecp256k1,
};
use crate::error::{KeyRingError, KeyRingResult};
use crate::keyring::{
    cached_pub_key, CacheWrite, CreateKeyRingArgs, Env, KeyRing, PubKeyLookup, VaultPayload,
};
use crate::vault::{PlainObject, SensitiveMap, Vault, VaultService, BIP44_PATH_KEY};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

pub const MNEMONIC_KEY_RING_TYPE: &str = "mnemonic";

const MNEMONIC_KEY: &str = "mnemonic";
const MASTER_SEED_KEY: &str = "masterSeedText";

/// Backend for vaults created from a recovery phrase.
///
/// # Sensitive partition
/// `{"bip44Path": {...}, "masterSeedText": hex(seed), "mnemonic": phrase}`
///
/// # Public key cache
/// One insensitive entry per derivation path, tagged
/// `pubKey-m/44'/{coin}'/{account}'/{change}/{addressIndex}`.
#[derive(Debug, Clone)]
pub struct KeyRingMnemonicService {
    vault_service: Arc<VaultService>,
    namespace: String,
}

impl KeyRingMnemonicService {
    pub fn new(vault_service: Arc<VaultService>, namespace: impl Into<String>) -> Self {
        Self {
            vault_service,
            namespace: namespace.into(),
        }
    }

    /// Insensitive cache key for a coin type and path
    pub fn pub_key_tag(coin_type: u32, path: &Bip44Path) -> String {
        format!("pubKey-{}", path.derivation_path(coin_type))
    }

    /// Build the vault payload from a phrase and path.
    ///
    /// Only an empty phrase or an out-of-range path is rejected. Phrases that
    /// fail the BIP-39 wordlist/checksum check are kept (with a warning) and
    /// seeded from their trimmed text.
    pub fn build_vault_payload(
        mnemonic: &str,
        bip44_path: Bip44Path,
    ) -> KeyRingResult<VaultPayload> {
        let phrase = MnemonicPhrase::new(mnemonic)?;
        bip44_path.validate()?;

        if let Err(e) = phrase.check_bip39() {
            warn!(error = %e, "Mnemonic is not a checksummed BIP-39 phrase, seeding from raw text");
        }
        let seed = phrase.master_seed();

        let mut sensitive = PlainObject::new();
        sensitive.insert(BIP44_PATH_KEY.to_string(), bip44_path.to_value());
        sensitive.insert(MASTER_SEED_KEY.to_string(), Value::String(hex::encode(&seed[..])));
        sensitive.insert(MNEMONIC_KEY.to_string(), Value::String(phrase.phrase().to_string()));

        Ok(VaultPayload {
            insensitive: PlainObject::new(),
            sensitive: SensitiveMap::new(sensitive),
        })
    }

    /// The account/change/index triple recorded on the vault
    pub fn bip44_path_from_vault(vault: &Vault) -> KeyRingResult<Bip44Path> {
        vault
            .insensitive
            .get(BIP44_PATH_KEY)
            .and_then(Bip44Path::from_value)
            .ok_or(KeyRingError::MissingPath)
    }

    /// Public key for `coin_type`, plus the cache write to perform on a miss.
    ///
    /// Touches no shared state; a cache hit never decrypts.
    pub fn resolve_pub_key(&self, vault: &Vault, coin_type: u32) -> KeyRingResult<PubKeyLookup> {
        let path = Self::bip44_path_from_vault(vault)?;
        let tag = Self::pub_key_tag(coin_type, &path);

        if let Some(pub_key) = cached_pub_key(vault, &tag) {
            return Ok(PubKeyLookup {
                pub_key,
                cache_write: None,
            });
        }

        let pub_key = self.get_priv_key(vault, coin_type)?.pub_key();
        debug!(vault_id = %vault.id, coin_type, "Derived public key");
        Ok(PubKeyLookup {
            cache_write: Some(CacheWrite {
                tag,
                pub_key_hex: pub_key.to_hex(),
            }),
            pub_key,
        })
    }

    /// Derive the private key for `coin_type` from the decrypted seed.
    ///
    /// Checks run in order: path on the vault, decryption, seed presence,
    /// then derivation.
    fn get_priv_key(&self, vault: &Vault, coin_type: u32) -> KeyRingResult<PrivKeySecp256k1> {
        let path = Self::bip44_path_from_vault(vault)?;

        self.vault_service
            .with_decrypted(&vault.sensitive, |sensitive| -> KeyRingResult<PrivKeySecp256k1> {
                let seed_text = sensitive
                    .get_str(MASTER_SEED_KEY)
                    .filter(|text| !text.is_empty())
                    .ok_or(KeyRingError::MissingSeed)?;
                let seed = Zeroizing::new(
                    hex::decode(seed_text).map_err(|_| KeyRingError::MissingSeed)?,
                );

                let key = KeyDeriver::derive_secp256k1(&seed, &path.derivation_path(coin_type))?;
                PrivKeySecp256k1::from_bytes(&key[..])
            })?
    }
}

#[async_trait]
impl KeyRing for KeyRingMnemonicService {
    async fn init(&self) -> KeyRingResult<()> {
        debug!(namespace = %self.namespace, "Mnemonic key ring ready");
        Ok(())
    }

    fn supported_key_ring_type(&self) -> &'static str {
        MNEMONIC_KEY_RING_TYPE
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
            CreateKeyRingArgs::Mnemonic {
                mnemonic,
                bip44_path,
            } => Self::build_vault_payload(&mnemonic, bip44_path),
            other => Err(KeyRingError::InvalidArgument(format!(
                "mnemonic key ring cannot be created from {} arguments",
                other.key_ring_type()
            ))),
        }
    }

    fn get_pub_key(
        &self,
        _env: &Env,
        vault: &Vault,
        coin_type: u32,
    ) -> KeyRingResult<PubKeySecp256k1> {
        let lookup = self.resolve_pub_key(vault, coin_type)?;
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
        coin_type: u32,
        data: &[u8],
        digest_method: DigestMethod,
    ) -> KeyRingResult<Vec<u8>> {
        let digest = digest_method.digest(data);
        let priv_key = self.get_priv_key(vault, coin_type)?;
        priv_key.sign_digest32(&digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KdfParams;
    use crate::crypto::coin_type;
    use crate::error::VaultError;
    use crate::vault::{SensitiveBlob, VaultId};
    use serde_json::json;

    const NAMESPACE: &str = "keyRing";
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const COSMOS_PUB_KEY: &str = "024f4e2ad99c34d60b9ba6283c9431a8418af8673212961f97a77b6377fcd05b62";
    const ETH_PRIV_KEY: &str = "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727";

    fn setup() -> (Arc<VaultService>, KeyRingMnemonicService) {
        let vault_service = Arc::new(VaultService::in_memory(KdfParams::fast_insecure()).unwrap());
        vault_service.unlock("password").unwrap();
        let service = KeyRingMnemonicService::new(vault_service.clone(), NAMESPACE);
        (vault_service, service)
    }

    /// Store a mnemonic vault the way the dispatcher does
    fn store_vault(vault_service: &VaultService, path: Bip44Path) -> Vault {
        let payload = KeyRingMnemonicService::build_vault_payload(TEST_MNEMONIC, path).unwrap();
        let mut insensitive = payload.insensitive.clone();
        insensitive.insert(BIP44_PATH_KEY.into(), path.to_value());
        let id = vault_service
            .add_vault(NAMESPACE, insensitive, &payload.sensitive)
            .unwrap();
        vault_service.get_vault(NAMESPACE, &id).unwrap()
    }

    fn vault_with(insensitive: Value, sensitive: SensitiveBlob) -> Vault {
        Vault {
            id: VaultId::new(),
            insensitive: insensitive.as_object().cloned().unwrap(),
            sensitive,
        }
    }

    #[test]
    fn test_pub_key_tag() {
        assert_eq!(
            KeyRingMnemonicService::pub_key_tag(118, &Bip44Path::new(0, 0, 0)),
            "pubKey-m/44'/118'/0'/0/0"
        );
        assert_eq!(
            KeyRingMnemonicService::pub_key_tag(60, &Bip44Path::new(2, 1, 7)),
            "pubKey-m/44'/60'/2'/1/7"
        );
    }

    #[test]
    fn test_build_vault_payload() {
        let payload =
            KeyRingMnemonicService::build_vault_payload(TEST_MNEMONIC, Bip44Path::default()).unwrap();

        assert!(payload.insensitive.is_empty());
        assert_eq!(payload.sensitive.get_str(MNEMONIC_KEY), Some(TEST_MNEMONIC));
        assert_eq!(
            payload.sensitive.get(BIP44_PATH_KEY),
            Some(&json!({"account": 0, "change": 0, "addressIndex": 0}))
        );
        let seed = payload.sensitive.get_str(MASTER_SEED_KEY).unwrap();
        assert_eq!(seed.len(), 128);
        assert!(seed.starts_with("5eb00bbd"));
        assert!(seed.ends_with("ce9e38e4"));
    }

    #[test]
    fn test_build_vault_payload_trims_only() {
        let padded = format!("  {}\n", TEST_MNEMONIC);
        let payload =
            KeyRingMnemonicService::build_vault_payload(&padded, Bip44Path::default()).unwrap();
        assert_eq!(payload.sensitive.get_str(MNEMONIC_KEY), Some(TEST_MNEMONIC));

        let spaced = TEST_MNEMONIC.replacen(' ', "   ", 1);
        let payload =
            KeyRingMnemonicService::build_vault_payload(&spaced, Bip44Path::default()).unwrap();
        assert_eq!(payload.sensitive.get_str(MNEMONIC_KEY), Some(spaced.as_str()));
        let expected = hex::encode(&*MnemonicPhrase::new(&spaced).unwrap().master_seed());
        assert_eq!(payload.sensitive.get_str(MASTER_SEED_KEY), Some(expected.as_str()));
    }

    #[test]
    fn test_build_vault_payload_keeps_non_bip39_phrases() {
        // wrong word count, then a failing checksum
        for mnemonic in [
            "abandon abandon",
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon",
        ] {
            let payload =
                KeyRingMnemonicService::build_vault_payload(mnemonic, Bip44Path::default()).unwrap();
            assert_eq!(payload.sensitive.get_str(MNEMONIC_KEY), Some(mnemonic));
            let expected = hex::encode(&*MnemonicPhrase::new(mnemonic).unwrap().master_seed());
            assert_eq!(payload.sensitive.get_str(MASTER_SEED_KEY), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_build_vault_payload_rejects_bad_input() {
        for mnemonic in ["", "   ", "\t\n"] {
            let err = KeyRingMnemonicService::build_vault_payload(mnemonic, Bip44Path::default())
                .unwrap_err();
            assert!(matches!(err, KeyRingError::InvalidArgument(_)), "{:?}", err);
        }

        let err = KeyRingMnemonicService::build_vault_payload(
            TEST_MNEMONIC,
            Bip44Path::new(0x8000_0000, 0, 0),
        )
        .unwrap_err();
        assert!(matches!(err, KeyRingError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_create_key_ring_vault_rejects_other_args() {
        let (_, service) = setup();
        let err = service
            .create_key_ring_vault(&Env::internal(), CreateKeyRingArgs::private_key(&[1u8; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyRingError::InvalidArgument(_)));
    }

    #[test]
    fn test_get_pub_key_reference_vector_and_cache() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());
        let env = Env::internal();

        let before = vault_service.decrypt_count();
        let entries = vault.insensitive.len();
        let pub_key = service.get_pub_key(&env, &vault, coin_type::COSMOS).unwrap();
        assert_eq!(pub_key.to_hex(), COSMOS_PUB_KEY);
        assert_eq!(vault_service.decrypt_count(), before + 1);

        // a miss adds exactly the one entry for this path
        let stored = vault_service.get_vault(NAMESPACE, &vault.id).unwrap();
        assert_eq!(stored.insensitive.len(), entries + 1);
        assert_eq!(
            stored.insensitive.get("pubKey-m/44'/118'/0'/0/0"),
            Some(&Value::String(COSMOS_PUB_KEY.into()))
        );

        // second lookup reads the cache and never decrypts or writes
        let cached = service.get_pub_key(&env, &stored, coin_type::COSMOS).unwrap();
        assert_eq!(cached, pub_key);
        assert_eq!(vault_service.decrypt_count(), before + 1);
        let after_hit = vault_service.get_vault(NAMESPACE, &vault.id).unwrap();
        assert_eq!(after_hit.insensitive.len(), entries + 1);
        assert_eq!(after_hit.insensitive, stored.insensitive);
    }

    #[test]
    fn test_cache_is_per_coin_type() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());
        let env = Env::internal();

        let cosmos = service.get_pub_key(&env, &vault, coin_type::COSMOS).unwrap();
        let vault = vault_service.get_vault(NAMESPACE, &vault.id).unwrap();
        let eth = service.get_pub_key(&env, &vault, coin_type::ETHEREUM).unwrap();
        assert_ne!(cosmos, eth);

        let expected = PrivKeySecp256k1::from_bytes(&hex::decode(ETH_PRIV_KEY).unwrap())
            .unwrap()
            .pub_key();
        assert_eq!(eth, expected);

        let stored = vault_service.get_vault(NAMESPACE, &vault.id).unwrap();
        assert!(stored.insensitive.contains_key("pubKey-m/44'/118'/0'/0/0"));
        assert!(stored.insensitive.contains_key("pubKey-m/44'/60'/0'/0/0"));
    }

    #[test]
    fn test_resolve_pub_key_is_pure() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());

        let lookup = service.resolve_pub_key(&vault, coin_type::COSMOS).unwrap();
        assert_eq!(
            lookup.cache_write,
            Some(CacheWrite {
                tag: "pubKey-m/44'/118'/0'/0/0".into(),
                pub_key_hex: COSMOS_PUB_KEY.into(),
            })
        );

        let stored = vault_service.get_vault(NAMESPACE, &vault.id).unwrap();
        assert!(!stored.insensitive.contains_key("pubKey-m/44'/118'/0'/0/0"));
    }

    #[test]
    fn test_malformed_cache_entry_is_rederived() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());
        let mut partial = PlainObject::new();
        partial.insert("pubKey-m/44'/118'/0'/0/0".into(), Value::String("zz".into()));
        vault_service
            .set_and_merge_insensitive_to_vault(NAMESPACE, &vault.id, partial)
            .unwrap();
        let vault = vault_service.get_vault(NAMESPACE, &vault.id).unwrap();

        let pub_key = service.get_pub_key(&Env::internal(), &vault, coin_type::COSMOS).unwrap();
        assert_eq!(pub_key.to_hex(), COSMOS_PUB_KEY);
    }

    #[test]
    fn test_missing_path() {
        let (vault_service, service) = setup();
        let blob = store_vault(&vault_service, Bip44Path::default()).sensitive;
        let vault = vault_with(json!({}), blob.clone());

        let before = vault_service.decrypt_count();
        assert_eq!(
            service.get_pub_key(&Env::internal(), &vault, 118).unwrap_err(),
            KeyRingError::MissingPath
        );
        assert_eq!(vault_service.decrypt_count(), before);

        let vault = vault_with(json!({"bip44Path": {"account": -1, "change": 0, "addressIndex": 0}}), blob);
        assert_eq!(
            service.sign(&Env::internal(), &vault, 118, b"x", DigestMethod::Sha256).unwrap_err(),
            KeyRingError::MissingPath
        );
    }

    #[test]
    fn test_decryption_failure_propagates() {
        let (_, service) = setup();
        let vault = vault_with(
            json!({"bip44Path": {"account": 0, "change": 0, "addressIndex": 0}}),
            SensitiveBlob::from_bytes(vec![1; 40]),
        );
        assert!(matches!(
            service.get_pub_key(&Env::internal(), &vault, 118),
            Err(KeyRingError::Decryption(_))
        ));
    }

    #[test]
    fn test_locked_store_reports_decryption() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());
        vault_service.lock();
        assert!(matches!(
            service.sign(&Env::internal(), &vault, 118, b"x", DigestMethod::Sha256),
            Err(KeyRingError::Decryption(_))
        ));
    }

    #[test]
    fn test_missing_or_invalid_seed() {
        let (vault_service, service) = setup();
        let insensitive = json!({"bip44Path": {"account": 0, "change": 0, "addressIndex": 0}});

        for sensitive in [
            json!({"mnemonic": TEST_MNEMONIC}),
            json!({"masterSeedText": ""}),
            json!({"masterSeedText": "not hex at all"}),
        ] {
            let map = SensitiveMap::new(sensitive.as_object().cloned().unwrap());
            let id = vault_service
                .add_vault(NAMESPACE, insensitive.as_object().cloned().unwrap(), &map)
                .unwrap();
            let vault = vault_service.get_vault(NAMESPACE, &id).unwrap();
            assert_eq!(
                service.get_pub_key(&Env::internal(), &vault, 118).unwrap_err(),
                KeyRingError::MissingSeed
            );
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());
        let env = Env::internal();
        let data = b"{\"chain_id\":\"cosmoshub-4\"}";

        for method in [DigestMethod::Sha256, DigestMethod::Keccak256] {
            let signature = service.sign(&env, &vault, coin_type::COSMOS, data, method).unwrap();
            assert_eq!(signature.len(), 64);

            // deterministic nonce
            let again = service.sign(&env, &vault, coin_type::COSMOS, data, method).unwrap();
            assert_eq!(signature, again);

            let pub_key = service.get_pub_key(&env, &vault, coin_type::COSMOS).unwrap();
            assert!(pub_key.verify_digest32(&method.digest(data), &signature));
            assert!(!pub_key.verify_digest32(&method.digest(b"tampered"), &signature));
        }
    }

    #[test]
    fn test_sign_uses_coin_type_key() {
        let (vault_service, service) = setup();
        let vault = store_vault(&vault_service, Bip44Path::default());
        let env = Env::internal();

        let signature = service
            .sign(&env, &vault, coin_type::ETHEREUM, b"hello", DigestMethod::Keccak256)
            .unwrap();
        let eth_key = PrivKeySecp256k1::from_bytes(&hex::decode(ETH_PRIV_KEY).unwrap()).unwrap();
        assert!(eth_key
            .pub_key()
            .verify_digest32(&DigestMethod::Keccak256.digest(b"hello"), &signature));
    }

    #[test]
    fn test_cache_write_to_unknown_vault_fails() {
        let (vault_service, service) = setup();
        let stored = store_vault(&vault_service, Bip44Path::default());
        let orphan = Vault {
            id: VaultId::new(),
            ..stored
        };
        let err = service.get_pub_key(&Env::internal(), &orphan, 118).unwrap_err();
        assert_eq!(err, KeyRingError::from(VaultError::NotFound(orphan.id)));
    }
}
