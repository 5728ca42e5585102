// keyring-core/src/vault/sensitive.rs
//
// Decrypted sensitive partition. Lives for one derive/sign call and scrubs
// every string it holds when dropped.

use crate::vault::model::PlainObject;
use serde_json::Value;
use zeroize::Zeroize;

/// Plaintext view of a vault's sensitive partition.
///
/// Not `Clone`: each decrypt produces its own map, and nothing outlives the
/// call that asked for it. On drop every string value (nested ones included)
/// is zeroized in place.
pub struct SensitiveMap {
    inner: PlainObject,
}

impl SensitiveMap {
    pub fn new(inner: PlainObject) -> Self {
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get(key)?.as_str()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn as_object(&self) -> &PlainObject {
        &self.inner
    }
}

impl From<PlainObject> for SensitiveMap {
    fn from(inner: PlainObject) -> Self {
        Self::new(inner)
    }
}

impl std::fmt::Debug for SensitiveMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveMap")
            .field("keys", &self.inner.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Drop for SensitiveMap {
    fn drop(&mut self) {
        for (_, value) in self.inner.iter_mut() {
            scrub(value);
        }
    }
}

fn scrub(value: &mut Value) {
    match value {
        Value::String(text) => text.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(scrub),
        Value::Object(map) => map.iter_mut().for_each(|(_, v)| scrub(v)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SensitiveMap {
        json!({
            "mnemonic": "abandon about",
            "masterSeedText": "00ff",
            "bip44Path": {"account": 0, "change": 0, "addressIndex": 0},
        })
        .as_object()
        .cloned()
        .unwrap()
        .into()
    }

    #[test]
    fn test_accessors() {
        let map = sample();
        assert_eq!(map.get_str("masterSeedText"), Some("00ff"));
        assert_eq!(map.get_str("bip44Path"), None);
        assert!(map.get("bip44Path").unwrap().is_object());
        assert_eq!(map.get_str("mnemonic"), Some("abandon about"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_scrub_clears_nested_strings() {
        let mut value = json!({"a": "secret", "b": ["x", {"c": "y"}], "d": 5});
        scrub(&mut value);
        assert_eq!(value, json!({"a": "", "b": ["", {"c": ""}], "d": 5}));
    }

    #[test]
    fn test_debug_shows_keys_only() {
        let debug_output = format!("{:?}", sample());
        assert!(debug_output.contains("masterSeedText"));
        assert!(!debug_output.contains("00ff"));
        assert!(!debug_output.contains("abandon"));
    }
}
