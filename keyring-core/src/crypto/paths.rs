// keyring-core/src/crypto/paths.rs
//
// BIP-44 derivation paths: SLIP-44 coin types and the per-vault
// {account, change, addressIndex} triple.

use crate::error::{KeyRingError, KeyRingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// SLIP-44 registered coin types
/// Ref: https://github.com/satoshilabs/slips/blob/master/slip-0044.md
pub mod coin_type {
    pub const BITCOIN: u32 = 0;
    pub const ETHEREUM: u32 = 60;
    pub const COSMOS: u32 = 118;
    pub const TERRA: u32 = 330;
    pub const SECRET: u32 = 529;
}

/// Hardened indices start here; path components must stay below it.
const HARDENED_OFFSET: u64 = 0x8000_0000;

/// The account/change/address triple stored in a vault.
///
/// Serialized with the camelCase keys the insensitive partition uses:
/// `{"account": 0, "change": 0, "addressIndex": 0}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bip44Path {
    pub account: u32,
    pub change: u32,
    pub address_index: u32,
}

impl Bip44Path {
    pub const fn new(account: u32, change: u32, address_index: u32) -> Self {
        Self {
            account,
            change,
            address_index,
        }
    }

    /// Full derivation path for a coin type:
    /// `m/44'/{coin}'/{account}'/{change}/{addressIndex}`
    #[inline]
    pub fn derivation_path(&self, coin_type: u32) -> String {
        format!(
            "m/44'/{}'/{}'/{}/{}",
            coin_type, self.account, self.change, self.address_index
        )
    }

    /// Parse from an untyped JSON value.
    ///
    /// Every component must be a non-negative integer below 2^31 so it can
    /// be used unhardened (change, addressIndex) or hardened (account).
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let component = |key: &str| -> Option<u32> {
            let raw = object.get(key)?.as_u64()?;
            if raw >= HARDENED_OFFSET {
                return None;
            }
            u32::try_from(raw).ok()
        };

        Some(Self {
            account: component("account")?,
            change: component("change")?,
            address_index: component("addressIndex")?,
        })
    }

    /// Same as [`from_value`](Self::from_value) but reports `InvalidArgument`.
    pub fn parse_argument(value: &Value) -> KeyRingResult<Self> {
        Self::from_value(value).ok_or_else(|| {
            KeyRingError::InvalidArgument(
                "bip44Path needs non-negative integer account, change and addressIndex".into(),
            )
        })
    }

    /// Reject components outside the unhardened index range
    pub fn validate(&self) -> KeyRingResult<()> {
        let in_range = [self.account, self.change, self.address_index]
            .iter()
            .all(|&c| u64::from(c) < HARDENED_OFFSET);
        if in_range {
            Ok(())
        } else {
            Err(KeyRingError::InvalidArgument(format!(
                "bip44Path component out of range: {}",
                self
            )))
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "account": self.account,
            "change": self.change,
            "addressIndex": self.address_index,
        })
    }
}

impl fmt::Display for Bip44Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'/{}/{}", self.account, self.change, self.address_index)
    }
}
