//! Serde helpers for ledger quantities.
//!
//! Nodes encode integers as `0x`-prefixed hex strings with no leading zeros.
//! Some in-process peers answer with plain JSON numbers, so both forms are
//! accepted on input. Output is always hex.

use alloy_primitives::U64;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Parse a hex quantity such as `"0x1a"`.
pub fn parse(s: &str) -> Result<u64, TypeError> {
    let digits = s
        .strip_prefix("0x")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| TypeError::InvalidQuantity(s.to_string()))?;
    U64::from_str_radix(digits, 16)
        .map(|v| v.to::<u64>())
        .map_err(|e| TypeError::InvalidQuantity(format!("{s}: {e}")))
}

/// Format a quantity as hex.
pub fn format(value: u64) -> String {
    format!("0x{value:x}")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Hex(U64),
    Number(u64),
}

impl RawQuantity {
    fn into_u64<E: de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Hex(v) => u64::try_from(v).map_err(E::custom),
            Self::Number(n) => Ok(n),
        }
    }
}

pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    U64::from(*value).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    RawQuantity::deserialize(deserializer)?.into_u64()
}

/// Same as the parent module, for optional fields.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => U64::from(*v).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Option::<RawQuantity>::deserialize(deserializer)? {
            Some(raw) => raw.into_u64().map(Some),
            None => Ok(None),
        }
    }
}
