//! Money amounts in whole currency units
//!
//! Files written by the shop's web client may carry fractional prices
//! (`11000.5`); those are rounded half away from zero on load. Output is
//! always an integer.

use serde::Deserializer;
use serde::de::{self, Visitor};

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a finite amount")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("amount {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        let rounded = v.round();
        // i64::MAX as f64 is 2^63, one past the range
        if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
            return Err(E::custom(format!("amount {v} out of range")));
        }
        Ok(rounded as i64)
    }
}

/// `#[serde(deserialize_with = "amount::deserialize")]`
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(AmountVisitor)
}
