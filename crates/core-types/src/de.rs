//! Lenient decoders for provider payloads.
//!
//! The positions endpoint is a thin proxy over the exchange, so the same field
//! can arrive as a JSON number, a numeric string, `null` or not at all.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use std::fmt;
use std::str::FromStr;

/// Parses a monetary or quantity string, returning `None` when it is not a number.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

struct LenientDecimal;

impl<'de> Visitor<'de> for LenientDecimal {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        Ok(Decimal::from_f64(v).unwrap_or(Decimal::ZERO))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        Ok(parse_decimal(v).unwrap_or(Decimal::ZERO))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(LenientDecimal)
    }
}

/// Decodes a numeric field, treating absent or unparseable values as zero.
///
/// Pair with `#[serde(default)]` so a missing key also yields zero.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientDecimal)
}

fn millis_to_utc<E: de::Error>(ms: i64) -> Result<DateTime<Utc>, E> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}")))
}

struct Timestamp;

impl<'de> Visitor<'de> for Timestamp {
    type Value = Option<DateTime<Utc>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp or epoch milliseconds")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        millis_to_utc(v).map(Some)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let ms = i64::try_from(v).map_err(|_| E::custom(format!("timestamp out of range: {v}")))?;
        millis_to_utc(ms).map(Some)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom("timestamp is not finite"));
        }
        millis_to_utc(v as i64).map(Some)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim();
        if v.is_empty() {
            return Ok(None);
        }
        if let Ok(ms) = v.parse::<i64>() {
            return millis_to_utc(ms).map(Some);
        }
        DateTime::parse_from_rfc3339(v)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| E::custom(format!("invalid timestamp '{v}': {e}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(Timestamp)
    }
}

/// Decodes a required timestamp.
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer
        .deserialize_any(Timestamp)?
        .ok_or_else(|| de::Error::custom("missing required timestamp"))
}

/// Decodes an optional timestamp; `null` and `""` both mean "not set".
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(Timestamp)
}
