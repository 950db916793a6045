use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// The side of a fill as reported by the provider (`"BUY"` / `"SELL"`).
///
/// Anything else (an empty string, `UNKNOWN_ORDER_SIDE`, ...) decodes to
/// `Other` so one odd record cannot fail a whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    Other,
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => Side::Buy,
            "SELL" => Side::Sell,
            _ => Side::Other,
        })
    }
}

/// Lifecycle state of a position record.
///
/// Providers report more states than the dashboard cares about. Anything that
/// is neither `open` nor `closed` lands in `Other` and is ignored by the
/// realized/unrealized split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
    Other,
}

impl<'de> Deserialize<'de> for PositionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "open" => PositionStatus::Open,
            "closed" => PositionStatus::Closed,
            _ => PositionStatus::Other,
        })
    }
}
