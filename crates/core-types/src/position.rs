use crate::de::{lenient_decimal, optional_timestamp, timestamp};
use crate::enums::{PositionStatus, Side};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An instrument identifier in `BASE-QUOTE` form, e.g. `BTC-USD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn from_assets(base: &str, quote: &str) -> Self {
        Self(format!("{base}-{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProductId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::from_assets(base, quote))
            }
            _ => Err(CoreError::InvalidInput(
                "product id".to_string(),
                format!("'{s}' is not in BASE-QUOTE form"),
            )),
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single fill/order record for one instrument.
///
/// Field names follow the provider's snake_case wire format. Monetary fields
/// that are missing or unparseable decode as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub product_id: ProductId,
    pub order_id: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_time: DateTime<Utc>,
    /// `None` for orders that have not been filled yet.
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub last_fill_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub filled_size: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub filled_value: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_fees: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_value_after_fees: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Decimal,
    pub side: Side,
    pub status: PositionStatus,
}

impl Position {
    /// Per-position P&L: filled value net of fees, clamped to the `Decimal`
    /// range.
    pub fn pnl(&self) -> Decimal {
        self.filled_value.saturating_sub(self.total_fees)
    }

    pub fn is_filled(&self) -> bool {
        self.last_fill_time.is_some()
    }

    /// The instant a chart should place this record at: the last fill, or the
    /// creation time for orders that never filled.
    pub fn event_time(&self) -> DateTime<Utc> {
        self.last_fill_time.unwrap_or(self.created_time)
    }
}

/// Sorts positions ascending by `created_time`.
///
/// The sort is stable, so records created at the same instant keep their
/// relative order and a second pass is a no-op.
pub fn sort_chronologically(positions: &mut [Position]) {
    positions.sort_by_key(|p| p.created_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const COINBASE_ORDER: &str = r#"{
        "product_id": "BTC-USD",
        "order_id": "0000-000000-000000",
        "created_time": "2024-03-01T10:15:00Z",
        "last_fill_time": "2024-03-01T10:15:02.123Z",
        "filled_size": "0.001",
        "filled_value": "68.12",
        "total_fees": "0.41",
        "total_value_after_fees": "68.53",
        "price": "68120.00",
        "side": "BUY",
        "status": "closed"
    }"#;

    #[test]
    fn decodes_provider_payload() {
        let position: Position = serde_json::from_str(COINBASE_ORDER).unwrap();
        assert_eq!(position.product_id.as_str(), "BTC-USD");
        assert_eq!(position.filled_value, dec!(68.12));
        assert_eq!(position.total_fees, dec!(0.41));
        assert_eq!(position.side, Side::Buy);
        assert_eq!(position.status, PositionStatus::Closed);
        assert_eq!(position.pnl(), dec!(67.71));
        assert!(position.is_filled());
    }

    #[test]
    fn missing_monetary_fields_are_zero() {
        let json = r#"{
            "product_id": "ETH-USD",
            "order_id": "order-2",
            "created_time": 1709288100000,
            "filled_size": 2,
            "total_value_after_fees": 200,
            "price": 3500,
            "side": "SELL",
            "status": "open"
        }"#;
        let position: Position = serde_json::from_str(json).unwrap();
        assert_eq!(position.filled_value, Decimal::ZERO);
        assert_eq!(position.total_fees, Decimal::ZERO);
        assert_eq!(position.pnl(), Decimal::ZERO);
        assert!(!position.is_filled());
        assert_eq!(position.event_time(), position.created_time);
    }

    #[test]
    fn odd_side_does_not_drop_the_batch() {
        let json = r#"[
            {"product_id": "BTC-USD", "order_id": "a", "created_time": 1709288100000,
             "side": "BUY", "status": "closed"},
            {"product_id": "BTC-USD", "order_id": "b", "created_time": 1709288160000,
             "side": "UNKNOWN_ORDER_SIDE", "status": "closed"},
            {"product_id": "BTC-USD", "order_id": "c", "created_time": 1709288220000,
             "side": "", "status": "open"}
        ]"#;
        let positions: Vec<Position> = serde_json::from_str(json).unwrap();
        let sides: Vec<_> = positions.iter().map(|p| p.side).collect();
        assert_eq!(sides, [Side::Buy, Side::Other, Side::Other]);
    }

    #[test]
    fn extreme_values_saturate_pnl() {
        let json = r#"{
            "product_id": "BTC-USD",
            "order_id": "huge",
            "created_time": 1709288100000,
            "filled_value": 7e28,
            "total_fees": -7e28,
            "side": "BUY",
            "status": "closed"
        }"#;
        let position: Position = serde_json::from_str(json).unwrap();
        assert_eq!(position.pnl(), Decimal::MAX);
    }

    #[test]
    fn missing_created_time_is_an_error() {
        let json = r#"{"product_id": "BTC-USD", "order_id": "x", "side": "BUY", "status": "open"}"#;
        assert!(serde_json::from_str::<Position>(json).is_err());
    }

    #[test]
    fn product_id_parsing() {
        assert_eq!("BTC-USD".parse::<ProductId>().unwrap().as_str(), "BTC-USD");
        assert!("BTCUSD".parse::<ProductId>().is_err());
        assert!("-USD".parse::<ProductId>().is_err());
    }

    #[test]
    fn chronological_sort_is_idempotent() {
        let at = |h| Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap();
        let make = |id: &str, h| Position {
            product_id: ProductId::from_assets("BTC", "USD"),
            order_id: id.to_string(),
            created_time: at(h),
            last_fill_time: Some(at(h)),
            filled_size: dec!(1),
            filled_value: dec!(10),
            total_fees: dec!(1),
            total_value_after_fees: dec!(11),
            price: dec!(10),
            side: Side::Buy,
            status: PositionStatus::Closed,
        };
        let mut positions = vec![make("c", 12), make("a", 9), make("b", 9), make("d", 3)];

        sort_chronologically(&mut positions);
        let once: Vec<_> = positions.iter().map(|p| p.order_id.clone()).collect();
        assert_eq!(once, ["d", "a", "b", "c"]);

        sort_chronologically(&mut positions);
        let twice: Vec<_> = positions.iter().map(|p| p.order_id.clone()).collect();
        assert_eq!(once, twice);
    }
}
