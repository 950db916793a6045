use crate::auth::BearerToken;
use crate::error::ApiError;
use crate::{PositionSource, ScheduleSource};
use async_trait::async_trait;
use core_types::{decode_schedule, Position, ProductId};
use std::collections::BTreeSet;
use std::path::Path;

/// An in-memory source backed by a fixed set of positions.
///
/// Serves both endpoints without touching the network: one synthetic schedule
/// per distinct product, and each product's positions in file order. Useful
/// for demos and for wiring tests that should not depend on a live proxy.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    positions: Vec<Position>,
}

impl FixtureSource {
    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    /// Loads a JSON array of positions in the provider's wire format.
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Fixture(format!("{}: {}", path.display(), e)))?;
        let positions: Vec<Position> = serde_json::from_str(&text)
            .map_err(|e| ApiError::Fixture(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), count = positions.len(), "Loaded fixture positions.");
        Ok(Self::from_positions(positions))
    }

    fn products(&self) -> BTreeSet<&ProductId> {
        self.positions.iter().map(|p| &p.product_id).collect()
    }
}

#[async_trait]
impl ScheduleSource for FixtureSource {
    async fn fetch_active_schedules(&self, _token: &BearerToken) -> Result<Vec<String>, ApiError> {
        let mut schedules = Vec::new();
        for product in self.products() {
            let schedule = format!("schedule-{}-{}-fixture", schedules.len() + 1, product);
            // Schedule ids carry exactly one BASE-QUOTE pair.
            if decode_schedule(&schedule).ok().as_ref() != Some(product) {
                tracing::warn!(%product, "Product id cannot be expressed as a schedule; skipping.");
                continue;
            }
            schedules.push(schedule);
        }
        Ok(schedules)
    }
}

#[async_trait]
impl PositionSource for FixtureSource {
    async fn fetch_product_positions(
        &self,
        product: &ProductId,
        _token: &BearerToken,
    ) -> Result<Vec<Position>, ApiError> {
        Ok(self
            .positions
            .iter()
            .filter(|p| &p.product_id == product)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"[
        {"product_id": "ETH-USD", "order_id": "e1", "created_time": 1709288100000,
         "last_fill_time": 1709288100000, "filled_value": 80, "total_fees": 100,
         "side": "SELL", "status": "open"},
        {"product_id": "BTC-USD", "order_id": "b1", "created_time": 1709280000000,
         "last_fill_time": 1709280000000, "filled_value": 150, "total_fees": 50,
         "side": "BUY", "status": "closed"}
    ]"#;

    fn load() -> FixtureSource {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        FixtureSource::from_path(file.path()).unwrap()
    }

    #[tokio::test]
    async fn synthesizes_decodable_schedules() {
        let source = load();
        let token = BearerToken::new("unused").unwrap();
        let schedules = source.fetch_active_schedules(&token).await.unwrap();

        assert_eq!(schedules, ["schedule-1-BTC-USD-fixture", "schedule-2-ETH-USD-fixture"]);
        let decoded: Vec<_> = schedules.iter().map(|s| decode_schedule(s).unwrap()).collect();
        assert_eq!(decoded[0].as_str(), "BTC-USD");
        assert_eq!(decoded[1].as_str(), "ETH-USD");
    }

    #[tokio::test]
    async fn serves_positions_per_product() {
        let source = load();
        let token = BearerToken::new("unused").unwrap();
        let eth: ProductId = "ETH-USD".parse().unwrap();
        let positions = source.fetch_product_positions(&eth, &token).await.unwrap();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].order_id, "e1");
    }

    #[tokio::test]
    async fn multi_hyphen_products_are_left_out_of_schedules() {
        let mut positions: Vec<Position> = serde_json::from_str(FIXTURE).unwrap();
        positions[0].product_id = "BTC-PERP-INTX".parse().unwrap();
        let source = FixtureSource::from_positions(positions);
        let token = BearerToken::new("unused").unwrap();

        let schedules = source.fetch_active_schedules(&token).await.unwrap();
        assert_eq!(schedules, ["schedule-1-BTC-USD-fixture"]);
    }

    #[test]
    fn missing_file_is_a_fixture_error() {
        let err = FixtureSource::from_path(Path::new("/no/such/fixture.json")).unwrap_err();
        assert!(matches!(err, ApiError::Fixture(_)));
    }
}
