use api_client::{ApiError, BearerToken, PositionSource, ScheduleSource};
use core_types::{decode_schedule, sort_chronologically, Position, ProductId};
use futures::future::join_all;

/// A single product whose fetch failed while the rest of the batch went on.
#[derive(Debug)]
pub struct ProductFailure {
    pub product: ProductId,
    pub error: ApiError,
}

/// The joined result of one fan-out over all schedules.
#[derive(Debug, Default)]
pub struct PositionBatch {
    /// Every successfully fetched position, ascending by `created_time`.
    pub positions: Vec<Position>,
    /// Products whose fetch failed.
    pub failures: Vec<ProductFailure>,
    /// Schedule identifiers that did not decode to a product.
    pub skipped: Vec<String>,
}

/// Resolves the active schedules, failing open to an empty list.
///
/// Transport and authorization failures are logged and swallowed; the caller
/// always gets a list.
pub async fn active_schedules(source: &dyn ScheduleSource, token: &BearerToken) -> Vec<String> {
    match source.fetch_active_schedules(token).await {
        Ok(schedules) => {
            tracing::info!(count = schedules.len(), "Fetched active schedules.");
            schedules
        }
        Err(e) => {
            tracing::error!(error = %e, "Error fetching schedules.");
            Vec::new()
        }
    }
}

/// Decodes schedules into products, keeping first-seen order and dropping
/// duplicates so a product with two schedules is fetched once.
fn decode_products(schedules: &[String]) -> (Vec<ProductId>, Vec<String>) {
    let mut products: Vec<ProductId> = Vec::new();
    let mut skipped = Vec::new();

    for schedule in schedules {
        match decode_schedule(schedule) {
            Ok(product) if !products.contains(&product) => products.push(product),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Skipping schedule.");
                skipped.push(schedule.clone());
            }
        }
    }

    (products, skipped)
}

/// Fetches every scheduled product concurrently and merges the results.
///
/// Each product's fetch succeeds or fails on its own: successes are merged and
/// sorted, failures are logged and returned individually. No schedules means
/// no requests.
pub async fn fetch_positions(
    source: &dyn PositionSource,
    schedules: &[String],
    token: &BearerToken,
) -> PositionBatch {
    let (products, skipped) = decode_products(schedules);
    let mut batch = PositionBatch {
        skipped,
        ..PositionBatch::default()
    };
    if products.is_empty() {
        return batch;
    }

    let fetches = products.into_iter().map(|product| async move {
        let result = source.fetch_product_positions(&product, token).await;
        (product, result)
    });

    for (product, result) in join_all(fetches).await {
        match result {
            Ok(positions) => {
                tracing::debug!(%product, count = positions.len(), "Fetched positions.");
                batch.positions.extend(positions);
            }
            Err(error) => {
                tracing::error!(%product, error = %error, "Error fetching positions.");
                batch.failures.push(ProductFailure { product, error });
            }
        }
    }

    sort_chronologically(&mut batch.positions);
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fill, FakeSource};

    fn schedules(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn token() -> BearerToken {
        BearerToken::new("tok").unwrap()
    }

    #[tokio::test]
    async fn merges_and_sorts_across_products() {
        let source = FakeSource::default()
            .with_positions("BTC-USD", vec![fill("btc-late", "BTC-USD", 5), fill("btc-early", "BTC-USD", 1)])
            .with_positions("ETH-USD", vec![fill("eth-mid", "ETH-USD", 3)]);

        let batch = fetch_positions(
            &source,
            &schedules(&["schedule-1-BTC-USD-spot", "schedule-2-ETH-USD-spot"]),
            &token(),
        )
        .await;

        let ids: Vec<_> = batch.positions.iter().map(|p| p.order_id.as_str()).collect();
        assert_eq!(ids, ["btc-early", "eth-mid", "btc-late"]);
        assert!(batch.failures.is_empty());
        assert!(batch.skipped.is_empty());
    }

    #[tokio::test]
    async fn failed_products_do_not_discard_the_batch() {
        let source = FakeSource::default()
            .with_positions("BTC-USD", vec![fill("btc", "BTC-USD", 1)])
            .failing("ETH-USD");

        let batch = fetch_positions(
            &source,
            &schedules(&["schedule-1-BTC-USD-spot", "schedule-2-ETH-USD-spot"]),
            &token(),
        )
        .await;

        assert_eq!(batch.positions.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].product.as_str(), "ETH-USD");
    }

    #[tokio::test]
    async fn undecodable_schedules_are_skipped_not_fetched() {
        let source = FakeSource::default().with_positions("BTC-USD", vec![fill("btc", "BTC-USD", 1)]);

        let batch = fetch_positions(
            &source,
            &schedules(&["bad-id", "schedule-1-BTC-USD-spot"]),
            &token(),
        )
        .await;

        assert_eq!(batch.skipped, ["bad-id"]);
        assert_eq!(batch.positions.len(), 1);
        assert_eq!(source.position_calls(), 1);
    }

    #[tokio::test]
    async fn duplicate_products_are_fetched_once() {
        let source = FakeSource::default().with_positions("BTC-USD", vec![fill("btc", "BTC-USD", 1)]);

        let batch = fetch_positions(
            &source,
            &schedules(&["schedule-1-BTC-USD-spot", "schedule-2-BTC-USD-perp"]),
            &token(),
        )
        .await;

        assert_eq!(batch.positions.len(), 1);
        assert_eq!(source.position_calls(), 1);
    }

    #[tokio::test]
    async fn no_schedules_means_no_requests() {
        let source = FakeSource::default();
        let batch = fetch_positions(&source, &[], &token()).await;

        assert!(batch.positions.is_empty());
        assert_eq!(source.position_calls(), 0);
    }

    #[tokio::test]
    async fn schedule_failures_fail_open() {
        let source = FakeSource::default().with_schedule_error();
        assert!(active_schedules(&source, &token()).await.is_empty());
    }
}
