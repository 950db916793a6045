use async_trait::async_trait;
use core_types::{Position, ProductId};

pub mod auth;
pub mod error;
pub mod fixture;
pub mod proxy;
pub mod retry;

// --- Public API ---
pub use auth::BearerToken;
pub use error::ApiError;
pub use fixture::FixtureSource;
pub use proxy::ProxyClient;
pub use retry::RetryPolicy;

/// Resolves the active trading schedules for the authenticated user.
///
/// The pipeline only sees this trait, so a live proxy, a fixture file or a
/// test double can be swapped in at construction time.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Fetches the identifiers of every active schedule. (Authenticated)
    async fn fetch_active_schedules(&self, token: &BearerToken) -> Result<Vec<String>, ApiError>;
}

/// Fetches position records for a single instrument.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Fetches all position records for `product`. (Authenticated)
    async fn fetch_product_positions(
        &self,
        product: &ProductId,
        token: &BearerToken,
    ) -> Result<Vec<Position>, ApiError>;
}
