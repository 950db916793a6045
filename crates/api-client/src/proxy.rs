use crate::auth::BearerToken;
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use crate::{PositionSource, ScheduleSource};
use async_trait::async_trait;
use configuration::{ProxyConfig, RetryConfig};
use core_types::{Position, ProductId};
use serde::de::DeserializeOwned;
use url::Url;

/// HTTP client for the authenticated trading proxy.
///
/// Both endpoints are plain GETs carrying the bearer token. A cookie store is
/// kept for the proxy's session cookie.
#[derive(Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: Url,
    provider: String,
    retry: RetryPolicy,
}

impl ProxyClient {
    pub fn new(proxy: &ProxyConfig, retry: &RetryConfig) -> Result<Self, ApiError> {
        let base_url = proxy
            .url()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(proxy.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            provider: proxy.provider.clone(),
            retry: RetryPolicy::new(retry),
        })
    }

    /// Appends encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn schedules_url(&self) -> Result<Url, ApiError> {
        self.endpoint(&["proxy", "active-schedules"])
    }

    pub fn positions_url(&self, product: &ProductId) -> Result<Url, ApiError> {
        self.endpoint(&[
            "proxy",
            "providers",
            &self.provider,
            "products",
            product.as_str(),
            "positions",
        ])
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        label: &str,
        url: Url,
        token: &BearerToken,
    ) -> Result<T, ApiError> {
        self.retry
            .run(label, || self.get_once(url.clone(), token))
            .await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &BearerToken,
    ) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

#[async_trait]
impl ScheduleSource for ProxyClient {
    async fn fetch_active_schedules(&self, token: &BearerToken) -> Result<Vec<String>, ApiError> {
        let url = self.schedules_url()?;
        self.get_json("active-schedules", url, token).await
    }
}

#[async_trait]
impl PositionSource for ProxyClient {
    async fn fetch_product_positions(
        &self,
        product: &ProductId,
        token: &BearerToken,
    ) -> Result<Vec<Position>, ApiError> {
        let url = self.positions_url(product)?;
        self.get_json(product.as_str(), url, token).await
    }
}
