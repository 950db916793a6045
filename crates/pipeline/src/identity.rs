use crate::error::PipelineError;
use api_client::BearerToken;
use async_trait::async_trait;

/// The login subsystem as the pipeline sees it: an authenticated flag and a
/// way to obtain the current bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Returns the current access token, silently refreshing it if needed.
    async fn access_token(&self) -> Result<BearerToken, PipelineError>;
}

/// A provider holding a token handed over by the host application.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<BearerToken>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<BearerToken>) -> Self {
        Self { token }
    }

    /// Reads the token from an environment variable; unset or empty means
    /// unauthenticated.
    pub fn from_env(var: &str) -> Self {
        let token = std::env::var(var).ok().and_then(BearerToken::new);
        if token.is_none() {
            tracing::warn!(var, "No access token in the environment; running unauthenticated.");
        }
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn access_token(&self) -> Result<BearerToken, PipelineError> {
        self.token
            .clone()
            .ok_or_else(|| PipelineError::Identity("not authenticated".to_string()))
    }
}
