use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The proxy rejected the credential (HTTP {0})")]
    Unauthorized(u16),

    #[error("The proxy returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },

    #[error("Failed to load fixture data: {0}")]
    Fixture(String),
}

impl ApiError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Connection problems, timeouts, throttling and 5xx responses qualify;
    /// authorization and payload problems do not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
