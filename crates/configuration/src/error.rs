use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("proxy.base_url '{value}' is not a valid URL: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid setting: {0}")]
    ValidationError(String),
}
