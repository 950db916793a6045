use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{LoggingConfig, ProxyConfig, RetryConfig, Settings};

/// Default configuration file, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "fillscope.toml";

/// Prefix for environment overrides, e.g. `FILLSCOPE__PROXY__BASE_URL`.
pub const ENV_PREFIX: &str = "FILLSCOPE";

/// Loads the application settings.
///
/// Sources are layered: built-in defaults, then the TOML file (required only
/// when `path` is given explicitly), then `FILLSCOPE__SECTION__KEY`
/// environment variables. The merged result is validated before it is returned.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    tracing::debug!(base_url = %settings.proxy.base_url, "Configuration loaded.");
    Ok(settings)
}
