use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable holding the config file path.
pub const CONFIG_PATH_ENV: &str = "ARCHIVER_CONFIG";

/// Default config file path when `ARCHIVER_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Load configuration from file with environment variable overrides.
///
/// A missing file is not an error: defaults plus `ARCHIVER_` environment
/// variables are used instead. Nested keys use a double underscore, e.g.
/// `ARCHIVER_PROCESSOR__MAX_CONCURRENT=5`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
    }

    figment
        .merge(Env::prefixed("ARCHIVER_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
