use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::ConfigError;
use crate::director::DirectorConfig;

/// Environment prefix for overrides, e.g. `OMTOOLS_RETRY__MAX_RETRIES=3`.
const ENV_PREFIX: &str = "OMTOOLS_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<DirectorConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: DirectorConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<DirectorConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
