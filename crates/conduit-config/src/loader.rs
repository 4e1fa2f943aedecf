//! Configuration loader (defaults + file + env merge).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use thiserror::Error;

use conduit_types::{ConduitError, DiagnosticError, ErrorKind};

use crate::schema::ConduitConfig;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load or merge configuration.
    #[error("configuration error: {0}")]
    Load(String),
}

impl From<ConfigError> for ConduitError {
    fn from(e: ConfigError) -> Self {
        ConduitError::new(ErrorKind::InvalidInput, e.to_string())
    }
}

impl DiagnosticError for ConfigError {
    fn hint(&self) -> Option<String> {
        Some("A config file value or a CONDUIT_* environment variable has the wrong type or an unknown key.".into())
    }

    fn fix(&self) -> Option<String> {
        Some("Use CONDUIT_<SECTION>__<KEY>, e.g. CONDUIT_SERVER__REQUEST_TIMEOUT_SECS=10.".into())
    }
}

/// Builds the layered provider stack:
/// 1. Default values
/// 2. Config file (if given)
/// 3. Environment variables (`CONDUIT_` prefix, `__` between sections)
/// 4. `ALPHA_VANTAGE_KEY`, the key name the public examples use
pub fn load_figment(config_path: Option<&str>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(ConduitConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed("CONDUIT_").split("__"))
        .merge(
            Env::raw()
                .only(&["ALPHA_VANTAGE_KEY"])
                .map(|_| "alpha_vantage.api_key".into()),
        )
}

/// Loads configuration from all layers.
pub fn load_config(config_path: Option<&str>) -> Result<ConduitConfig, ConfigError> {
    load_figment(config_path)
        .extract()
        .map_err(|e| ConfigError::Load(e.to_string()))
}
