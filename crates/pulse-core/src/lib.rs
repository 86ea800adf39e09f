mod app_config;
mod config;
mod measurement;

use thiserror::Error;

pub use app_config::{AppConfig, StoreConfig};
pub use config::{
    load_app_config, load_store_config, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_CONFIG_PATH,
    DEFAULT_TIMER_UNIT, DEFAULT_USER_AGENT,
};
pub use measurement::{Measurement, SessionCredentials};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing required config field `{0}`")]
    MissingField(&'static str),

    #[error("invalid config field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
