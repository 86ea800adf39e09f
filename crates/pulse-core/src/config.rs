use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::app_config::{AppConfig, StoreConfig};
use crate::{ConfigError, SessionCredentials};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_TIMER_UNIT: &str = "online-pulse.timer";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// On-disk shape of the job config. Every field is optional here so that a
/// missing key surfaces as [`ConfigError::MissingField`] rather than a serde
/// message.
#[derive(Debug, Default, Deserialize)]
struct RawJobConfig {
    url: Option<String>,
    cookies: Option<BTreeMap<String, String>>,
    database_url: Option<String>,
    error_webhook: Option<String>,
}

/// Load the job configuration from a JSON file plus environment overrides.
///
/// Calls `dotenvy::dotenv().ok()` first so a `.env` file can supply
/// `DATABASE_URL` and the `PULSE_*` tunables.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, a required
/// field is missing, or an env var holds an invalid value.
pub fn load_app_config(path: &Path) -> Result<AppConfig, ConfigError> {
    build_app_config(read_job_config(path)?, |key| std::env::var(key))
}

/// Load only what the database commands need: `database_url` and the log
/// level. `url` and `cookies` may be absent or stale.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed or
/// `database_url` is missing.
pub fn load_store_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    build_store_config(read_job_config(path)?, |key| std::env::var(key))
}

fn read_job_config(path: &Path) -> Result<RawJobConfig, ConfigError> {
    dotenvy::dotenv().ok();
    let origin = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: origin.clone(),
        source,
    })?;
    parse_job_config(&raw, &origin)
}

fn parse_job_config(raw: &str, origin: &str) -> Result<RawJobConfig, ConfigError> {
    serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Validate the raw job config and merge in env-sourced settings through
/// `lookup`, so tests can drive it from a plain `HashMap`.
fn build_app_config<F>(raw: RawJobConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let url = non_blank(raw.url).ok_or(ConfigError::MissingField("url"))?;
    validate_http_url("url", &url)?;

    let cookies = raw
        .cookies
        .filter(|jar| !jar.is_empty())
        .map(SessionCredentials::new)
        .ok_or(ConfigError::MissingField("cookies"))?;

    let database_url = resolve_database_url(raw.database_url, &lookup)?;

    let error_webhook = non_blank(raw.error_webhook);
    if let Some(webhook) = &error_webhook {
        validate_http_url("error_webhook", webhook)?;
    }

    let log_level = or_default("PULSE_LOG_LEVEL", "info");
    let request_timeout_secs = timeout_secs(&lookup, "PULSE_REQUEST_TIMEOUT_SECS", 30)?;
    let alert_timeout_secs = timeout_secs(&lookup, "PULSE_ALERT_TIMEOUT_SECS", 10)?;
    let timer_unit = or_default("PULSE_TIMER_UNIT", DEFAULT_TIMER_UNIT);
    let user_agent = or_default("PULSE_USER_AGENT", DEFAULT_USER_AGENT);
    let accept_language = or_default("PULSE_ACCEPT_LANGUAGE", DEFAULT_ACCEPT_LANGUAGE);

    Ok(AppConfig {
        url,
        cookies,
        database_url,
        error_webhook,
        log_level,
        request_timeout_secs,
        alert_timeout_secs,
        timer_unit,
        user_agent,
        accept_language,
    })
}

fn build_store_config<F>(raw: RawJobConfig, lookup: F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    Ok(StoreConfig {
        database_url: resolve_database_url(raw.database_url, &lookup)?,
        log_level: lookup("PULSE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
    })
}

/// The file must name a database; `DATABASE_URL` only replaces that value.
fn resolve_database_url<F>(file_value: Option<String>, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let from_file = non_blank(file_value).ok_or(ConfigError::MissingField("database_url"))?;
    Ok(non_blank(lookup("DATABASE_URL").ok()).unwrap_or(from_file))
}

/// Whole seconds, at least 1. A zero timeout would fail every request.
fn timeout_secs<F>(lookup: &F, var: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Ok(raw) = lookup(var) else {
        return Ok(default);
    };
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("timeout must be at least 1 second".to_string())),
        Ok(secs) => Ok(secs),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host_and_path) if !host_and_path.is_empty() && !host_and_path.starts_with('/') => {
            Ok(())
        }
        _ => Err(ConfigError::InvalidField {
            field,
            reason: format!("\"{value}\" is not an absolute http(s) URL"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
