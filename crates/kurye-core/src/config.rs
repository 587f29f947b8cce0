use crate::app_config::{AppConfig, Environment, LocationAccuracy};
use crate::ConfigError;

const FALLBACK_API_BASE_URL: &str = "http://192.168.1.108:8000";
const FALLBACK_WEATHER_API_URL: &str = "http://api.weatherapi.com/v1";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the API base URL
/// resolves to an empty string.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the API base URL
/// resolves to an empty string.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a hardcoded fallback; only the API base URL is
/// required to be non-empty after the fallback is applied.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected a boolean, got '{other}'"),
            }),
        }
    };

    let env = parse_environment(&or_default("KURYE_ENV", "development"))?;
    let api_base_url = or_default("KURYE_API_BASE_URL", FALLBACK_API_BASE_URL);
    let api_timeout_ms = parse_u64("KURYE_API_TIMEOUT_MS", "15000")?;
    let debug_mode = parse_bool("KURYE_DEBUG_MODE", "true")?;
    let app_name = or_default("KURYE_APP_NAME", "Cargo Delivery");
    let app_version = or_default("KURYE_APP_VERSION", "1.0.0");
    let location_timeout_ms = parse_u64("KURYE_LOCATION_TIMEOUT_MS", "15000")?;
    let location_accuracy = parse_accuracy(&or_default("KURYE_LOCATION_ACCURACY", "high"))?;
    let log_level = or_default("KURYE_LOG_LEVEL", "info");
    let retry_backoff_ms = parse_u64("KURYE_RETRY_BACKOFF_MS", "1000")?;
    let storage_path = or_default("KURYE_STORAGE_PATH", "./.kurye/storage.json").into();
    let weather_api_url = or_default("KURYE_WEATHER_API_URL", FALLBACK_WEATHER_API_URL);
    let weather_api_key = lookup("KURYE_WEATHER_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());

    let config = AppConfig {
        env,
        api_base_url,
        api_timeout_ms,
        debug_mode,
        app_name,
        app_version,
        location_timeout_ms,
        location_accuracy,
        log_level,
        retry_backoff_ms,
        storage_path,
        weather_api_url,
        weather_api_key,
    };
    validate(&config)?;

    if config.debug_mode {
        tracing::debug!(
            api_base_url = %config.api_base_url,
            app_version = %config.app_version,
            env = %config.env,
            "configuration loaded"
        );
    }

    Ok(config)
}

/// Fails fast when a required setting resolved to an empty value.
///
/// # Errors
///
/// Returns [`ConfigError::MissingRequired`] naming the empty setting.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.api_base_url.trim().is_empty() {
        return Err(ConfigError::MissingRequired("KURYE_API_BASE_URL".to_string()));
    }
    Ok(())
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KURYE_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

fn parse_accuracy(s: &str) -> Result<LocationAccuracy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "lowest" => Ok(LocationAccuracy::Lowest),
        "low" => Ok(LocationAccuracy::Low),
        "balanced" => Ok(LocationAccuracy::Balanced),
        "high" => Ok(LocationAccuracy::High),
        "highest" => Ok(LocationAccuracy::Highest),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KURYE_LOCATION_ACCURACY".to_string(),
            reason: format!("unknown accuracy '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
