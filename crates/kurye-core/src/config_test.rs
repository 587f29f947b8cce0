use std::collections::HashMap;
use std::env::VarError;
use std::time::Duration;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "KURYE_ENV"));
}

#[test]
fn build_app_config_uses_fallbacks_for_empty_environment() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.api_base_url, "http://192.168.1.108:8000");
    assert_eq!(cfg.api_timeout_ms, 15_000);
    assert!(cfg.debug_mode);
    assert_eq!(cfg.app_name, "Cargo Delivery");
    assert_eq!(cfg.app_version, "1.0.0");
    assert_eq!(cfg.location_timeout_ms, 15_000);
    assert_eq!(cfg.location_accuracy, LocationAccuracy::High);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.retry_backoff_ms, 1_000);
    assert_eq!(cfg.weather_api_url, "http://api.weatherapi.com/v1");
    assert!(cfg.weather_api_key.is_none());
}

#[test]
fn build_app_config_fails_when_base_url_is_blank() {
    let mut map = HashMap::new();
    map.insert("KURYE_API_BASE_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingRequired(ref v)) if v == "KURYE_API_BASE_URL"),
        "expected MissingRequired(KURYE_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_overrides_api_settings() {
    let mut map = HashMap::new();
    map.insert("KURYE_API_BASE_URL", "https://api.example.test");
    map.insert("KURYE_API_TIMEOUT_MS", "5000");
    map.insert("KURYE_APP_VERSION", "2.3.1");
    map.insert("KURYE_DEBUG_MODE", "false");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    let opts = cfg.api_client_options();
    assert_eq!(opts.base_url, "https://api.example.test");
    assert_eq!(opts.timeout, Duration::from_millis(5000));
    assert!(!opts.verbose);
    assert!(opts
        .default_headers
        .contains(&("X-App-Version", "2.3.1".to_owned())));
    assert!(opts
        .default_headers
        .contains(&("Content-Type", "application/json".to_owned())));
}

#[test]
fn build_app_config_rejects_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("KURYE_API_TIMEOUT_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KURYE_API_TIMEOUT_MS"),
        "expected InvalidEnvVar(KURYE_API_TIMEOUT_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_boolean_debug_mode() {
    let mut map = HashMap::new();
    map.insert("KURYE_DEBUG_MODE", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KURYE_DEBUG_MODE"),
        "expected InvalidEnvVar(KURYE_DEBUG_MODE), got: {result:?}"
    );
}

#[test]
fn location_options_reflect_configured_values() {
    let mut map = HashMap::new();
    map.insert("KURYE_LOCATION_TIMEOUT_MS", "8000");
    map.insert("KURYE_LOCATION_ACCURACY", "Balanced");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let opts = cfg.location_options();
    assert_eq!(opts.timeout, Duration::from_millis(8000));
    assert_eq!(opts.accuracy, LocationAccuracy::Balanced);
}

#[test]
fn unknown_location_accuracy_fails() {
    let mut map = HashMap::new();
    map.insert("KURYE_LOCATION_ACCURACY", "pinpoint");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "KURYE_LOCATION_ACCURACY"),
        "expected InvalidEnvVar(KURYE_LOCATION_ACCURACY), got: {result:?}"
    );
}

#[test]
fn blank_weather_key_is_treated_as_absent() {
    let mut map = HashMap::new();
    map.insert("KURYE_WEATHER_API_KEY", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.weather_api_key.is_none());
}

#[test]
fn debug_output_redacts_weather_key() {
    let mut map = HashMap::new();
    map.insert("KURYE_WEATHER_API_KEY", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn production_flag_follows_environment() {
    let mut map = HashMap::new();
    map.insert("KURYE_ENV", "production");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.is_production());
}
