use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Requested accuracy for device location fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationAccuracy {
    Lowest,
    Low,
    Balanced,
    High,
    Highest,
}

impl std::fmt::Display for LocationAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LocationAccuracy::Lowest => "lowest",
            LocationAccuracy::Low => "low",
            LocationAccuracy::Balanced => "balanced",
            LocationAccuracy::High => "high",
            LocationAccuracy::Highest => "highest",
        };
        f.write_str(s)
    }
}

/// Settings every backend client is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Headers sent on every request, before any bearer token.
    pub default_headers: Vec<(&'static str, String)>,
    /// Log every request and response at debug level.
    pub verbose: bool,
    /// Fixed delay before the single network-error retry.
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    pub timeout: Duration,
    pub accuracy: LocationAccuracy,
}

/// Process-wide configuration, loaded once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub debug_mode: bool,
    pub app_name: String,
    pub app_version: String,
    pub location_timeout_ms: u64,
    pub location_accuracy: LocationAccuracy,
    pub log_level: String,
    pub retry_backoff_ms: u64,
    pub storage_path: PathBuf,
    pub weather_api_url: String,
    pub weather_api_key: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn api_client_options(&self) -> ApiClientOptions {
        ApiClientOptions {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_millis(self.api_timeout_ms),
            default_headers: vec![
                ("Content-Type", "application/json".to_owned()),
                ("X-App-Version", self.app_version.clone()),
            ],
            verbose: self.should_log(),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    #[must_use]
    pub fn location_options(&self) -> LocationOptions {
        LocationOptions {
            timeout: Duration::from_millis(self.location_timeout_ms),
            accuracy: self.location_accuracy,
        }
    }

    /// Whether diagnostic logging of requests and classified errors is on.
    #[must_use]
    pub fn should_log(&self) -> bool {
        self.debug_mode
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_ms", &self.api_timeout_ms)
            .field("debug_mode", &self.debug_mode)
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("location_timeout_ms", &self.location_timeout_ms)
            .field("location_accuracy", &self.location_accuracy)
            .field("log_level", &self.log_level)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("storage_path", &self.storage_path)
            .field("weather_api_url", &self.weather_api_url)
            .field(
                "weather_api_key",
                &self.weather_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
