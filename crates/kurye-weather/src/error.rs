use thiserror::Error;

/// Errors from the weather provider. The public client methods swallow these
/// and fall back to the default reading; they surface only from
/// [`crate::WeatherClient::try_current`].
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid weather API URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("no weather API key configured")]
    MissingKey,
}
