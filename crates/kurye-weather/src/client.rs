//! HTTP client for a WeatherAPI-compatible current-conditions endpoint.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::conditions::clean_city_name;
use crate::error::WeatherError;
use crate::types::{CurrentResponse, WeatherReading};

const LANGUAGE: &str = "tr";

/// Looks up current weather. Every lookup resolves to a reading: without an
/// API key, or on any failure, callers get [`WeatherReading::fallback`].
pub struct WeatherClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl WeatherClient {
    /// `api_url` is the API root; requests go to `{api_url}/current.json`.
    /// A blank `api_key` counts as none.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`WeatherError::InvalidBaseUrl`] if `api_url` does not
    /// parse.
    pub fn new(
        api_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("kurye/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let normalised = format!("{}/", api_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("current.json"))
            .map_err(|e| WeatherError::InvalidBaseUrl {
                url: api_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
        })
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn current_by_coordinates(&self, latitude: f64, longitude: f64) -> WeatherReading {
        self.current_or_fallback(&format!("{latitude},{longitude}"))
            .await
    }

    pub async fn current_by_city(&self, city: &str) -> WeatherReading {
        self.current_or_fallback(city).await
    }

    /// Weather at the depot: the cleaned city if known, else the raw address,
    /// else Istanbul.
    pub async fn depot_weather(
        &self,
        depot_address: Option<&str>,
        depot_city: Option<&str>,
    ) -> WeatherReading {
        let non_blank = |s: &&str| !s.trim().is_empty();
        let query = match (depot_city.filter(non_blank), depot_address.filter(non_blank)) {
            (Some(city), _) => clean_city_name(city),
            (None, Some(address)) => address.to_owned(),
            (None, None) => clean_city_name(""),
        };
        tracing::debug!(query = %query, "fetching depot weather");
        self.current_or_fallback(&query).await
    }

    async fn current_or_fallback(&self, query: &str) -> WeatherReading {
        match self.try_current(query).await {
            Ok(reading) => reading,
            Err(WeatherError::MissingKey) => {
                tracing::debug!("no weather API key; using the default reading");
                WeatherReading::fallback()
            }
            Err(e) => {
                tracing::warn!(error = %e, query, "weather lookup failed; using the default reading");
                WeatherReading::fallback()
            }
        }
    }

    /// One lookup for a free-form query (a city or `"lat,lon"`), with errors.
    ///
    /// # Errors
    ///
    /// - [`WeatherError::MissingKey`] when no API key is configured.
    /// - [`WeatherError::Http`] on network failure or a non-2xx status.
    /// - [`WeatherError::Deserialize`] if the body has an unexpected shape.
    pub async fn try_current(&self, query: &str) -> Result<WeatherReading, WeatherError> {
        let key = self.api_key.as_deref().ok_or(WeatherError::MissingKey)?;
        let url = self.build_url(key, query);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let raw: CurrentResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Deserialize {
                context: format!("current.json(q={query})"),
                source: e,
            })?;
        Ok(raw.into())
    }

    fn build_url(&self, key: &str, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("q", query)
            .append_pair("lang", LANGUAGE);
        url
    }
}
