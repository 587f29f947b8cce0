//! The per-service HTTP wrapper.
//!
//! Each backend service owns one [`AuthenticatedClient`]: its own
//! `reqwest::Client`, base URL, default headers and bearer token. Only the
//! [`ErrorReporter`] is shared. Failed calls are reported to it silently;
//! deciding whether a user sees anything is left to the caller.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use kurye_core::ApiClientOptions;
use kurye_diagnostics::ErrorReporter;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{extract_detail, ApiError};
use crate::retry::retry_with_backoff;

/// Network failures get exactly one more attempt.
const MAX_RETRIES: u32 = 1;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AuthenticatedClient {
    service: &'static str,
    client: Client,
    base_url: Url,
    auth_header: RwLock<Option<HeaderValue>>,
    verbose: bool,
    retry_backoff: Duration,
    reporter: Arc<ErrorReporter>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("service", &self.service)
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.has_auth_token())
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    /// Builds a client for `service` (used in log lines and error contexts).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHeader`] if a default header is malformed,
    /// [`ApiError::InvalidBaseUrl`] if the base URL does not parse, or
    /// [`ApiError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn new(
        service: &'static str,
        options: &ApiClientOptions,
        reporter: Arc<ErrorReporter>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        for (raw_name, raw_value) in &options.default_headers {
            let invalid = |reason: String| ApiError::InvalidHeader {
                name: (*raw_name).to_owned(),
                reason,
            };
            let name = HeaderName::from_bytes(raw_name.as_bytes())
                .map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(raw_value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(options.timeout))
            .user_agent(concat!("kurye/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        // A trailing slash keeps any path prefix in the base URL when joining.
        let normalised = format!("{}/", options.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: options.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            service,
            client,
            base_url,
            auth_header: RwLock::new(None),
            verbose: options.verbose,
            retry_backoff: options.retry_backoff,
            reporter,
        })
    }

    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sets or clears the `Authorization: Bearer` header for later requests.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHeader`] if the token contains characters
    /// that cannot appear in a header. The previous header is left in place.
    pub fn set_auth_token(&self, token: Option<&str>) -> Result<(), ApiError> {
        let value = token
            .map(|t| {
                HeaderValue::from_str(&format!("Bearer {t}")).map_err(|e| {
                    ApiError::InvalidHeader {
                        name: AUTHORIZATION.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .transpose()?
            .map(|mut v| {
                v.set_sensitive(true);
                v
            });

        *self
            .auth_header
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value;

        if self.verbose {
            tracing::debug!(
                service = self.service,
                authenticated = token.is_some(),
                "auth token updated"
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn has_auth_token(&self) -> bool {
        self.auth_header
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Resolves `path` against the base URL and appends `query`, encoded.
    pub(crate) fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> Result<T, ApiError> {
        self.call::<(), T>(Method::GET, path, query, None, fallback).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::POST, path, &[], Some(body), fallback).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PUT, path, &[], Some(body), fallback).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.call(Method::PATCH, path, &[], Some(body), fallback).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ApiError> {
        self.call::<(), T>(Method::DELETE, path, &[], None, fallback).await
    }

    /// Sends the request and decodes the success body. A body that does not
    /// decode is reported under the same context as a failed request.
    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        fallback: &str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let context = format!("{}.{method} {path}", self.service);
        let text = self
            .send(method, path, query, body, fallback, &context)
            .await?;
        decode(&text, path).inspect_err(|err| {
            self.reporter.report(&err.to_failure(), &context);
        })
    }

    /// Sends a request, reporting every failed attempt and retrying once on
    /// network errors. Returns the raw success body.
    ///
    /// `fallback` is the error message used when a failed response carries
    /// no `detail`.
    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        fallback: &str,
        context: &str,
    ) -> Result<String, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.build_url(path, query).inspect_err(|err| {
            self.reporter.report(&err.to_failure(), context);
        })?;

        retry_with_backoff(MAX_RETRIES, self.retry_backoff, || {
            let method = method.clone();
            let url = &url;
            async move {
                let result = self.execute_once(method, path, url, body, fallback).await;
                if let Err(err) = &result {
                    self.reporter.report(&err.to_failure(), context);
                }
                result
            }
        })
        .await
    }

    async fn execute_once<B>(
        &self,
        method: Method,
        path: &str,
        url: &Url,
        body: Option<&B>,
        fallback: &str,
    ) -> Result<String, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let auth = self
            .auth_header
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if self.verbose {
            tracing::debug!(
                service = self.service,
                method = %method,
                path,
                authenticated = auth.is_some(),
                "request"
            );
        }

        let mut request = self.client.request(method, url.clone());
        if let Some(value) = auth {
            request = request.header(AUTHORIZATION, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_owned(),
                message: extract_detail(&text).unwrap_or_else(|| fallback.to_owned()),
            });
        }

        if self.verbose {
            tracing::debug!(
                service = self.service,
                status = status.as_u16(),
                path,
                "response"
            );
        }
        Ok(text)
    }
}

/// Parses a success body. An empty body decodes as JSON `null`, so callers
/// asking for an `Option` get `None` rather than an error.
fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|source| ApiError::Deserialize {
        context: context.to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
