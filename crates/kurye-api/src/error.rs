use kurye_core::CoreError;
use kurye_diagnostics::Failure;
use thiserror::Error;

/// Errors returned by the backend service clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connect, timeout, TLS, or reading the body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message} (HTTP {status} from {path})")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request was rejected before it was sent.
    #[error("invalid request: {0}")]
    Invalid(#[from] CoreError),

    #[error("local storage error: {0}")]
    Storage(#[from] kurye_core::StorageError),
}

impl ApiError {
    /// `true` when the request never got an answer from the backend.
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The message a caller can show as-is: the backend's own wording for
    /// status errors, the display text otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// `true` for errors raised while building, sending, or decoding a
    /// request. [`AuthenticatedClient`](crate::AuthenticatedClient) has
    /// already reported these; anything else was rejected before a request
    /// existed.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            ApiError::Http(_)
                | ApiError::Status { .. }
                | ApiError::Deserialize { .. }
                | ApiError::InvalidBaseUrl { .. }
        )
    }

    /// Converts into the classifier's failure shape.
    #[must_use]
    pub fn to_failure(&self) -> Failure {
        if self.is_network() {
            return Failure::network(self.to_string());
        }
        match (self, self.status()) {
            (_, Some(status)) => Failure::http(status, self.to_string()),
            (ApiError::Invalid(_), None) => Failure::validation(self.to_string()),
            _ => Failure::other(self.to_string()),
        }
    }
}

/// Pulls the human-readable message out of an error body.
///
/// The backend sends `{"detail": "..."}` for handled errors and
/// `{"detail": [{"msg": "...", ...}, ...]}` for request validation failures.
#[must_use]
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    match detail {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}
