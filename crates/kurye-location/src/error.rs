use kurye_diagnostics::{Failure, LocationErrorCode};
use thiserror::Error;

/// Errors raised by a [`crate::LocationProvider`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("timed out waiting for a location fix")]
    Timeout,

    #[error("location is unavailable")]
    Unavailable,

    #[error("location permission denied")]
    PermissionDenied,

    #[error("location services are disabled")]
    ServicesDisabled,

    /// Any other platform error, with its platform code.
    #[error("location provider error {code}: {message}")]
    Provider { code: String, message: String },
}

impl LocationError {
    #[must_use]
    pub fn code(&self) -> LocationErrorCode {
        match self {
            LocationError::Timeout => LocationErrorCode::Timeout,
            LocationError::Unavailable | LocationError::ServicesDisabled => {
                LocationErrorCode::Unavailable
            }
            LocationError::PermissionDenied => LocationErrorCode::PermissionDenied,
            LocationError::Provider { code, .. } => LocationErrorCode::Other(code.clone()),
        }
    }

    #[must_use]
    pub fn to_failure(&self) -> Failure {
        Failure::location(self.code(), self.to_string())
    }

    /// Whether asking again could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocationError::Timeout | LocationError::Unavailable)
    }
}
