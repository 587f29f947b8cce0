use thiserror::Error;

/// Device location error codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationErrorCode {
    Timeout,
    Unavailable,
    PermissionDenied,
    Other(String),
}

impl std::fmt::Display for LocationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationErrorCode::Timeout => write!(f, "E_LOCATION_TIMEOUT"),
            LocationErrorCode::Unavailable => write!(f, "E_LOCATION_UNAVAILABLE"),
            LocationErrorCode::PermissionDenied => write!(f, "E_LOCATION_PERMISSION_DENIED"),
            LocationErrorCode::Other(code) => write!(f, "{code}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never got a response.
    Network,
    Location(LocationErrorCode),
    /// The backend answered with a non-success status.
    Http { status: u16 },
    Scan,
    Validation,
    Other,
}

/// A failure in the shape the classifier understands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn location(code: LocationErrorCode, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Location(code), message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Http { status }, message)
    }

    pub fn scan(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Scan, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }
}
