//! Shared configuration, domain types, local storage and scan validation for
//! the courier client.

pub mod app_config;
pub mod config;
pub mod packages;
pub mod routes;
pub mod scan;
pub mod storage;
pub mod users;

mod timestamps;

use thiserror::Error;

pub use app_config::{
    ApiClientOptions, AppConfig, Environment, LocationAccuracy, LocationOptions,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use packages::{
    DeliveryStats, DeliveryStatusUpdate, DeliveryType, FailureReason, NewPackage, Package,
    PackageStatus, PackageUpdate,
};
pub use routes::{MapRegion, OptimizedRoute, RouteHistoryEntry, RouteStop, StartingLocation};
pub use scan::{
    check_new_package, is_valid_phone, sanitize_text, validate_coordinates, validate_package_data,
    validate_scan, SanitizedPayload, ScanError, ScanOutcome, ScanWarning,
};
pub use storage::{
    get_json, set_json, DefaultDepot, JsonFileStore, KeyValueStore, MemoryStore,
    NotificationSettings, StorageError, StorageKey,
};
pub use users::{ProfileUpdate, RegisterRequest, Session, UserProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    MissingRequired(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Domain rule violations detected before a request leaves the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("failure_reason is only allowed when status is failed (got {status})")]
    FailureReasonWithoutFailedStatus { status: PackageStatus },

    #[error("delivered_at is only allowed when status is delivered (got {status})")]
    DeliveredAtWithoutDeliveredStatus { status: PackageStatus },

    #[error("invalid package data: {}", .0.join("; "))]
    InvalidPackage(Vec<String>),
}
