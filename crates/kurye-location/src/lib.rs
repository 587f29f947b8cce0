//! Device location for the courier app: permission prompts, a one-minute
//! fix cache, reverse geocoding, and throttled background tracking.

pub mod client;
pub mod error;
pub mod provider;

pub use client::{
    CacheStats, LocationClient, PermissionState, ResolvedAddress, TrackingSubscription,
    ADDRESS_NOT_FOUND, ADDRESS_UNAVAILABLE, CACHE_TTL, MIN_UPDATE_INTERVAL, UNKNOWN_ADDRESS,
};
pub use error::LocationError;
pub use provider::{
    FixedProvider, GeocodedAddress, LocationProvider, LocationSample, PermissionStatus,
    WatchOptions,
};
