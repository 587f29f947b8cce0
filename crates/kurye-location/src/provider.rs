//! The device side of location: permission, fixes, geocoding, watching.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kurye_core::{LocationAccuracy, LocationOptions};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::LocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// One position fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the platform reports it.
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// One reverse-geocoding result. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeocodedAddress {
    pub name: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Filters for a position watch: an update is delivered only after both the
/// interval has passed and the device has moved the given distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub accuracy: LocationAccuracy,
    pub time_interval: Duration,
    pub distance_interval_m: f64,
}

impl WatchOptions {
    pub const DEFAULT_TIME_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_DISTANCE_M: f64 = 10.0;

    #[must_use]
    pub fn new(accuracy: LocationAccuracy) -> Self {
        Self {
            accuracy,
            time_interval: Self::DEFAULT_TIME_INTERVAL,
            distance_interval_m: Self::DEFAULT_DISTANCE_M,
        }
    }
}

/// Platform location services.
///
/// Implementations wrap whatever the host offers (a phone SDK, gpsd, a
/// fixed position for a desktop); tests use an in-memory fake.
pub trait LocationProvider: Send + Sync + 'static {
    fn services_enabled(&self) -> impl Future<Output = Result<bool, LocationError>> + Send;

    fn request_foreground_permission(
        &self,
    ) -> impl Future<Output = Result<PermissionStatus, LocationError>> + Send;

    /// A single fix at the requested accuracy. The client enforces
    /// `options.timeout` itself as well.
    fn current_position(
        &self,
        options: &LocationOptions,
    ) -> impl Future<Output = Result<LocationSample, LocationError>> + Send;

    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Vec<GeocodedAddress>, LocationError>> + Send;

    /// Starts a watch. The watch ends when the receiver is dropped.
    fn watch_positions(
        &self,
        options: WatchOptions,
    ) -> impl Future<Output = Result<mpsc::Receiver<LocationSample>, LocationError>> + Send;
}

/// A provider that always reports the same position. Useful where no real
/// location source exists, such as the command line.
#[derive(Debug, Clone)]
pub struct FixedProvider {
    latitude: f64,
    longitude: f64,
    address: GeocodedAddress,
}

impl FixedProvider {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, address: GeocodedAddress) -> Self {
        Self {
            latitude,
            longitude,
            address,
        }
    }

    fn sample(&self) -> LocationSample {
        LocationSample {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }
}

impl LocationProvider for FixedProvider {
    async fn services_enabled(&self) -> Result<bool, LocationError> {
        Ok(true)
    }

    async fn request_foreground_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn current_position(
        &self,
        _options: &LocationOptions,
    ) -> Result<LocationSample, LocationError> {
        Ok(self.sample())
    }

    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<GeocodedAddress>, LocationError> {
        Ok(vec![self.address.clone()])
    }

    async fn watch_positions(
        &self,
        _options: WatchOptions,
    ) -> Result<mpsc::Receiver<LocationSample>, LocationError> {
        let (tx, rx) = mpsc::channel(1);
        // The sender is dropped after one fix, which ends the watch.
        let _ = tx.try_send(self.sample());
        Ok(rx)
    }
}
