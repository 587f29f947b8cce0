//! Permission handling, a short-lived fix cache, and background tracking on
//! top of a [`LocationProvider`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use kurye_core::LocationOptions;
use kurye_diagnostics::{Dialog, ErrorReporter, PresentOptions, Presenter, RetryHook};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::LocationError;
use crate::provider::{
    GeocodedAddress, LocationProvider, LocationSample, PermissionStatus, WatchOptions,
};

/// How long a fix is served from the cache.
pub const CACHE_TTL: Duration = Duration::from_secs(60);
/// Minimum spacing between tracking updates handed to the callback.
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(2);

pub const UNKNOWN_ADDRESS: &str = "Unknown address";
pub const ADDRESS_NOT_FOUND: &str = "Address not found";
pub const ADDRESS_UNAVAILABLE: &str = "Address unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unchecked,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAddress {
    pub formatted: String,
    pub details: Option<GeocodedAddress>,
}

impl ResolvedAddress {
    fn sentinel(formatted: &str) -> Self {
        Self {
            formatted: formatted.to_owned(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub has_sample: bool,
    pub age: Option<Duration>,
    pub is_fresh: bool,
    pub tracking: bool,
}

/// Handle identifying one tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSubscription {
    pub id: u64,
}

#[derive(Debug, Clone)]
struct CachedSample {
    sample: LocationSample,
    stored_at: Instant,
}

type SampleCache = Arc<Mutex<Option<CachedSample>>>;

struct Tracking {
    subscription: TrackingSubscription,
    handle: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn store_sample(cache: &Mutex<Option<CachedSample>>, sample: LocationSample) {
    *lock(cache) = Some(CachedSample {
        sample,
        stored_at: Instant::now(),
    });
}

/// Drops updates that arrive sooner than [`MIN_UPDATE_INTERVAL`] after the
/// last accepted one.
#[derive(Debug, Default)]
pub(crate) struct Throttle {
    last_accepted: Option<Instant>,
}

impl Throttle {
    pub(crate) fn accept(&mut self, now: Instant) -> bool {
        if self
            .last_accepted
            .is_some_and(|last| now.saturating_duration_since(last) < MIN_UPDATE_INTERVAL)
        {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }
}

pub struct LocationClient<P: LocationProvider> {
    provider: Arc<P>,
    options: LocationOptions,
    reporter: Arc<ErrorReporter>,
    presenter: Arc<dyn Presenter>,
    permission: Mutex<PermissionState>,
    cache: SampleCache,
    tracking: Mutex<Option<Tracking>>,
    next_subscription: AtomicU64,
    retry_requested: Arc<AtomicBool>,
}

impl<P: LocationProvider> LocationClient<P> {
    pub fn new(
        provider: Arc<P>,
        options: LocationOptions,
        reporter: Arc<ErrorReporter>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            provider,
            options,
            reporter,
            presenter,
            permission: Mutex::new(PermissionState::Unchecked),
            cache: Arc::new(Mutex::new(None)),
            tracking: Mutex::new(None),
            next_subscription: AtomicU64::new(1),
            retry_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn permission_state(&self) -> PermissionState {
        *lock(&self.permission)
    }

    /// Asks for foreground permission, prompting the user on any problem.
    /// Never fails: every problem ends in `false`.
    pub async fn request_permission(&self) -> bool {
        match self.provider.services_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                self.presenter.present(Dialog::notice(
                    "Location Services Off",
                    "Turn on location services on your device.",
                ));
                return false;
            }
            Err(e) => return self.permission_failed(&e),
        }

        match self.provider.request_foreground_permission().await {
            Ok(PermissionStatus::Granted) => {
                *lock(&self.permission) = PermissionState::Granted;
                tracing::debug!("location permission granted");
                true
            }
            Ok(status) => {
                *lock(&self.permission) = PermissionState::Denied;
                tracing::info!(?status, "location permission not granted");
                self.presenter.present(Dialog::notice(
                    "Location Permission Required",
                    "Location permission is needed to set your starting point automatically.",
                ));
                false
            }
            Err(e) => self.permission_failed(&e),
        }
    }

    fn permission_failed(&self, err: &LocationError) -> bool {
        tracing::warn!(error = %err, "location permission request failed");
        self.presenter.present(Dialog::notice(
            "Error",
            "Something went wrong while requesting location permission.",
        ));
        false
    }

    async fn ensure_permission(&self) -> bool {
        self.permission_state() == PermissionState::Granted || self.request_permission().await
    }

    /// The device position, served from the cache when `use_cache` is set
    /// and the cached fix is under a minute old.
    ///
    /// Failures are classified and shown to the user; timeouts and
    /// unavailability offer a retry (see [`Self::take_retry_request`]).
    pub async fn get_current_location(&self, use_cache: bool) -> Option<LocationSample> {
        if use_cache {
            if let Some(sample) = self.fresh_sample() {
                tracing::debug!("serving cached location");
                return Some(sample);
            }
        }

        if !self.ensure_permission().await {
            return None;
        }

        let fix = tokio::time::timeout(
            self.options.timeout,
            self.provider.current_position(&self.options),
        )
        .await
        .unwrap_or(Err(LocationError::Timeout));

        match fix {
            Ok(sample) => {
                tracing::debug!(
                    latitude = sample.latitude,
                    longitude = sample.longitude,
                    accuracy = ?sample.accuracy,
                    "location fix"
                );
                store_sample(&self.cache, sample.clone());
                Some(sample)
            }
            Err(err) => {
                let options = if err.is_retryable() {
                    PresentOptions::with_retry(self.retry_hook())
                } else {
                    PresentOptions::default()
                };
                self.reporter.handle(
                    &err.to_failure(),
                    "LocationClient.get_current_location",
                    &options,
                    self.presenter.as_ref(),
                );
                None
            }
        }
    }

    fn retry_hook(&self) -> RetryHook {
        let flag = Arc::clone(&self.retry_requested);
        Arc::new(move || flag.store(true, Ordering::SeqCst))
    }

    /// `true` once if the user picked "Retry" on a location error dialog.
    pub fn take_retry_request(&self) -> bool {
        self.retry_requested.swap(false, Ordering::SeqCst)
    }

    /// Reverse-geocodes a position. Never fails: problems come back as one of
    /// the sentinel addresses.
    pub async fn get_address_from_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> ResolvedAddress {
        match self.provider.reverse_geocode(latitude, longitude).await {
            Ok(results) => match results.into_iter().next() {
                Some(address) => ResolvedAddress {
                    formatted: format_address(&address),
                    details: Some(address),
                },
                None => ResolvedAddress::sentinel(ADDRESS_NOT_FOUND),
            },
            Err(e) => {
                tracing::warn!(error = %e, latitude, longitude, "reverse geocoding failed");
                ResolvedAddress::sentinel(ADDRESS_UNAVAILABLE)
            }
        }
    }

    /// Starts watching the position. Each accepted update refreshes the cache
    /// and is then passed to `on_update`.
    ///
    /// Returns the running subscription if tracking is already on, and `None`
    /// when permission is missing or the watch cannot start.
    pub async fn start_location_tracking<F>(&self, on_update: F) -> Option<TrackingSubscription>
    where
        F: FnMut(LocationSample) + Send + 'static,
    {
        if let Some(existing) = self.running_subscription() {
            tracing::warn!(id = existing.id, "location tracking already running");
            return Some(existing);
        }

        if !self.ensure_permission().await {
            return None;
        }

        let receiver = match self
            .provider
            .watch_positions(WatchOptions::new(self.options.accuracy))
            .await
        {
            Ok(rx) => rx,
            Err(err) => {
                self.reporter
                    .report(&err.to_failure(), "LocationClient.start_location_tracking");
                return None;
            }
        };

        let mut tracking = lock(&self.tracking);
        if let Some(existing) = tracking.as_ref().filter(|t| !t.handle.is_finished()) {
            // Another caller started tracking while we awaited the watch.
            return Some(existing.subscription);
        }

        let subscription = TrackingSubscription {
            id: self.next_subscription.fetch_add(1, Ordering::Relaxed),
        };
        let handle = tokio::spawn(track(receiver, Arc::clone(&self.cache), on_update));
        *tracking = Some(Tracking {
            subscription,
            handle,
        });
        tracing::info!(id = subscription.id, "location tracking started");
        Some(subscription)
    }

    fn running_subscription(&self) -> Option<TrackingSubscription> {
        lock(&self.tracking)
            .as_ref()
            .filter(|t| !t.handle.is_finished())
            .map(|t| t.subscription)
    }

    /// Stops tracking. A no-op when nothing is running.
    pub fn stop_location_tracking(&self) {
        if let Some(tracking) = lock(&self.tracking).take() {
            tracking.handle.abort();
            tracing::info!(id = tracking.subscription.id, "location tracking stopped");
        }
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.running_subscription().is_some()
    }

    pub fn clear_cache(&self) {
        *lock(&self.cache) = None;
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        let cached = lock(&self.cache).clone();
        let age = cached.as_ref().map(|c| c.stored_at.elapsed());
        CacheStats {
            has_sample: cached.is_some(),
            age,
            is_fresh: age.is_some_and(|a| a < CACHE_TTL),
            tracking: self.is_tracking(),
        }
    }

    fn fresh_sample(&self) -> Option<LocationSample> {
        lock(&self.cache)
            .as_ref()
            .filter(|c| c.stored_at.elapsed() < CACHE_TTL)
            .map(|c| c.sample.clone())
    }
}

impl<P: LocationProvider> Drop for LocationClient<P> {
    fn drop(&mut self) {
        if let Some(tracking) = lock(&self.tracking).take() {
            tracking.handle.abort();
        }
    }
}

async fn track<F>(
    mut receiver: mpsc::Receiver<LocationSample>,
    cache: SampleCache,
    mut on_update: F,
) where
    F: FnMut(LocationSample) + Send + 'static,
{
    let mut throttle = Throttle::default();
    while let Some(sample) = receiver.recv().await {
        if !throttle.accept(Instant::now()) {
            tracing::trace!("location update throttled");
            continue;
        }
        store_sample(&cache, sample.clone());
        on_update(sample);
    }
    tracing::debug!("location watch ended");
}

/// Joins the non-empty address parts, most specific first.
fn format_address(address: &GeocodedAddress) -> String {
    let joined = [
        &address.name,
        &address.street,
        &address.district,
        &address.city,
        &address.region,
    ]
    .into_iter()
    .filter_map(|part| part.as_deref().map(str::trim).filter(|p| !p.is_empty()))
    .collect::<Vec<_>>()
    .join(", ");

    if joined.is_empty() {
        UNKNOWN_ADDRESS.to_owned()
    } else {
        joined
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
