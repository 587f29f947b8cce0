use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use kurye_core::{LocationAccuracy, LocationOptions};
use kurye_diagnostics::{Category, Dialog, DialogButton, ErrorReporter, Presenter};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::*;
use crate::provider::FixedProvider;

fn sample(latitude: f64, longitude: f64) -> LocationSample {
    LocationSample {
        latitude,
        longitude,
        accuracy: Some(5.0),
        timestamp: Utc::now(),
    }
}

struct FakeProvider {
    services_on: AtomicBool,
    permission: Mutex<PermissionStatus>,
    hang: AtomicBool,
    fixes: Mutex<VecDeque<Result<LocationSample, LocationError>>>,
    geocode: Mutex<Result<Vec<GeocodedAddress>, LocationError>>,
    permission_calls: AtomicU32,
    position_calls: AtomicU32,
    watch_calls: AtomicU32,
    watch_tx: Mutex<Option<mpsc::Sender<LocationSample>>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            services_on: AtomicBool::new(true),
            permission: Mutex::new(PermissionStatus::Granted),
            hang: AtomicBool::new(false),
            fixes: Mutex::new(VecDeque::new()),
            geocode: Mutex::new(Ok(Vec::new())),
            permission_calls: AtomicU32::new(0),
            position_calls: AtomicU32::new(0),
            watch_calls: AtomicU32::new(0),
            watch_tx: Mutex::new(None),
        }
    }
}

impl FakeProvider {
    fn with_fixes(fixes: impl IntoIterator<Item = Result<LocationSample, LocationError>>) -> Self {
        Self {
            fixes: Mutex::new(fixes.into_iter().collect()),
            ..Self::default()
        }
    }

    fn sender(&self) -> mpsc::Sender<LocationSample> {
        self.watch_tx.lock().unwrap().clone().unwrap()
    }
}

impl LocationProvider for FakeProvider {
    async fn services_enabled(&self) -> Result<bool, LocationError> {
        Ok(self.services_on.load(Ordering::SeqCst))
    }

    async fn request_foreground_permission(&self) -> Result<PermissionStatus, LocationError> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.permission.lock().unwrap())
    }

    async fn current_position(
        &self,
        _options: &LocationOptions,
    ) -> Result<LocationSample, LocationError> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let next = self.fixes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(sample(41.0082, 28.9784)))
    }

    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<GeocodedAddress>, LocationError> {
        self.geocode.lock().unwrap().clone()
    }

    async fn watch_positions(
        &self,
        _options: WatchOptions,
    ) -> Result<mpsc::Receiver<LocationSample>, LocationError> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(8);
        *self.watch_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

#[derive(Default)]
struct RecordingPresenter {
    dialogs: Mutex<Vec<Dialog>>,
}

impl RecordingPresenter {
    fn titles(&self) -> Vec<String> {
        self.dialogs
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.title.clone())
            .collect()
    }

    fn last(&self) -> Dialog {
        self.dialogs.lock().unwrap().last().cloned().unwrap()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, dialog: Dialog) {
        self.dialogs.lock().unwrap().push(dialog);
    }
}

struct Harness<P: LocationProvider> {
    client: LocationClient<P>,
    provider: Arc<P>,
    reporter: Arc<ErrorReporter>,
    presenter: Arc<RecordingPresenter>,
}

fn harness<P: LocationProvider>(provider: P) -> Harness<P> {
    let provider = Arc::new(provider);
    let reporter = Arc::new(ErrorReporter::new(false));
    let presenter = Arc::new(RecordingPresenter::default());
    let options = LocationOptions {
        timeout: Duration::from_secs(15),
        accuracy: LocationAccuracy::High,
    };
    let client = LocationClient::new(
        Arc::clone(&provider),
        options,
        Arc::clone(&reporter),
        Arc::clone(&presenter) as Arc<dyn Presenter>,
    );
    Harness {
        client,
        provider,
        reporter,
        presenter,
    }
}

#[tokio::test(start_paused = true)]
async fn fix_is_served_from_cache_for_a_minute() {
    let h = harness(FakeProvider::default());

    let first = h.client.get_current_location(true).await.unwrap();
    let second = h.client.get_current_location(true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.provider.position_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.permission_calls.load(Ordering::SeqCst), 1);
    assert!(h.client.cache_stats().is_fresh);

    tokio::time::advance(Duration::from_secs(61)).await;
    let stats = h.client.cache_stats();
    assert!(stats.has_sample);
    assert!(!stats.is_fresh);

    h.client.get_current_location(true).await.unwrap();
    assert_eq!(h.provider.position_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn bypassing_the_cache_always_asks_the_device() {
    let h = harness(FakeProvider::default());

    h.client.get_current_location(true).await.unwrap();
    h.client.get_current_location(false).await.unwrap();
    assert_eq!(h.provider.position_calls.load(Ordering::SeqCst), 2);

    h.client.clear_cache();
    assert!(!h.client.cache_stats().has_sample);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_reported_and_offers_retry() {
    let provider = FakeProvider::default();
    provider.hang.store(true, Ordering::SeqCst);
    let h = harness(provider);

    assert!(h.client.get_current_location(true).await.is_none());

    let stats = h.reporter.stats();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.by_category.get(&Category::Location), Some(&1));
    assert_eq!(stats.recent[0].context, "LocationClient.get_current_location");

    let dialog = h.presenter.last();
    assert_eq!(dialog.title, "Location Error");
    let labels: Vec<_> = dialog.buttons.iter().map(DialogButton::label).collect();
    assert_eq!(labels, ["Retry", "Cancel"]);

    assert!(!h.client.take_retry_request());
    assert!(dialog.retry());
    assert!(h.client.take_retry_request());
    assert!(!h.client.take_retry_request());
    assert!(!h.client.cache_stats().has_sample);
}

#[tokio::test]
async fn platform_error_has_no_retry() {
    let h = harness(FakeProvider::with_fixes([Err(LocationError::Provider {
        code: "E_GPS_FAULT".to_owned(),
        message: "chip reset".to_owned(),
    })]));

    assert!(h.client.get_current_location(false).await.is_none());

    let dialog = h.presenter.last();
    let labels: Vec<_> = dialog.buttons.iter().map(DialogButton::label).collect();
    assert_eq!(labels, ["OK"]);
    assert_eq!(dialog.message, "Location service error.");
}

#[tokio::test]
async fn denied_permission_yields_nothing() {
    let provider = FakeProvider::default();
    *provider.permission.lock().unwrap() = PermissionStatus::Denied;
    let h = harness(provider);

    assert!(h.client.get_current_location(true).await.is_none());
    assert_eq!(h.provider.position_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.client.permission_state(), PermissionState::Denied);
    assert_eq!(h.presenter.titles(), ["Location Permission Required"]);
    assert_eq!(h.reporter.stats().total, 0);
}

#[tokio::test]
async fn disabled_services_are_reported_before_asking_permission() {
    let provider = FakeProvider::default();
    provider.services_on.store(false, Ordering::SeqCst);
    let h = harness(provider);

    assert!(!h.client.request_permission().await);
    assert_eq!(h.provider.permission_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.client.permission_state(), PermissionState::Unchecked);
    assert_eq!(h.presenter.titles(), ["Location Services Off"]);
}

#[tokio::test]
async fn address_joins_the_present_parts() {
    let provider = FakeProvider::default();
    *provider.geocode.lock().unwrap() = Ok(vec![GeocodedAddress {
        name: Some("Galata Kulesi".to_owned()),
        street: Some("Bereketzade".to_owned()),
        district: Some("  ".to_owned()),
        city: Some("İstanbul".to_owned()),
        ..GeocodedAddress::default()
    }]);
    let h = harness(provider);

    let resolved = h.client.get_address_from_coordinates(41.0256, 28.9741).await;
    assert_eq!(resolved.formatted, "Galata Kulesi, Bereketzade, İstanbul");
    assert_eq!(
        resolved.details.and_then(|d| d.city).as_deref(),
        Some("İstanbul")
    );
}

#[tokio::test]
async fn address_sentinels() {
    let h = harness(FakeProvider::default());
    let resolved = h.client.get_address_from_coordinates(0.0, 0.0).await;
    assert_eq!(resolved.formatted, ADDRESS_NOT_FOUND);
    assert!(resolved.details.is_none());

    *h.provider.geocode.lock().unwrap() = Ok(vec![GeocodedAddress::default()]);
    let resolved = h.client.get_address_from_coordinates(0.0, 0.0).await;
    assert_eq!(resolved.formatted, UNKNOWN_ADDRESS);
    assert!(resolved.details.is_some());

    *h.provider.geocode.lock().unwrap() = Err(LocationError::Unavailable);
    let resolved = h.client.get_address_from_coordinates(0.0, 0.0).await;
    assert_eq!(resolved.formatted, ADDRESS_UNAVAILABLE);
    assert_eq!(h.reporter.stats().total, 0);
}

#[tokio::test(start_paused = true)]
async fn tracking_is_idempotent_and_throttled() {
    let h = harness(FakeProvider::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let first = h
        .client
        .start_location_tracking(move |s| sink.lock().unwrap().push(s.latitude))
        .await
        .unwrap();
    let again = h.client.start_location_tracking(|_| {}).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(h.provider.watch_calls.load(Ordering::SeqCst), 1);
    assert!(h.client.is_tracking());

    let tx = h.provider.sender();
    tx.send(sample(1.0, 1.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    tx.send(sample(2.0, 2.0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    tx.send(sample(3.0, 3.0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(*seen.lock().unwrap(), [1.0, 3.0]);

    // Tracking keeps the cache warm.
    let cached = h.client.get_current_location(true).await.unwrap();
    assert!((cached.latitude - 3.0).abs() < f64::EPSILON);
    assert_eq!(h.provider.position_calls.load(Ordering::SeqCst), 0);

    h.client.stop_location_tracking();
    assert!(!h.client.is_tracking());
    assert!(!h.client.cache_stats().tracking);
    h.client.stop_location_tracking();
}

#[tokio::test]
async fn tracking_needs_permission() {
    let provider = FakeProvider::default();
    *provider.permission.lock().unwrap() = PermissionStatus::Undetermined;
    let h = harness(provider);

    assert!(h.client.start_location_tracking(|_| {}).await.is_none());
    assert_eq!(h.provider.watch_calls.load(Ordering::SeqCst), 0);
    assert!(!h.client.is_tracking());
}

#[tokio::test]
async fn tracking_ends_with_the_watch() {
    let h = harness(FixedProvider::new(39.9334, 32.8597, GeocodedAddress::default()));
    let seen = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&seen);

    h.client
        .start_location_tracking(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    for _ in 0..10 {
        if !h.client.is_tracking() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(!h.client.is_tracking());
}

#[test]
fn throttle_spaces_updates() {
    let mut throttle = Throttle::default();
    let t0 = Instant::now();
    assert!(throttle.accept(t0));
    assert!(!throttle.accept(t0 + Duration::from_secs(1)));
    assert!(throttle.accept(t0 + MIN_UPDATE_INTERVAL));
    assert!(!throttle.accept(t0 + Duration::from_secs(3)));
}
