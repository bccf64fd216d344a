// src/services/tracking_service.rs
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing;

use crate::models::alert::{Alert, AlertType};
use crate::models::trip::TrackingHealth;
use crate::store::TripStore;

pub const TRACKING_OFF_MESSAGE: &str = "CRITICAL: Driver signal lost mid-trip.";

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub tick_interval: Duration,
    /// Chance per tick that the driver's device stops sharing location.
    pub signal_loss_probability: f64,
    /// Maximum coordinate delta per tick, in degrees.
    pub jitter_magnitude: f64,
    /// An authorized fix older than this reads as STALE.
    pub stale_after: chrono::Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            signal_loss_probability: 0.02,
            jitter_magnitude: 0.0005,
            stale_after: chrono::Duration::seconds(30),
        }
    }
}

/// Advances vehicle position for in-flight trips on a fixed cadence and
/// degrades/restores the location-authorization signal.
///
/// Only trips in the in-motion set are ever touched. The background loop
/// parks itself once the set drains and `ensure_running` brings it back.
pub struct TrackingSimulator {
    store: Arc<TripStore>,
    rng: Arc<Mutex<StdRng>>,
    config: TrackingConfig,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl TrackingSimulator {
    pub fn new(store: Arc<TripStore>, config: TrackingConfig) -> Self {
        Self::with_rng(store, config, StdRng::from_os_rng())
    }

    /// Seeded variant so tests can pin the random stream.
    pub fn with_rng(store: Arc<TripStore>, config: TrackingConfig, rng: StdRng) -> Self {
        Self {
            store,
            rng: Arc::new(Mutex::new(rng)),
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: StdMutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the periodic loop if it is not already running. The loop exits
    /// on its own once no trip is in motion, so call this again whenever a
    /// trip (re)enters the in-motion set.
    pub fn ensure_running(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.store(false, Ordering::SeqCst);

        let store = Arc::clone(&self.store);
        let rng = Arc::clone(&self.rng);
        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        tracing::debug!("Tracking simulator starting, tick every {:?}", config.tick_interval);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.tick_interval);
            // The first tick of tokio's interval fires immediately; skip it so
            // positions only move after a full period.
            interval.tick().await;
            loop {
                interval.tick().await;
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                let touched = tick_store(&store, &rng, &config).await;
                if touched == 0 && store.count_in_motion().await == 0 {
                    tracing::debug!("No trips in motion, tracking simulator parking");
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        if let Ok(mut guard) = self.handle.lock() {
            *guard = Some(handle);
        }
    }

    /// Hard stop for teardown. Safe to call repeatedly; `ensure_running`
    /// restarts cleanly afterwards.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run a single tick synchronously. Returns how many trips were touched.
    pub async fn tick(&self) -> usize {
        tick_store(&self.store, &self.rng, &self.config).await
    }
}

impl Drop for TrackingSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_store(store: &TripStore, rng: &Mutex<StdRng>, config: &TrackingConfig) -> usize {
    let trips = store.list().await;
    let mut touched = 0;

    for trip in trips.iter().filter(|t| t.status.is_in_motion()) {
        let (lat_delta, lng_delta, signal_lost) = {
            let mut rng = rng.lock().await;
            (
                (rng.random::<f64>() - 0.4) * config.jitter_magnitude,
                (rng.random::<f64>() - 0.4) * config.jitter_magnitude,
                rng.random_bool(config.signal_loss_probability),
            )
        };

        let result = store
            .with_trip_mut(&trip.id, |t| {
                // Status may have changed between the list and this lock.
                if !t.status.is_in_motion() {
                    return Ok(false);
                }
                t.current_lat += lat_delta;
                t.current_lng += lng_delta;
                t.driver_location_authorized = !signal_lost;
                t.tracking_health = if signal_lost {
                    TrackingHealth::Critical
                } else {
                    TrackingHealth::Optimal
                };

                if signal_lost && !t.has_unresolved(AlertType::TrackingOff) {
                    tracing::warn!("Driver signal lost on trip {}", t.id);
                    let alert = Alert::new(&t.id, AlertType::TrackingOff, TRACKING_OFF_MESSAGE);
                    t.push_alert(alert);
                }
                Ok(true)
            })
            .await;

        match result {
            Ok(true) => touched += 1,
            Ok(false) => {}
            Err(err) => tracing::warn!("Tracking tick skipped trip {}: {}", trip.id, err),
        }
    }

    touched
}
