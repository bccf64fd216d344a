// src/store/trip_store.rs
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::{AcikError, AcikResult};
use crate::models::alert::Alert;
use crate::models::trip::Trip;
use crate::store::snapshot::SnapshotSink;

/// The authoritative, mutable collection of trip records.
///
/// Every mutation goes through the write lock, so the tracking tick and
/// user intents never interleave on the same trip. Readers only ever get
/// clones; no `&mut Trip` escapes this module.
pub struct TripStore {
    trips: RwLock<HashMap<String, Trip>>,
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl TripStore {
    pub fn new() -> Self {
        Self {
            trips: RwLock::new(HashMap::new()),
            sink: None,
        }
    }

    pub fn with_trips(trips: Vec<Trip>) -> Self {
        Self {
            trips: RwLock::new(trips.into_iter().map(|t| (t.id.clone(), t)).collect()),
            sink: None,
        }
    }

    /// Attach a persistence sink; it is fired after every successful mutation.
    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn insert(&self, trip: Trip) {
        {
            let mut trips = self.trips.write().await;
            trips.insert(trip.id.clone(), trip);
        }
        self.persist().await;
    }

    pub async fn remove(&self, trip_id: &str) -> AcikResult<Trip> {
        let removed = {
            let mut trips = self.trips.write().await;
            trips
                .remove(trip_id)
                .ok_or_else(|| AcikError::trip_not_found(trip_id))?
        };
        self.persist().await;
        Ok(removed)
    }

    /// Remove a trip only if the guard accepts its current state. Guard and
    /// removal happen under one write lock, so no mutation can slip between.
    pub async fn remove_if<F>(&self, trip_id: &str, guard: F) -> AcikResult<Trip>
    where
        F: FnOnce(&Trip) -> AcikResult<()>,
    {
        let removed = {
            let mut trips = self.trips.write().await;
            let trip = trips
                .get(trip_id)
                .ok_or_else(|| AcikError::trip_not_found(trip_id))?;
            guard(trip)?;
            trips.remove(trip_id).ok_or_else(|| AcikError::trip_not_found(trip_id))?
        };
        self.persist().await;
        Ok(removed)
    }

    pub async fn get(&self, trip_id: &str) -> Option<Trip> {
        self.trips.read().await.get(trip_id).cloned()
    }

    pub async fn list(&self) -> Vec<Trip> {
        self.trips.read().await.values().cloned().collect()
    }

    pub async fn count_in_motion(&self) -> usize {
        self.trips
            .read()
            .await
            .values()
            .filter(|t| t.status.is_in_motion())
            .count()
    }

    /// Apply a mutation to one trip under the write lock.
    ///
    /// The closure works on a scratch copy: if it fails, the stored record is
    /// untouched. On success `last_updated` is stamped, monotonically
    /// non-decreasing.
    pub async fn with_trip_mut<T, F>(&self, trip_id: &str, f: F) -> AcikResult<T>
    where
        F: FnOnce(&mut Trip) -> AcikResult<T>,
    {
        let result = {
            let mut trips = self.trips.write().await;
            let trip = trips
                .get_mut(trip_id)
                .ok_or_else(|| AcikError::trip_not_found(trip_id))?;

            let mut working = trip.clone();
            let value = f(&mut working)?;
            working.last_updated = working.last_updated.max(Utc::now());
            *trip = working;
            value
        };
        self.persist().await;
        Ok(result)
    }

    /// Flip one alert to resolved, wherever it lives. Resolution is final.
    pub async fn resolve_alert(&self, alert_id: &str) -> AcikResult<Alert> {
        let resolved = {
            let mut trips = self.trips.write().await;
            let (trip, idx) = trips
                .values_mut()
                .find_map(|t| {
                    t.alerts
                        .iter()
                        .position(|a| a.id == alert_id)
                        .map(|idx| (t, idx))
                })
                .ok_or_else(|| AcikError::AlertNotFound(alert_id.to_string()))?;

            if trip.alerts[idx].resolved {
                return Err(AcikError::AlertAlreadyResolved(alert_id.to_string()));
            }
            trip.alerts[idx].resolved = true;
            trip.last_updated = trip.last_updated.max(Utc::now());
            trip.alerts[idx].clone()
        };
        self.persist().await;
        Ok(resolved)
    }

    async fn persist(&self) {
        if let Some(sink) = &self.sink {
            let trips = self.list().await;
            sink.write(trips).await;
        }
    }
}

impl Default for TripStore {
    fn default() -> Self {
        Self::new()
    }
}
