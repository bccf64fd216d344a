// src/services/coordination_service.rs
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::errors::{AcikError, AcikResult};
use crate::models::trip::{CoordinationSignal, TripResponse, TripStatus};
use crate::services::notify_service::NotificationService;
use crate::store::TripStore;

/// One transient situational flag per trip, settable by any party and
/// visible to all of them. Orthogonal to trip status, except for the staff
/// arrival confirmation which pairs the flag with completion.
pub struct CoordinationService {
    store: Arc<TripStore>,
    notification_service: Arc<dyn NotificationService>,
}

impl CoordinationService {
    pub fn new(store: Arc<TripStore>, notification_service: Arc<dyn NotificationService>) -> Self {
        Self {
            store,
            notification_service,
        }
    }

    /// Toggle the signal slot: same value clears it, a different value
    /// replaces whatever was there.
    pub async fn set_signal(
        &self,
        trip_id: &str,
        signal: CoordinationSignal,
    ) -> AcikResult<TripResponse> {
        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                t.coordination_signal = if t.coordination_signal == Some(signal) {
                    None
                } else {
                    Some(signal)
                };
                Ok(t.clone())
            })
            .await?;

        match trip.coordination_signal {
            Some(signal) => tracing::info!("Trip {} signal set: {:?}", trip.id, signal),
            None => tracing::info!("Trip {} signal cleared", trip.id),
        }
        Ok(trip.into())
    }

    /// Staff verifies the child arrived: stamps `TEACHER_RECEIVED`, forces
    /// the trip to `COMPLETED` and records the end time. This is the one
    /// sanctioned path that both sets a signal and closes the trip outside
    /// the driver's forward chain.
    pub async fn confirm_arrival(
        &self,
        trip_id: &str,
        staff_name: &str,
    ) -> AcikResult<TripResponse> {
        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                if matches!(t.status, TripStatus::Matching | TripStatus::Scheduled)
                    || t.status.is_terminal()
                {
                    return Err(AcikError::InvalidTransition(t.status));
                }
                t.status = TripStatus::Completed;
                t.coordination_signal = Some(CoordinationSignal::TeacherReceived);
                t.end_time = Some(Utc::now());
                Ok(t.clone())
            })
            .await?;

        tracing::info!("Arrival verified for trip {} by {}", trip.id, staff_name);
        if let Err(err) = self
            .notification_service
            .notify_arrival_verified(&trip, staff_name)
            .await
        {
            tracing::warn!("Arrival notification failed for trip {}: {}", trip.id, err);
        }

        Ok(trip.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{Trip, TripRequest};
    use crate::services::notify_service::MockNotificationService;

    async fn seeded_store(status: TripStatus) -> (Arc<TripStore>, String) {
        let store = Arc::new(TripStore::new());
        let mut trip = Trip::new(
            TripRequest {
                child_id: "C_TESTCHLD".to_string(),
                is_recurring: false,
                frequency: None,
                preferred_driver_id: None,
            },
            "4821".to_string(),
            3.1306,
            101.6673,
        );
        trip.status = status;
        if status != TripStatus::Matching && status != TripStatus::Scheduled {
            trip.driver_id = Some("D_TESTDRVR".to_string());
        }
        let id = trip.id.clone();
        store.insert(trip).await;
        (store, id)
    }

    fn service(store: Arc<TripStore>) -> CoordinationService {
        CoordinationService::new(store, Arc::new(MockNotificationService))
    }

    #[tokio::test]
    async fn test_signal_toggle() {
        let (store, id) = seeded_store(TripStatus::EnRouteToPickup).await;
        let coordination = service(Arc::clone(&store));

        let trip = coordination
            .set_signal(&id, CoordinationSignal::DriverWaiting)
            .await
            .unwrap();
        assert_eq!(trip.coordination_signal, Some(CoordinationSignal::DriverWaiting));

        // Same value toggles the slot back to empty.
        let trip = coordination
            .set_signal(&id, CoordinationSignal::DriverWaiting)
            .await
            .unwrap();
        assert_eq!(trip.coordination_signal, None);
    }

    #[tokio::test]
    async fn test_signal_replaces_existing() {
        let (store, id) = seeded_store(TripStatus::EnRouteToPickup).await;
        let coordination = service(Arc::clone(&store));

        coordination
            .set_signal(&id, CoordinationSignal::ParentLate)
            .await
            .unwrap();
        let trip = coordination
            .set_signal(&id, CoordinationSignal::TrafficDelay)
            .await
            .unwrap();
        assert_eq!(trip.coordination_signal, Some(CoordinationSignal::TrafficDelay));
    }

    #[tokio::test]
    async fn test_signal_does_not_touch_status() {
        let (store, id) = seeded_store(TripStatus::PickedUp).await;
        let coordination = service(Arc::clone(&store));

        let trip = coordination
            .set_signal(&id, CoordinationSignal::ChildNotFound)
            .await
            .unwrap();
        assert_eq!(trip.status, TripStatus::PickedUp);
    }

    #[tokio::test]
    async fn test_confirm_arrival_completes_with_signal() {
        let (store, id) = seeded_store(TripStatus::PickedUp).await;
        let coordination = service(Arc::clone(&store));

        let trip = coordination.confirm_arrival(&id, "Mr. Henderson").await.unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(trip.coordination_signal, Some(CoordinationSignal::TeacherReceived));
        assert!(trip.end_time.is_some());
    }

    #[tokio::test]
    async fn test_confirm_arrival_rejects_pool_and_terminal_trips() {
        let coordination_for = |status| async move {
            let (store, id) = seeded_store(status).await;
            (service(store), id)
        };

        for status in [
            TripStatus::Matching,
            TripStatus::Scheduled,
            TripStatus::Completed,
            TripStatus::Cancelled,
        ] {
            let (coordination, id) = coordination_for(status).await;
            assert_eq!(
                coordination.confirm_arrival(&id, "Mr. Henderson").await,
                Err(AcikError::InvalidTransition(status)),
                "status {:?}",
                status
            );
        }
    }
}
