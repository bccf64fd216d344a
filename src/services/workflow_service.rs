// src/services/workflow_service.rs
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing;

use crate::errors::{AcikError, AcikResult};
use crate::models::trip::{TripResponse, TripStatus};
use crate::models::user::UserRole;
use crate::services::notify_service::NotificationService;
use crate::services::tracking_service::TrackingSimulator;
use crate::store::TripStore;

/// Arrival lookahead stamped when a driver accepts a matching offer.
pub const DRIVER_ACCEPT_LOOKAHEAD_MIN: i64 = 12;

/// Owns the legal forward path through the trip lifecycle and the PIN gate
/// into `CHECKED_IN`.
pub struct WorkflowService {
    store: Arc<TripStore>,
    simulator: Arc<TrackingSimulator>,
    notification_service: Arc<dyn NotificationService>,
}

impl WorkflowService {
    pub fn new(
        store: Arc<TripStore>,
        simulator: Arc<TrackingSimulator>,
        notification_service: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            store,
            simulator,
            notification_service,
        }
    }

    /// Move a trip one step along the forward chain.
    ///
    /// The boarding check-in is never granted here: a trip sitting at
    /// `ARRIVED_AT_PICKUP` answers `VerificationRequired` and only `verify`
    /// can cross that edge.
    pub async fn advance(&self, trip_id: &str, actor_role: UserRole) -> AcikResult<TripResponse> {
        match actor_role {
            UserRole::Driver | UserRole::Operator => {}
            other => {
                return Err(AcikError::forbidden(format!(
                    "Role {} cannot advance a trip",
                    other
                )));
            }
        }

        tracing::info!("Advancing trip {} as {}", trip_id, actor_role);

        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                if t.status == TripStatus::ArrivedAtPickup {
                    return Err(AcikError::VerificationRequired);
                }
                let next = t
                    .status
                    .successor()
                    .ok_or(AcikError::InvalidTransition(t.status))?;

                if t.status == TripStatus::Matching {
                    // Accepting out of the pool requires someone behind the wheel.
                    if t.driver_id.is_none() {
                        return Err(AcikError::DriverNotAssigned);
                    }
                    if t.estimated_arrival.is_none() {
                        t.estimated_arrival =
                            Some(Utc::now() + Duration::minutes(DRIVER_ACCEPT_LOOKAHEAD_MIN));
                    }
                }

                t.status = next;
                if next == TripStatus::Completed {
                    t.end_time = Some(Utc::now());
                }
                Ok(t.clone())
            })
            .await?;

        tracing::info!("Trip {} is now {}", trip.id, trip.status);

        if trip.status.is_in_motion() {
            self.simulator.ensure_running();
        }
        if let Err(err) = self
            .notification_service
            .notify_trip_status(&trip, trip.status)
            .await
        {
            tracing::warn!("Status notification failed for trip {}: {}", trip.id, err);
        }

        Ok(trip.into())
    }

    /// Gate the `ARRIVED_AT_PICKUP -> CHECKED_IN` edge behind the boarding
    /// PIN. A retry after the edge has been crossed reads `InvalidTransition`,
    /// never a stale `PinMismatch`.
    pub async fn verify(&self, trip_id: &str, entered_pin: &str) -> AcikResult<TripResponse> {
        tracing::info!("PIN verification attempt on trip {}", trip_id);

        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                if t.status != TripStatus::ArrivedAtPickup {
                    return Err(AcikError::InvalidTransition(t.status));
                }
                if entered_pin != t.verification_pin {
                    return Err(AcikError::PinMismatch);
                }
                t.status = TripStatus::CheckedIn;
                Ok(t.clone())
            })
            .await?;

        tracing::info!("Trip {} checked in", trip.id);

        if let Err(err) = self
            .notification_service
            .notify_trip_status(&trip, trip.status)
            .await
        {
            tracing::warn!("Status notification failed for trip {}: {}", trip.id, err);
        }

        Ok(trip.into())
    }

    /// Explicit cancellation, the only exit outside the forward chain.
    pub async fn cancel(&self, trip_id: &str) -> AcikResult<TripResponse> {
        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                if t.status.is_terminal() {
                    return Err(AcikError::InvalidTransition(t.status));
                }
                t.status = TripStatus::Cancelled;
                t.end_time = Some(Utc::now());
                Ok(t.clone())
            })
            .await?;

        tracing::info!("Trip {} cancelled", trip.id);
        Ok(trip.into())
    }
}
