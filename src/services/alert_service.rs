// src/services/alert_service.rs
use std::sync::Arc;
use tracing;

use crate::errors::AcikResult;
use crate::models::alert::{Alert, AlertType};
use crate::services::notify_service::NotificationService;
use crate::store::TripStore;

pub const PANIC_MESSAGE: &str = "Guardian triggered Panic Button. Protocol active.";

/// Append-only ledger of safety events per trip. Creation is idempotent per
/// unresolved type; resolution is explicit and final.
pub struct AlertService {
    store: Arc<TripStore>,
    notification_service: Arc<dyn NotificationService>,
}

impl AlertService {
    pub fn new(store: Arc<TripStore>, notification_service: Arc<dyn NotificationService>) -> Self {
        Self {
            store,
            notification_service,
        }
    }

    /// Append an alert unless an unresolved one of the same type already
    /// exists on the trip, in which case that one is returned unchanged.
    pub async fn raise(
        &self,
        trip_id: &str,
        alert_type: AlertType,
        message: impl Into<String>,
    ) -> AcikResult<Alert> {
        let message = message.into();
        let (trip, alert, fresh) = self
            .store
            .with_trip_mut(trip_id, |t| {
                if let Some(existing) = t
                    .alerts
                    .iter()
                    .find(|a| a.alert_type == alert_type && !a.resolved)
                {
                    return Ok((t.clone(), existing.clone(), false));
                }
                let alert = Alert::new(&t.id, alert_type, message.clone());
                t.push_alert(alert.clone());
                Ok((t.clone(), alert, true))
            })
            .await?;

        if fresh {
            tracing::warn!("Alert {} raised on trip {}: {}", alert.alert_type, trip.id, alert.message);
            if let Err(err) = self.notification_service.notify_alert(&trip, &alert).await {
                tracing::warn!("Alert notification failed for trip {}: {}", trip.id, err);
            }
        } else {
            tracing::debug!(
                "Alert {} already open on trip {}, not duplicating",
                alert_type,
                trip.id
            );
        }
        Ok(alert)
    }

    /// Flip an alert to resolved. Only an explicit human action lands here;
    /// nothing in the simulation resolves alerts.
    pub async fn resolve(&self, alert_id: &str) -> AcikResult<Alert> {
        let alert = self.store.resolve_alert(alert_id).await?;
        tracing::info!("Alert {} resolved on trip {}", alert.id, alert.trip_id);
        Ok(alert)
    }

    /// Guardian SOS.
    pub async fn trigger_panic(&self, trip_id: &str) -> AcikResult<Alert> {
        self.raise(trip_id, AlertType::Panic, PANIC_MESSAGE).await
    }

    /// External deviation signal: marks the trip off-route and records the
    /// safety event in one mutation.
    pub async fn flag_deviation(
        &self,
        trip_id: &str,
        message: impl Into<String>,
    ) -> AcikResult<Alert> {
        let message = message.into();
        let (trip, alert, fresh) = self
            .store
            .with_trip_mut(trip_id, |t| {
                t.route_deviation = true;
                if let Some(existing) = t
                    .alerts
                    .iter()
                    .find(|a| a.alert_type == AlertType::Deviation && !a.resolved)
                {
                    return Ok((t.clone(), existing.clone(), false));
                }
                let alert = Alert::new(&t.id, AlertType::Deviation, message.clone());
                t.push_alert(alert.clone());
                Ok((t.clone(), alert, true))
            })
            .await?;

        if fresh {
            tracing::warn!("Route deviation flagged on trip {}", trip.id);
            if let Err(err) = self.notification_service.notify_alert(&trip, &alert).await {
                tracing::warn!("Alert notification failed for trip {}: {}", trip.id, err);
            }
        }
        Ok(alert)
    }
}
