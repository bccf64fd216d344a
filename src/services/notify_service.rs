// src/services/notify_service.rs
use async_trait::async_trait;
use serde_json::json;
use tracing;

use crate::errors::AcikResult;
use crate::models::alert::Alert;
use crate::models::trip::{Trip, TripStatus};

/// Push delivery boundary. Real delivery lives outside this service; the
/// core only hands finished messages across this trait, and callers treat
/// failures as non-fatal.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_to_user(&self, user_id: &str, message: NotificationMessage) -> AcikResult<()>;
    async fn notify_trip_status(&self, trip: &Trip, status: TripStatus) -> AcikResult<()>;
    async fn notify_alert(&self, trip: &Trip, alert: &Alert) -> AcikResult<()>;
    async fn notify_arrival_verified(&self, trip: &Trip, staff_name: &str) -> AcikResult<()>;
}

#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

impl NotificationMessage {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Logging stand-in used everywhere a real push gateway would be wired.
#[derive(Debug)]
pub struct MockNotificationService;

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn send_to_user(&self, user_id: &str, message: NotificationMessage) -> AcikResult<()> {
        tracing::info!(
            "[MOCK] Would push to user {}: {} - {}",
            user_id,
            message.title,
            message.body
        );
        Ok(())
    }

    async fn notify_trip_status(&self, trip: &Trip, status: TripStatus) -> AcikResult<()> {
        let message = NotificationMessage::new(
            "Trip update",
            &format!("Trip {} is now {}", trip.id, status),
        )
        .with_data(json!({
            "type": "trip_status",
            "trip_id": trip.id,
            "status": status.to_string(),
        }));
        self.send_to_user(&trip.child_id, message).await
    }

    async fn notify_alert(&self, trip: &Trip, alert: &Alert) -> AcikResult<()> {
        let message = NotificationMessage::new("Safety alert", &alert.message).with_data(json!({
            "type": "alert",
            "trip_id": trip.id,
            "alert_id": alert.id,
            "alert_type": alert.alert_type.to_string(),
        }));
        self.send_to_user(&trip.child_id, message).await
    }

    async fn notify_arrival_verified(&self, trip: &Trip, staff_name: &str) -> AcikResult<()> {
        let message = NotificationMessage::new(
            "Arrival verified",
            &format!("Safely received at school by {}", staff_name),
        )
        .with_data(json!({
            "type": "arrival_verified",
            "trip_id": trip.id,
        }));
        self.send_to_user(&trip.child_id, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder() {
        let message = NotificationMessage::new("Trip update", "On the way")
            .with_data(json!({"trip_id": "T_VWV8LW2Q"}));
        assert_eq!(message.title, "Trip update");
        assert!(message.data.is_some());
    }
}
