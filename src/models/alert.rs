// src/models/alert.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::id_generator::{IdGenerator, IdType};

/// Safety events attached to a trip. Closed set; new kinds need a product
/// decision, not just another string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Deviation,
    Delay,
    Stationary,
    MissingCheckin,
    MissingChild,
    Panic,
    TrackingOff,
    CoordinationSignal,
    PickupChange,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AlertType::Deviation => "DEVIATION",
            AlertType::Delay => "DELAY",
            AlertType::Stationary => "STATIONARY",
            AlertType::MissingCheckin => "MISSING_CHECKIN",
            AlertType::MissingChild => "MISSING_CHILD",
            AlertType::Panic => "PANIC",
            AlertType::TrackingOff => "TRACKING_OFF",
            AlertType::CoordinationSignal => "COORDINATION_SIGNAL",
            AlertType::PickupChange => "PICKUP_CHANGE",
        };
        write!(f, "{}", label)
    }
}

/// An immutable fact about a trip. Only `resolved` ever changes, and only
/// from false to true.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub trip_id: String,
    pub alert_type: AlertType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

impl Alert {
    pub fn new(trip_id: &str, alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            id: IdGenerator::generate(IdType::Alert),
            trip_id: trip_id.to_string(),
            alert_type,
            message: message.into(),
            timestamp: Utc::now(),
            resolved: false,
        }
    }
}
