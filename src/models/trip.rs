// src/models/trip.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::alert::{Alert, AlertType};
use crate::utils::id_generator::{IdGenerator, IdType};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,        // Booked for a future window, not yet in the matching pool
    Matching,         // Waiting for a driver (none assigned, or soft-assigned offer)
    EnRouteToPickup,  // Driver accepted and is heading to the pickup point
    ArrivedAtPickup,  // Driver is at the pickup point
    CheckedIn,        // Identity verified via PIN
    PickedUp,         // Child is in the vehicle
    InProgress,       // Driving to school
    Completed,        // Drop-off confirmed
    Cancelled,        // Explicitly cancelled
}

impl TripStatus {
    /// The single legal forward transition, if any. `ArrivedAtPickup` has a
    /// successor here, but the workflow engine only grants it through PIN
    /// verification.
    pub fn successor(self) -> Option<TripStatus> {
        match self {
            TripStatus::Matching => Some(TripStatus::EnRouteToPickup),
            TripStatus::EnRouteToPickup => Some(TripStatus::ArrivedAtPickup),
            TripStatus::ArrivedAtPickup => Some(TripStatus::CheckedIn),
            TripStatus::CheckedIn => Some(TripStatus::PickedUp),
            TripStatus::PickedUp => Some(TripStatus::InProgress),
            TripStatus::InProgress => Some(TripStatus::Completed),
            TripStatus::Scheduled | TripStatus::Completed | TripStatus::Cancelled => None,
        }
    }

    /// Statuses the tracking simulator moves. Arrived/checked-in vehicles are
    /// parked at the pickup point and get no jitter.
    pub fn is_in_motion(self) -> bool {
        matches!(
            self,
            TripStatus::EnRouteToPickup | TripStatus::PickedUp | TripStatus::InProgress
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::Matching => "MATCHING",
            TripStatus::EnRouteToPickup => "EN_ROUTE_TO_PICKUP",
            TripStatus::ArrivedAtPickup => "ARRIVED_AT_PICKUP",
            TripStatus::CheckedIn => "CHECKED_IN",
            TripStatus::PickedUp => "PICKED_UP",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", label)
    }
}

/// Derived indicator of whether the driver's location feed is trustworthy.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingHealth {
    Optimal,
    Stale,
    Critical,
}

impl TrackingHealth {
    /// An unauthorized feed is always critical; an authorized one degrades to
    /// stale once the last fix is older than the cutoff.
    pub fn derive(authorized: bool, fix_age: Duration, stale_after: Duration) -> Self {
        if !authorized {
            TrackingHealth::Critical
        } else if fix_age > stale_after {
            TrackingHealth::Stale
        } else {
            TrackingHealth::Optimal
        }
    }
}

/// Transient situational flag, one slot per trip. Setting the same value
/// again clears it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinationSignal {
    ParentLate,
    DriverWaiting,
    ChildNotFound,
    TeacherReceived,
    ChangePickup,
    TrafficDelay,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingFrequency {
    Daily,
    Weekly,
    Adhoc,
}

/// Who initiated a match, which drives the arrival lookahead.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchSource {
    Operator,
    AutoBook,
}

/// One transport mission for one passenger.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub child_id: String,
    pub driver_id: Option<String>,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub current_lat: f64,
    pub current_lng: f64,
    pub route_deviation: bool,
    pub alerts: Vec<Alert>,
    pub tracking_health: TrackingHealth,
    pub driver_location_authorized: bool,
    pub last_updated: DateTime<Utc>,
    pub coordination_signal: Option<CoordinationSignal>,
    pub rejection_reason: Option<String>,
    pub verification_pin: String,
    pub is_recurring: bool,
    pub frequency: Option<BookingFrequency>,
}

impl Trip {
    pub fn new(request: TripRequest, pin: String, lat: f64, lng: f64) -> Self {
        Self {
            id: IdGenerator::generate(IdType::Trip),
            child_id: request.child_id,
            driver_id: request.preferred_driver_id,
            status: TripStatus::Matching,
            start_time: Utc::now(),
            end_time: None,
            estimated_arrival: None,
            current_lat: lat,
            current_lng: lng,
            route_deviation: false,
            alerts: Vec::new(),
            tracking_health: TrackingHealth::Optimal,
            driver_location_authorized: true,
            last_updated: Utc::now(),
            coordination_signal: None,
            rejection_reason: None,
            verification_pin: pin,
            is_recurring: request.is_recurring,
            frequency: request.frequency,
        }
    }

    /// Newest alerts first.
    pub fn push_alert(&mut self, alert: Alert) {
        self.alerts.insert(0, alert);
    }

    pub fn has_unresolved(&self, alert_type: AlertType) -> bool {
        self.alerts
            .iter()
            .any(|a| a.alert_type == alert_type && !a.resolved)
    }
}

// Request/Response Models
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TripRequest {
    pub child_id: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub frequency: Option<BookingFrequency>,
    /// Soft-assigns a specific driver as an offer; the driver accepts by
    /// advancing the trip or declines it back into the pool.
    #[serde(default)]
    pub preferred_driver_id: Option<String>,
}

/// Wire view of a trip. Deliberately omits `verification_pin` — the PIN is a
/// shared secret between guardian and child, never sent to viewers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TripResponse {
    pub id: String,
    pub child_id: String,
    pub driver_id: Option<String>,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub current_lat: f64,
    pub current_lng: f64,
    pub route_deviation: bool,
    pub alerts: Vec<Alert>,
    pub tracking_health: TrackingHealth,
    pub driver_location_authorized: bool,
    pub last_updated: DateTime<Utc>,
    pub coordination_signal: Option<CoordinationSignal>,
    pub rejection_reason: Option<String>,
    pub is_recurring: bool,
    pub frequency: Option<BookingFrequency>,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            child_id: trip.child_id,
            driver_id: trip.driver_id,
            status: trip.status,
            start_time: trip.start_time,
            end_time: trip.end_time,
            estimated_arrival: trip.estimated_arrival,
            current_lat: trip.current_lat,
            current_lng: trip.current_lng,
            route_deviation: trip.route_deviation,
            alerts: trip.alerts,
            tracking_health: trip.tracking_health,
            driver_location_authorized: trip.driver_location_authorized,
            last_updated: trip.last_updated,
            coordination_signal: trip.coordination_signal,
            rejection_reason: trip.rejection_reason,
            is_recurring: trip.is_recurring,
            frequency: trip.frequency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(child_id: &str) -> TripRequest {
        TripRequest {
            child_id: child_id.to_string(),
            is_recurring: false,
            frequency: None,
            preferred_driver_id: None,
        }
    }

    #[test]
    fn test_successor_chain() {
        let chain = [
            TripStatus::Matching,
            TripStatus::EnRouteToPickup,
            TripStatus::ArrivedAtPickup,
            TripStatus::CheckedIn,
            TripStatus::PickedUp,
            TripStatus::InProgress,
            TripStatus::Completed,
        ];
        for pair in chain.windows(2) {
            assert_eq!(pair[0].successor(), Some(pair[1]));
        }
        assert_eq!(TripStatus::Completed.successor(), None);
        assert_eq!(TripStatus::Cancelled.successor(), None);
        assert_eq!(TripStatus::Scheduled.successor(), None);
    }

    #[test]
    fn test_in_motion_set() {
        assert!(TripStatus::EnRouteToPickup.is_in_motion());
        assert!(TripStatus::PickedUp.is_in_motion());
        assert!(TripStatus::InProgress.is_in_motion());
        assert!(!TripStatus::ArrivedAtPickup.is_in_motion());
        assert!(!TripStatus::CheckedIn.is_in_motion());
        assert!(!TripStatus::Matching.is_in_motion());
        assert!(!TripStatus::Completed.is_in_motion());
    }

    #[test]
    fn test_new_trip_defaults() {
        let trip = Trip::new(request("C_TESTCHLD"), "4821".to_string(), 3.1326, 101.6651);
        assert_eq!(trip.status, TripStatus::Matching);
        assert!(trip.driver_id.is_none());
        assert!(trip.alerts.is_empty());
        assert_eq!(trip.verification_pin, "4821");
        assert!(trip.driver_location_authorized);
        assert_eq!(trip.tracking_health, TrackingHealth::Optimal);
        assert!(trip.id.starts_with("T_"));
    }

    #[test]
    fn test_alerts_are_newest_first() {
        let mut trip = Trip::new(request("C_TESTCHLD"), "0000".to_string(), 0.0, 0.0);
        trip.push_alert(Alert::new(&trip.id, AlertType::Delay, "first"));
        trip.push_alert(Alert::new(&trip.id, AlertType::Panic, "second"));
        assert_eq!(trip.alerts[0].alert_type, AlertType::Panic);
        assert_eq!(trip.alerts[1].alert_type, AlertType::Delay);
    }

    #[test]
    fn test_has_unresolved_ignores_resolved() {
        let mut trip = Trip::new(request("C_TESTCHLD"), "0000".to_string(), 0.0, 0.0);
        let mut alert = Alert::new(&trip.id, AlertType::TrackingOff, "signal lost");
        alert.resolved = true;
        trip.push_alert(alert);
        assert!(!trip.has_unresolved(AlertType::TrackingOff));
    }

    #[test]
    fn test_tracking_health_derivation() {
        let stale_after = Duration::seconds(30);
        assert_eq!(
            TrackingHealth::derive(true, Duration::seconds(5), stale_after),
            TrackingHealth::Optimal
        );
        assert_eq!(
            TrackingHealth::derive(true, Duration::seconds(45), stale_after),
            TrackingHealth::Stale
        );
        assert_eq!(
            TrackingHealth::derive(false, Duration::seconds(5), stale_after),
            TrackingHealth::Critical
        );
    }

    #[test]
    fn test_response_has_no_pin() {
        let trip = Trip::new(request("C_TESTCHLD"), "4821".to_string(), 0.0, 0.0);
        let response: TripResponse = trip.into();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("verification_pin").is_none());
        assert!(json.get("status").is_some());
    }
}
