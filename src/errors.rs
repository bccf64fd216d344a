use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::models::trip::TripStatus;

/// Main error type for the acik-realtime service
#[derive(Debug, Clone, PartialEq)]
pub enum AcikError {
    // Workflow errors
    InvalidTransition(TripStatus),
    VerificationRequired,
    PinMismatch,
    DriverNotAssigned,

    // Dispatch errors
    NoDriverAvailable,
    NotOfferedToDriver { trip_id: String, driver_id: String },

    // Lookup failures
    TripNotFound(String),
    ChildNotFound(String),
    DriverNotFound(String),
    UserNotFound(String),
    AlertNotFound(String),

    // Alert ledger errors
    AlertAlreadyResolved(String),

    // HTTP and API errors
    BadRequest(String),
    Forbidden(String),
    Conflict(String),
    InternalServer(String),

    // Advisory collaborator errors (always swallowed behind the fallback wrapper)
    AdvisoryTimeout,
    AdvisoryUnavailable(String),

    // Persistence errors
    SnapshotIo(String),
    JsonSerialization(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl fmt::Display for AcikError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcikError::InvalidTransition(status) => {
                write!(f, "No legal transition from status {}", status)
            }
            AcikError::VerificationRequired => {
                write!(f, "Boarding check-in requires PIN verification")
            }
            AcikError::PinMismatch => write!(f, "Entered PIN does not match"),
            AcikError::DriverNotAssigned => {
                write!(f, "Trip has no assigned driver")
            }

            AcikError::NoDriverAvailable => write!(f, "No approved driver available"),
            AcikError::NotOfferedToDriver { trip_id, driver_id } => {
                write!(f, "Trip {} is not offered to driver {}", trip_id, driver_id)
            }

            AcikError::TripNotFound(id) => write!(f, "Trip not found: {}", id),
            AcikError::ChildNotFound(id) => write!(f, "Child not found: {}", id),
            AcikError::DriverNotFound(id) => write!(f, "Driver not found: {}", id),
            AcikError::UserNotFound(id) => write!(f, "User not found: {}", id),
            AcikError::AlertNotFound(id) => write!(f, "Alert not found: {}", id),

            AcikError::AlertAlreadyResolved(id) => {
                write!(f, "Alert already resolved: {}", id)
            }

            AcikError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AcikError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AcikError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AcikError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            AcikError::AdvisoryTimeout => write!(f, "Advisory request timed out"),
            AcikError::AdvisoryUnavailable(msg) => {
                write!(f, "Advisory service unavailable: {}", msg)
            }

            AcikError::SnapshotIo(msg) => write!(f, "Snapshot IO error: {}", msg),
            AcikError::JsonSerialization(msg) => {
                write!(f, "JSON serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for AcikError {}

impl IntoResponse for AcikError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AcikError::InvalidTransition(_) => {
                (StatusCode::CONFLICT, "invalid_transition", self.to_string())
            }
            AcikError::VerificationRequired => {
                (StatusCode::CONFLICT, "verification_required", self.to_string())
            }
            AcikError::PinMismatch => {
                (StatusCode::UNPROCESSABLE_ENTITY, "pin_mismatch", self.to_string())
            }
            AcikError::DriverNotAssigned => {
                (StatusCode::CONFLICT, "driver_not_assigned", self.to_string())
            }

            AcikError::NoDriverAvailable => {
                (StatusCode::CONFLICT, "no_driver_available", self.to_string())
            }
            AcikError::NotOfferedToDriver { .. } => {
                (StatusCode::CONFLICT, "not_offered_to_driver", self.to_string())
            }

            AcikError::TripNotFound(_) => (StatusCode::NOT_FOUND, "trip_not_found", self.to_string()),
            AcikError::ChildNotFound(_) => {
                (StatusCode::NOT_FOUND, "child_not_found", self.to_string())
            }
            AcikError::DriverNotFound(_) => {
                (StatusCode::NOT_FOUND, "driver_not_found", self.to_string())
            }
            AcikError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AcikError::AlertNotFound(_) => {
                (StatusCode::NOT_FOUND, "alert_not_found", self.to_string())
            }

            AcikError::AlertAlreadyResolved(_) => {
                (StatusCode::CONFLICT, "alert_already_resolved", self.to_string())
            }

            AcikError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", self.to_string()),
            AcikError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AcikError::Conflict(_) => (StatusCode::CONFLICT, "conflict", self.to_string()),

            // Everything else is an internal server error
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", self.to_string()),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type AcikResult<T> = Result<T, AcikError>;

// Conversion implementations for common error types
impl From<serde_json::Error> for AcikError {
    fn from(err: serde_json::Error) -> Self {
        AcikError::JsonSerialization(err.to_string())
    }
}

impl From<std::io::Error> for AcikError {
    fn from(err: std::io::Error) -> Self {
        AcikError::SnapshotIo(err.to_string())
    }
}

impl From<reqwest::Error> for AcikError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AcikError::AdvisoryTimeout
        } else {
            AcikError::AdvisoryUnavailable(err.to_string())
        }
    }
}

// Helper functions for creating common errors
impl AcikError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AcikError::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AcikError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AcikError::Conflict(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        AcikError::InternalServer(msg.into())
    }

    pub fn trip_not_found(trip_id: impl Into<String>) -> Self {
        AcikError::TripNotFound(trip_id.into())
    }

    pub fn child_not_found(child_id: impl Into<String>) -> Self {
        AcikError::ChildNotFound(child_id.into())
    }

    pub fn driver_not_found(driver_id: impl Into<String>) -> Self {
        AcikError::DriverNotFound(driver_id.into())
    }
}
