// src/models/user.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Parent,
    Driver,
    Teacher,
    Operator,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UserRole::Parent => "PARENT",
            UserRole::Driver => "DRIVER",
            UserRole::Teacher => "TEACHER",
            UserRole::Operator => "OPERATOR",
        };
        write!(f, "{}", label)
    }
}

/// An account known to the platform. Authentication and profile management
/// live outside the core; this is the read-only shape lookups return.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub phone: String,
    pub email: Option<String>,
    /// School this staff member monitors (teachers only).
    pub school: Option<String>,
    /// Gate assignment for arrival verification (teachers only).
    pub gate: Option<String>,
}
