// src/models/child.rs
use serde::{Deserialize, Serialize};

/// A registered passenger. Owned by the roster collaborator; the trip core
/// only ever reads these.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Child {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub age: u8,
    pub school: String,
    pub pickup_address: String,
    pub drop_address: String,
    pub photo: Option<String>,
}
