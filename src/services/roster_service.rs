// src/services/roster_service.rs
use async_trait::async_trait;
use std::collections::HashMap;
use tracing;

use crate::errors::AcikResult;
use crate::models::child::Child;
use crate::models::driver::{Driver, OnboardingStatus};
use crate::models::user::{User, UserRole};

/// Read-only lookups against the passenger/driver/account rosters. Profile
/// onboarding and CRUD live in a separate system; the trip core only ever
/// reads these records, so they can be held in plain maps.
#[async_trait]
pub trait RosterOperations: Send + Sync {
    async fn lookup_child(&self, child_id: &str) -> AcikResult<Option<Child>>;
    async fn lookup_driver(&self, driver_id: &str) -> AcikResult<Option<Driver>>;
    async fn lookup_user(&self, user_id: &str) -> AcikResult<Option<User>>;
    /// Drivers with `APPROVED` onboarding status only.
    async fn list_available_drivers(&self) -> AcikResult<Vec<Driver>>;
    async fn children_of(&self, parent_id: &str) -> AcikResult<Vec<Child>>;
    async fn school_roster(&self, school: &str) -> AcikResult<Vec<Child>>;
}

pub struct RosterService {
    children: HashMap<String, Child>,
    drivers: HashMap<String, Driver>,
    users: HashMap<String, User>,
}

impl RosterService {
    pub fn new(children: Vec<Child>, drivers: Vec<Driver>, users: Vec<User>) -> Self {
        tracing::debug!(
            "Roster loaded: {} children, {} drivers, {} users",
            children.len(),
            drivers.len(),
            users.len()
        );
        Self {
            children: children.into_iter().map(|c| (c.id.clone(), c)).collect(),
            drivers: drivers.into_iter().map(|d| (d.id.clone(), d)).collect(),
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }
}

#[async_trait]
impl RosterOperations for RosterService {
    async fn lookup_child(&self, child_id: &str) -> AcikResult<Option<Child>> {
        Ok(self.children.get(child_id).cloned())
    }

    async fn lookup_driver(&self, driver_id: &str) -> AcikResult<Option<Driver>> {
        Ok(self.drivers.get(driver_id).cloned())
    }

    async fn lookup_user(&self, user_id: &str) -> AcikResult<Option<User>> {
        Ok(self.users.get(user_id).cloned())
    }

    async fn list_available_drivers(&self) -> AcikResult<Vec<Driver>> {
        Ok(self
            .drivers
            .values()
            .filter(|d| d.is_available())
            .cloned()
            .collect())
    }

    async fn children_of(&self, parent_id: &str) -> AcikResult<Vec<Child>> {
        Ok(self
            .children
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn school_roster(&self, school: &str) -> AcikResult<Vec<Child>> {
        Ok(self
            .children
            .values()
            .filter(|c| c.school == school)
            .cloned()
            .collect())
    }
}

/// Small fixed roster for local runs, shaped like the production records.
pub fn demo_seed() -> (Vec<Child>, Vec<Driver>, Vec<User>) {
    let children = vec![
        Child {
            id: "C_XFGCAQVK".to_string(),
            parent_id: "P_DAKRM8J5".to_string(),
            name: "Haziq".to_string(),
            age: 9,
            school: "Garden International School".to_string(),
            pickup_address: "Lucky Garden".to_string(),
            drop_address: "GIS Gate A".to_string(),
            photo: None,
        },
        Child {
            id: "C_FL0UKEYZ".to_string(),
            parent_id: "P_DAKRM8J5".to_string(),
            name: "Izzah".to_string(),
            age: 7,
            school: "SK Bangsar".to_string(),
            pickup_address: "Bangsar Baru".to_string(),
            drop_address: "SK Bangsar Gate 1".to_string(),
            photo: None,
        },
    ];

    let drivers = vec![
        Driver {
            id: "D_NFVOBBZ2".to_string(),
            name: "Alya Aziz".to_string(),
            rating: 4.95,
            vehicle: "Toyota Innova".to_string(),
            plate: "WLP6490".to_string(),
            license_id: "MY-829201-L".to_string(),
            is_verified: true,
            onboarding_status: OnboardingStatus::Approved,
        },
        Driver {
            id: "D_LXSLG6MM".to_string(),
            name: "Amir Tan".to_string(),
            rating: 4.9,
            vehicle: "Honda HR-V".to_string(),
            plate: "WRU5566".to_string(),
            license_id: "MY-771203-D".to_string(),
            is_verified: true,
            onboarding_status: OnboardingStatus::Approved,
        },
        Driver {
            id: "D_KK791ZYR".to_string(),
            name: "Nadia Zulkifli".to_string(),
            rating: 4.46,
            vehicle: "Perodua Aruz".to_string(),
            plate: "WJY4186".to_string(),
            license_id: "MY-990809-Z".to_string(),
            is_verified: false,
            onboarding_status: OnboardingStatus::Pending,
        },
    ];

    let users = vec![
        User {
            id: "P_DAKRM8J5".to_string(),
            name: "Siti Zulkifli".to_string(),
            role: UserRole::Parent,
            phone: "01800455268".to_string(),
            email: None,
            school: None,
            gate: None,
        },
        User {
            id: "TE_HNDRSON1".to_string(),
            name: "Mr. Henderson".to_string(),
            role: UserRole::Teacher,
            phone: "0129998888".to_string(),
            email: None,
            school: Some("SK Bangsar".to_string()),
            gate: Some("Gate 1".to_string()),
        },
    ];

    (children, drivers, users)
}
