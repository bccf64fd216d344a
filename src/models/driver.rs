// src/models/driver.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingStatus {
    Pending,    // Documents submitted, vetting not finished
    Approved,   // Eligible for matching
    Suspended,  // Removed from the pool
}

/// A vetted (or in-vetting) driver. Owned by the roster collaborator; only
/// `Approved` drivers are ever offered trips.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub rating: f32,
    pub vehicle: String,
    pub plate: String,
    pub license_id: String,
    pub is_verified: bool,
    pub onboarding_status: OnboardingStatus,
}

impl Driver {
    pub fn is_available(&self) -> bool {
        self.onboarding_status == OnboardingStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_approved_drivers_are_available() {
        let mut driver = Driver {
            id: "D_TESTDRVR".to_string(),
            name: "Alya Aziz".to_string(),
            rating: 4.9,
            vehicle: "Toyota Innova".to_string(),
            plate: "WLP6490".to_string(),
            license_id: "MY-829201-L".to_string(),
            is_verified: true,
            onboarding_status: OnboardingStatus::Approved,
        };
        assert!(driver.is_available());

        driver.onboarding_status = OnboardingStatus::Pending;
        assert!(!driver.is_available());

        driver.onboarding_status = OnboardingStatus::Suspended;
        assert!(!driver.is_available());
    }
}
