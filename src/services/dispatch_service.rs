// src/services/dispatch_service.rs
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;

use crate::errors::{AcikError, AcikResult};
use crate::models::driver::Driver;
use crate::models::trip::{MatchSource, Trip, TripRequest, TripResponse, TripStatus};
use crate::services::notify_service::NotificationService;
use crate::services::roster_service::RosterOperations;
use crate::services::tracking_service::TrackingSimulator;
use crate::store::TripStore;
use crate::utils::id_generator::IdGenerator;

/// Arrival lookahead for operator-approved matches.
pub const OPERATOR_MATCH_LOOKAHEAD_MIN: i64 = 15;
/// Arrival lookahead for auto-matched parent bookings.
pub const AUTO_MATCH_LOOKAHEAD_MIN: i64 = 12;

/// Picks a driver for a pending trip out of the eligible pool.
pub trait DriverSelector: Send + Sync {
    fn select(&self, pool: &[Driver], rng: &mut StdRng) -> Option<Driver>;
}

/// Uniform random pick. Nearest/idle-first strategies slot in behind the
/// same trait.
pub struct RandomSelector;

impl DriverSelector for RandomSelector {
    fn select(&self, pool: &[Driver], rng: &mut StdRng) -> Option<Driver> {
        pool.choose(rng).cloned()
    }
}

/// Bridges unmatched trips to available drivers, and handles both rejection
/// flavors: the operator discards a request outright, a driver declines an
/// offer back into the pool.
pub struct DispatchService {
    store: Arc<TripStore>,
    roster: Arc<dyn RosterOperations>,
    selector: Arc<dyn DriverSelector>,
    simulator: Arc<TrackingSimulator>,
    notification_service: Arc<dyn NotificationService>,
    rng: Mutex<StdRng>,
    hub: (f64, f64),
}

impl DispatchService {
    pub fn new(
        store: Arc<TripStore>,
        roster: Arc<dyn RosterOperations>,
        selector: Arc<dyn DriverSelector>,
        simulator: Arc<TrackingSimulator>,
        notification_service: Arc<dyn NotificationService>,
        hub: (f64, f64),
    ) -> Self {
        Self::with_rng(
            store,
            roster,
            selector,
            simulator,
            notification_service,
            hub,
            StdRng::from_os_rng(),
        )
    }

    /// Seeded variant so tests can pin driver selection and PIN minting.
    #[allow(clippy::too_many_arguments)]
    pub fn with_rng(
        store: Arc<TripStore>,
        roster: Arc<dyn RosterOperations>,
        selector: Arc<dyn DriverSelector>,
        simulator: Arc<TrackingSimulator>,
        notification_service: Arc<dyn NotificationService>,
        hub: (f64, f64),
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            roster,
            selector,
            simulator,
            notification_service,
            rng: Mutex::new(rng),
            hub,
        }
    }

    /// Create a trip in the matching pool. The result is pending — nothing
    /// is matched synchronously.
    pub async fn request_trip(&self, request: TripRequest) -> AcikResult<TripResponse> {
        tracing::info!("Trip requested for child {}", request.child_id);

        self.roster
            .lookup_child(&request.child_id)
            .await?
            .ok_or_else(|| AcikError::child_not_found(&request.child_id))?;

        if let Some(driver_id) = &request.preferred_driver_id {
            let driver = self
                .roster
                .lookup_driver(driver_id)
                .await?
                .ok_or_else(|| AcikError::driver_not_found(driver_id))?;
            if !driver.is_available() {
                return Err(AcikError::conflict(format!(
                    "Driver {} is not approved for matching",
                    driver_id
                )));
            }
        }

        let pin = {
            let mut rng = self.rng.lock().await;
            IdGenerator::generate_pin(&mut *rng)
        };
        let trip = Trip::new(request, pin, self.hub.0, self.hub.1);
        let response: TripResponse = trip.clone().into();

        self.store.insert(trip).await;
        tracing::info!("Trip {} created in matching pool", response.id);
        Ok(response)
    }

    /// Assign a driver from the approved pool and send the trip en route.
    pub async fn approve_match(
        &self,
        trip_id: &str,
        source: MatchSource,
    ) -> AcikResult<TripResponse> {
        let pool = self.roster.list_available_drivers().await?;
        let driver = {
            let mut rng = self.rng.lock().await;
            self.selector.select(&pool, &mut rng)
        }
        .ok_or(AcikError::NoDriverAvailable)?;

        let lookahead = match source {
            MatchSource::Operator => OPERATOR_MATCH_LOOKAHEAD_MIN,
            MatchSource::AutoBook => AUTO_MATCH_LOOKAHEAD_MIN,
        };

        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                if t.status != TripStatus::Matching {
                    return Err(AcikError::InvalidTransition(t.status));
                }
                t.driver_id = Some(driver.id.clone());
                t.status = TripStatus::EnRouteToPickup;
                t.estimated_arrival = Some(Utc::now() + Duration::minutes(lookahead));
                t.rejection_reason = None;
                Ok(t.clone())
            })
            .await?;

        tracing::info!("Driver {} matched to trip {} ({:?})", driver.id, trip.id, source);

        self.simulator.ensure_running();
        if let Err(err) = self
            .notification_service
            .notify_trip_status(&trip, trip.status)
            .await
        {
            tracing::warn!("Match notification failed for trip {}: {}", trip.id, err);
        }

        Ok(trip.into())
    }

    /// Operator-side rejection of a pending request: the trip is removed
    /// entirely, as a cancelled request.
    pub async fn reject_request(&self, trip_id: &str) -> AcikResult<()> {
        self.store
            .remove_if(trip_id, |t| {
                if t.status != TripStatus::Matching {
                    return Err(AcikError::InvalidTransition(t.status));
                }
                Ok(())
            })
            .await?;
        tracing::info!("Request {} rejected and removed", trip_id);
        Ok(())
    }

    /// Driver-side decline of a soft-assigned offer: the driver reference is
    /// cleared, the reason recorded, and the trip returns to the pool. The
    /// record is never deleted.
    pub async fn decline_offer(
        &self,
        trip_id: &str,
        driver_id: &str,
        reason: impl Into<String>,
    ) -> AcikResult<TripResponse> {
        let reason = reason.into();
        let trip = self
            .store
            .with_trip_mut(trip_id, |t| {
                if t.status != TripStatus::Matching {
                    return Err(AcikError::InvalidTransition(t.status));
                }
                if t.driver_id.as_deref() != Some(driver_id) {
                    return Err(AcikError::NotOfferedToDriver {
                        trip_id: t.id.clone(),
                        driver_id: driver_id.to_string(),
                    });
                }
                t.driver_id = None;
                t.rejection_reason = Some(reason.clone());
                Ok(t.clone())
            })
            .await?;

        tracing::info!(
            "Driver {} declined trip {}: {}",
            driver_id,
            trip.id,
            trip.rejection_reason.as_deref().unwrap_or_default()
        );
        Ok(trip.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::driver::OnboardingStatus;
    use crate::models::user::UserRole;
    use crate::models::User;
    use crate::services::notify_service::MockNotificationService;
    use crate::services::roster_service::RosterService;
    use crate::services::tracking_service::TrackingConfig;
    use crate::models::Child;

    fn child() -> Child {
        Child {
            id: "C_XFGCAQVK".to_string(),
            parent_id: "P_DAKRM8J5".to_string(),
            name: "Haziq".to_string(),
            age: 9,
            school: "Garden International School".to_string(),
            pickup_address: "Lucky Garden".to_string(),
            drop_address: "GIS Gate A".to_string(),
            photo: None,
        }
    }

    fn driver(id: &str, status: OnboardingStatus) -> Driver {
        Driver {
            id: id.to_string(),
            name: "Alya Aziz".to_string(),
            rating: 4.9,
            vehicle: "Toyota Innova".to_string(),
            plate: "WLP6490".to_string(),
            license_id: "MY-829201-L".to_string(),
            is_verified: true,
            onboarding_status: status,
        }
    }

    fn parent() -> User {
        User {
            id: "P_DAKRM8J5".to_string(),
            name: "Siti Zulkifli".to_string(),
            role: UserRole::Parent,
            phone: "01800455268".to_string(),
            email: None,
            school: None,
            gate: None,
        }
    }

    fn dispatch(store: Arc<TripStore>, drivers: Vec<Driver>) -> DispatchService {
        let roster = Arc::new(RosterService::new(vec![child()], drivers, vec![parent()]));
        let simulator = Arc::new(TrackingSimulator::with_rng(
            Arc::clone(&store),
            TrackingConfig::default(),
            StdRng::seed_from_u64(5),
        ));
        DispatchService::with_rng(
            store,
            roster,
            Arc::new(RandomSelector),
            simulator,
            Arc::new(MockNotificationService),
            (3.1326, 101.6651),
            StdRng::seed_from_u64(11),
        )
    }

    fn request() -> TripRequest {
        TripRequest {
            child_id: "C_XFGCAQVK".to_string(),
            is_recurring: false,
            frequency: None,
            preferred_driver_id: None,
        }
    }

    #[tokio::test]
    async fn test_request_trip_starts_matching_with_pin() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(Arc::clone(&store), vec![]);

        let response = service.request_trip(request()).await.unwrap();
        assert_eq!(response.status, TripStatus::Matching);
        assert!(response.driver_id.is_none());
        assert!(response.alerts.is_empty());

        let stored = store.get(&response.id).await.unwrap();
        assert_eq!(stored.verification_pin.len(), 4);
        assert!(stored.verification_pin.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_request_trip_unknown_child() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(Arc::clone(&store), vec![]);

        let mut bad = request();
        bad.child_id = "C_MISSING1".to_string();
        assert!(matches!(
            service.request_trip(bad).await,
            Err(AcikError::ChildNotFound(_))
        ));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_approve_match_assigns_driver_and_eta() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let trip = service.request_trip(request()).await.unwrap();
        let matched = service
            .approve_match(&trip.id, MatchSource::Operator)
            .await
            .unwrap();

        assert_eq!(matched.status, TripStatus::EnRouteToPickup);
        assert_eq!(matched.driver_id.as_deref(), Some("D_NFVOBBZ2"));
        let minutes = (matched.estimated_arrival.unwrap() - Utc::now()).num_minutes();
        assert!((12..=15).contains(&minutes), "unexpected ETA: {} min", minutes);
    }

    #[tokio::test]
    async fn test_approve_match_skips_unapproved_drivers() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![
                driver("D_PENDING1", OnboardingStatus::Pending),
                driver("D_SUSPEND1", OnboardingStatus::Suspended),
            ],
        );

        let trip = service.request_trip(request()).await.unwrap();
        assert_eq!(
            service.approve_match(&trip.id, MatchSource::Operator).await,
            Err(AcikError::NoDriverAvailable)
        );
        // The request stays in the pool, untouched.
        assert_eq!(store.get(&trip.id).await.unwrap().status, TripStatus::Matching);
    }

    #[tokio::test]
    async fn test_approve_match_auto_book_uses_shorter_lookahead() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let trip = service.request_trip(request()).await.unwrap();
        let matched = service
            .approve_match(&trip.id, MatchSource::AutoBook)
            .await
            .unwrap();
        let minutes = (matched.estimated_arrival.unwrap() - Utc::now()).num_minutes();
        assert!((11..=12).contains(&minutes), "unexpected ETA: {} min", minutes);
    }

    #[tokio::test]
    async fn test_approve_match_requires_matching_status() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let trip = service.request_trip(request()).await.unwrap();
        service.approve_match(&trip.id, MatchSource::Operator).await.unwrap();
        assert_eq!(
            service.approve_match(&trip.id, MatchSource::Operator).await,
            Err(AcikError::InvalidTransition(TripStatus::EnRouteToPickup))
        );
    }

    #[tokio::test]
    async fn test_operator_reject_removes_the_request() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(Arc::clone(&store), vec![]);

        let trip = service.request_trip(request()).await.unwrap();
        service.reject_request(&trip.id).await.unwrap();
        assert!(store.get(&trip.id).await.is_none());
    }

    #[tokio::test]
    async fn test_operator_reject_only_while_matching() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let trip = service.request_trip(request()).await.unwrap();
        service.approve_match(&trip.id, MatchSource::Operator).await.unwrap();

        assert_eq!(
            service.reject_request(&trip.id).await,
            Err(AcikError::InvalidTransition(TripStatus::EnRouteToPickup))
        );
        assert!(store.get(&trip.id).await.is_some());
    }

    #[tokio::test]
    async fn test_driver_decline_recycles_the_trip() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let mut offer = request();
        offer.preferred_driver_id = Some("D_NFVOBBZ2".to_string());
        let trip = service.request_trip(offer).await.unwrap();
        assert_eq!(trip.driver_id.as_deref(), Some("D_NFVOBBZ2"));
        assert_eq!(trip.status, TripStatus::Matching);

        let declined = service
            .decline_offer(&trip.id, "D_NFVOBBZ2", "Too far from location")
            .await
            .unwrap();

        assert_eq!(declined.status, TripStatus::Matching);
        assert!(declined.driver_id.is_none());
        assert_eq!(declined.rejection_reason.as_deref(), Some("Too far from location"));
        // Recycled, not deleted.
        assert!(store.get(&trip.id).await.is_some());
    }

    #[tokio::test]
    async fn test_decline_requires_the_offered_driver() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let mut offer = request();
        offer.preferred_driver_id = Some("D_NFVOBBZ2".to_string());
        let trip = service.request_trip(offer).await.unwrap();

        assert!(matches!(
            service.decline_offer(&trip.id, "D_LXSLG6MM", "Ending my shift").await,
            Err(AcikError::NotOfferedToDriver { .. })
        ));

        // An unassigned pool trip is not an offer either.
        let plain = service.request_trip(request()).await.unwrap();
        assert!(matches!(
            service.decline_offer(&plain.id, "D_NFVOBBZ2", "Vehicle maintenance").await,
            Err(AcikError::NotOfferedToDriver { .. })
        ));
    }

    #[tokio::test]
    async fn test_declined_trip_can_be_rematched() {
        let store = Arc::new(TripStore::new());
        let service = dispatch(
            Arc::clone(&store),
            vec![driver("D_NFVOBBZ2", OnboardingStatus::Approved)],
        );

        let mut offer = request();
        offer.preferred_driver_id = Some("D_NFVOBBZ2".to_string());
        let trip = service.request_trip(offer).await.unwrap();
        service
            .decline_offer(&trip.id, "D_NFVOBBZ2", "Heavy traffic zone")
            .await
            .unwrap();

        let rematched = service
            .approve_match(&trip.id, MatchSource::Operator)
            .await
            .unwrap();
        assert_eq!(rematched.status, TripStatus::EnRouteToPickup);
        assert!(rematched.driver_id.is_some());
        assert!(rematched.rejection_reason.is_none());
    }
}
