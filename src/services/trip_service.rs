// src/services/trip_service.rs
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing;

use crate::errors::{AcikError, AcikResult};
use crate::models::trip::{TrackingHealth, Trip, TripResponse};
use crate::models::user::UserRole;
use crate::services::roster_service::RosterOperations;
use crate::store::TripStore;

/// Read side of the trip store: role-scoped listings and single-trip
/// lookups, converted to the wire shape.
pub struct TripService {
    store: Arc<TripStore>,
    roster: Arc<dyn RosterOperations>,
    stale_after: chrono::Duration,
}

impl TripService {
    pub fn new(
        store: Arc<TripStore>,
        roster: Arc<dyn RosterOperations>,
        stale_after: chrono::Duration,
    ) -> Self {
        Self {
            store,
            roster,
            stale_after,
        }
    }

    /// Trips visible to one actor: parents see their children's trips,
    /// drivers their assignments (offers included), teachers their school's
    /// arrivals, operators everything.
    pub async fn list_trips(&self, role: UserRole, actor_id: &str) -> AcikResult<Vec<TripResponse>> {
        tracing::debug!("Listing trips for {} {}", role, actor_id);
        let all = self.store.list().await;

        let mut visible: Vec<Trip> = match role {
            UserRole::Operator => all,
            UserRole::Driver => all
                .into_iter()
                .filter(|t| t.driver_id.as_deref() == Some(actor_id))
                .collect(),
            UserRole::Parent => {
                let mine: HashSet<String> = self
                    .roster
                    .children_of(actor_id)
                    .await?
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                all.into_iter().filter(|t| mine.contains(&t.child_id)).collect()
            }
            UserRole::Teacher => {
                let user = self
                    .roster
                    .lookup_user(actor_id)
                    .await?
                    .ok_or_else(|| AcikError::UserNotFound(actor_id.to_string()))?;
                match user.school {
                    Some(school) => {
                        let students: HashSet<String> = self
                            .roster
                            .school_roster(&school)
                            .await?
                            .into_iter()
                            .map(|c| c.id)
                            .collect();
                        all.into_iter().filter(|t| students.contains(&t.child_id)).collect()
                    }
                    None => Vec::new(),
                }
            }
        };

        // Newest first.
        visible.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(visible.into_iter().map(|t| self.to_response(t)).collect())
    }

    pub async fn get_trip(&self, trip_id: &str) -> AcikResult<TripResponse> {
        let trip = self
            .store
            .get(trip_id)
            .await
            .ok_or_else(|| AcikError::trip_not_found(trip_id))?;
        Ok(self.to_response(trip))
    }

    /// Readers see tracking health derived against the clock, so a feed that
    /// went quiet reads STALE even though nothing wrote to the record.
    fn to_response(&self, mut trip: Trip) -> TripResponse {
        if trip.status.is_in_motion() {
            trip.tracking_health = TrackingHealth::derive(
                trip.driver_location_authorized,
                Utc::now() - trip.last_updated,
                self.stale_after,
            );
        }
        trip.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{TripRequest, TripStatus};
    use crate::services::roster_service::{demo_seed, RosterService};

    fn trip_for(child_id: &str, status: TripStatus, driver: Option<&str>) -> Trip {
        let mut trip = Trip::new(
            TripRequest {
                child_id: child_id.to_string(),
                is_recurring: false,
                frequency: None,
                preferred_driver_id: None,
            },
            "4821".to_string(),
            3.1306,
            101.6673,
        );
        trip.status = status;
        trip.driver_id = driver.map(String::from);
        trip
    }

    async fn setup() -> (Arc<TripStore>, TripService) {
        let store = Arc::new(TripStore::new());
        let (children, drivers, users) = demo_seed();
        let roster = Arc::new(RosterService::new(children, drivers, users));
        let service = TripService::new(
            Arc::clone(&store),
            roster,
            chrono::Duration::seconds(30),
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_parent_sees_only_their_children() {
        let (store, service) = setup().await;
        store
            .insert(trip_for("C_XFGCAQVK", TripStatus::InProgress, Some("D_NFVOBBZ2")))
            .await;
        store
            .insert(trip_for("C_SOMEONE1", TripStatus::InProgress, Some("D_LXSLG6MM")))
            .await;

        let trips = service.list_trips(UserRole::Parent, "P_DAKRM8J5").await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].child_id, "C_XFGCAQVK");
    }

    #[tokio::test]
    async fn test_driver_sees_assignments_and_offers() {
        let (store, service) = setup().await;
        store
            .insert(trip_for("C_XFGCAQVK", TripStatus::Matching, Some("D_NFVOBBZ2")))
            .await;
        store
            .insert(trip_for("C_FL0UKEYZ", TripStatus::InProgress, Some("D_LXSLG6MM")))
            .await;
        store.insert(trip_for("C_FL0UKEYZ", TripStatus::Matching, None)).await;

        let trips = service.list_trips(UserRole::Driver, "D_NFVOBBZ2").await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].status, TripStatus::Matching);
    }

    #[tokio::test]
    async fn test_teacher_sees_their_school() {
        let (store, service) = setup().await;
        // Izzah attends SK Bangsar, Haziq does not.
        store
            .insert(trip_for("C_FL0UKEYZ", TripStatus::InProgress, Some("D_NFVOBBZ2")))
            .await;
        store
            .insert(trip_for("C_XFGCAQVK", TripStatus::InProgress, Some("D_LXSLG6MM")))
            .await;

        let trips = service.list_trips(UserRole::Teacher, "TE_HNDRSON1").await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].child_id, "C_FL0UKEYZ");
    }

    #[tokio::test]
    async fn test_unknown_teacher_is_reported() {
        let (_, service) = setup().await;
        assert!(matches!(
            service.list_trips(UserRole::Teacher, "TE_MISSING").await,
            Err(AcikError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_operator_sees_everything_newest_first() {
        let (store, service) = setup().await;
        let mut older = trip_for("C_XFGCAQVK", TripStatus::Completed, Some("D_NFVOBBZ2"));
        older.start_time = Utc::now() - chrono::Duration::hours(2);
        let newer = trip_for("C_FL0UKEYZ", TripStatus::Matching, None);
        let newer_id = newer.id.clone();
        store.insert(older).await;
        store.insert(newer).await;

        let trips = service.list_trips(UserRole::Operator, "OP_CONSOLE1").await.unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].id, newer_id);
    }

    #[tokio::test]
    async fn test_quiet_feed_reads_stale() {
        let (store, service) = setup().await;
        let mut trip = trip_for("C_XFGCAQVK", TripStatus::InProgress, Some("D_NFVOBBZ2"));
        trip.last_updated = Utc::now() - chrono::Duration::minutes(5);
        let id = trip.id.clone();
        store.insert(trip).await;

        let response = service.get_trip(&id).await.unwrap();
        assert_eq!(response.tracking_health, TrackingHealth::Stale);

        // The stored record is untouched; staleness is a read-side view.
        assert_eq!(
            store.get(&id).await.unwrap().tracking_health,
            TrackingHealth::Optimal
        );
    }

    #[tokio::test]
    async fn test_get_trip_unknown() {
        let (_, service) = setup().await;
        assert!(matches!(
            service.get_trip("T_MISSING1").await,
            Err(AcikError::TripNotFound(_))
        ));
    }
}
