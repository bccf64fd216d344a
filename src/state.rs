// src/state.rs
use std::sync::Arc;
use std::time::Duration;
use tracing;

use crate::errors::AcikResult;
use crate::services::advisory_service::{
    Advisory, AdvisoryOperations, HttpAdvisoryService, MockAdvisoryService,
};
use crate::services::alert_service::AlertService;
use crate::services::coordination_service::CoordinationService;
use crate::services::dispatch_service::{DispatchService, RandomSelector};
use crate::services::notify_service::{MockNotificationService, NotificationService};
use crate::services::roster_service::{demo_seed, RosterOperations, RosterService};
use crate::services::tracking_service::{TrackingConfig, TrackingSimulator};
use crate::services::trip_service::TripService;
use crate::services::workflow_service::WorkflowService;
use crate::store::{SnapshotFile, TripStore};

pub struct AppState {
    pub store: Arc<TripStore>,
    pub roster: Arc<dyn RosterOperations>,
    pub workflow_service: Arc<WorkflowService>,
    pub dispatch_service: Arc<DispatchService>,
    pub alert_service: Arc<AlertService>,
    pub coordination_service: Arc<CoordinationService>,
    pub trip_service: Arc<TripService>,
    pub tracking_simulator: Arc<TrackingSimulator>,
    pub advisory: Arc<Advisory>,
    pub notification_service: Arc<dyn NotificationService>,
    pub config: AppConfig,
}

#[derive(Clone)]
pub struct AppConfig {
    /// Where the trip/children snapshot lives between runs. `None` keeps
    /// everything in memory.
    pub snapshot_path: Option<String>,
    pub advisory_url: Option<String>,
    pub advisory_timeout_ms: u64,
    pub tick_interval_secs: u64,
    pub signal_loss_probability: f64,
    /// Seed coordinates for newly requested trips.
    pub hub_lat: f64,
    pub hub_lng: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            advisory_url: None,
            advisory_timeout_ms: 1500,
            tick_interval_secs: 5,
            signal_loss_probability: 0.02,
            hub_lat: 3.1326,
            hub_lng: 101.6651,
        }
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> AcikResult<Self> {
        let (seed_children, drivers, users) = demo_seed();

        let (children, trips) = match &config.snapshot_path {
            Some(path) => match SnapshotFile::load(path).await? {
                Some(snapshot) => {
                    tracing::info!(
                        "Loaded snapshot: {} trips, {} children",
                        snapshot.trips.len(),
                        snapshot.children.len()
                    );
                    (snapshot.children, snapshot.trips)
                }
                None => (seed_children, Vec::new()),
            },
            None => (seed_children, Vec::new()),
        };

        let mut store = TripStore::with_trips(trips);
        if let Some(path) = &config.snapshot_path {
            store = store.with_sink(Arc::new(SnapshotFile::new(path, children.clone())));
        }
        let store = Arc::new(store);

        let roster: Arc<dyn RosterOperations> =
            Arc::new(RosterService::new(children, drivers, users));
        let notification_service: Arc<dyn NotificationService> = Arc::new(MockNotificationService);

        let tracking_config = TrackingConfig {
            tick_interval: Duration::from_secs(config.tick_interval_secs),
            signal_loss_probability: config.signal_loss_probability,
            ..TrackingConfig::default()
        };
        let stale_after = tracking_config.stale_after;
        let tracking_simulator = Arc::new(TrackingSimulator::new(
            Arc::clone(&store),
            tracking_config,
        ));

        let workflow_service = Arc::new(WorkflowService::new(
            Arc::clone(&store),
            Arc::clone(&tracking_simulator),
            Arc::clone(&notification_service),
        ));
        let dispatch_service = Arc::new(DispatchService::new(
            Arc::clone(&store),
            Arc::clone(&roster),
            Arc::new(RandomSelector),
            Arc::clone(&tracking_simulator),
            Arc::clone(&notification_service),
            (config.hub_lat, config.hub_lng),
        ));
        let alert_service = Arc::new(AlertService::new(
            Arc::clone(&store),
            Arc::clone(&notification_service),
        ));
        let coordination_service = Arc::new(CoordinationService::new(
            Arc::clone(&store),
            Arc::clone(&notification_service),
        ));
        let trip_service = Arc::new(TripService::new(
            Arc::clone(&store),
            Arc::clone(&roster),
            stale_after,
        ));

        let advisory_inner: Arc<dyn AdvisoryOperations> = match &config.advisory_url {
            Some(url) => Arc::new(HttpAdvisoryService::new(url.clone())),
            None => {
                tracing::warn!("ADVISORY_URL not set, using mock advisory service");
                Arc::new(MockAdvisoryService)
            }
        };
        let advisory = Arc::new(Advisory::new(
            advisory_inner,
            Duration::from_millis(config.advisory_timeout_ms),
        ));

        // A snapshot restored mid-ride needs the simulator back immediately.
        if store.count_in_motion().await > 0 {
            tracking_simulator.ensure_running();
        }

        Ok(Self {
            store,
            roster,
            workflow_service,
            dispatch_service,
            alert_service,
            coordination_service,
            trip_service,
            tracking_simulator,
            advisory,
            notification_service,
            config,
        })
    }
}
