use std::sync::Arc;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use acik_realtime::{
    handlers::{alert_handler, trip_handler},
    state::{AppConfig, AppState},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = AppConfig {
        snapshot_path: std::env::var("ACIK_SNAPSHOT_PATH").ok(),
        advisory_url: std::env::var("ACIK_ADVISORY_URL").ok(),
        ..AppConfig::default()
    };

    let app_state = AppState::new(config).await.unwrap();

    let app = Router::new()
        .route("/trips", get(trip_handler::list_trips).post(trip_handler::request_trip))
        .route("/trips/:id", get(trip_handler::get_trip))
        .route("/trips/:id/advance", post(trip_handler::advance_trip))
        .route("/trips/:id/verify", post(trip_handler::verify_pin))
        .route("/trips/:id/approve", post(trip_handler::approve_match))
        .route("/trips/:id/reject", post(trip_handler::reject_request))
        .route("/trips/:id/decline", post(trip_handler::decline_offer))
        .route("/trips/:id/cancel", post(trip_handler::cancel_trip))
        .route("/trips/:id/signal", post(trip_handler::set_signal))
        .route("/trips/:id/arrival", post(trip_handler::confirm_arrival))
        .route("/trips/:id/panic", post(trip_handler::trigger_panic))
        .route("/trips/:id/replies", get(trip_handler::quick_replies))
        .route("/alerts/:id/resolve", post(alert_handler::resolve_alert))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
