// src/handlers/trip_handler.rs
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::{AcikError, AcikResult};
use crate::models::alert::Alert;
use crate::models::trip::{CoordinationSignal, MatchSource, TripRequest, TripResponse};
use crate::models::user::UserRole;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTripsParams {
    pub role: UserRole,
    pub actor_id: String,
}

pub async fn list_trips(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTripsParams>,
) -> AcikResult<Json<Vec<TripResponse>>> {
    let trips = state
        .trip_service
        .list_trips(params.role, &params.actor_id)
        .await?;
    Ok(Json(trips))
}

pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> AcikResult<Json<TripResponse>> {
    Ok(Json(state.trip_service.get_trip(&trip_id).await?))
}

pub async fn request_trip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TripRequest>,
) -> AcikResult<(StatusCode, Json<TripResponse>)> {
    let trip = state.dispatch_service.request_trip(request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceBody {
    pub actor_role: UserRole,
}

pub async fn advance_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(body): Json<AdvanceBody>,
) -> AcikResult<Json<TripResponse>> {
    let trip = state
        .workflow_service
        .advance(&trip_id, body.actor_role)
        .await?;
    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub pin: String,
}

pub async fn verify_pin(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(body): Json<VerifyBody>,
) -> AcikResult<Json<TripResponse>> {
    let trip = state.workflow_service.verify(&trip_id, &body.pin).await?;
    Ok(Json(trip))
}

#[derive(Debug, Deserialize, Default)]
pub struct ApproveBody {
    pub source: Option<MatchSource>,
}

pub async fn approve_match(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    body: Option<Json<ApproveBody>>,
) -> AcikResult<Json<TripResponse>> {
    let source = body
        .and_then(|Json(b)| b.source)
        .unwrap_or(MatchSource::Operator);
    let trip = state.dispatch_service.approve_match(&trip_id, source).await?;
    Ok(Json(trip))
}

pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> AcikResult<StatusCode> {
    state.dispatch_service.reject_request(&trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DeclineBody {
    pub driver_id: String,
    pub reason: String,
}

pub async fn decline_offer(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(body): Json<DeclineBody>,
) -> AcikResult<Json<TripResponse>> {
    let trip = state
        .dispatch_service
        .decline_offer(&trip_id, &body.driver_id, body.reason)
        .await?;
    Ok(Json(trip))
}

pub async fn cancel_trip(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> AcikResult<Json<TripResponse>> {
    Ok(Json(state.workflow_service.cancel(&trip_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SignalBody {
    pub signal: CoordinationSignal,
}

pub async fn set_signal(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(body): Json<SignalBody>,
) -> AcikResult<Json<TripResponse>> {
    let trip = state
        .coordination_service
        .set_signal(&trip_id, body.signal)
        .await?;
    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
pub struct ArrivalBody {
    pub staff_name: String,
}

pub async fn confirm_arrival(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(body): Json<ArrivalBody>,
) -> AcikResult<Json<TripResponse>> {
    let trip = state
        .coordination_service
        .confirm_arrival(&trip_id, &body.staff_name)
        .await?;
    Ok(Json(trip))
}

pub async fn trigger_panic(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> AcikResult<Json<Alert>> {
    Ok(Json(state.alert_service.trigger_panic(&trip_id).await?))
}

/// Quick replies for the guardian chat. Advisory failures never surface
/// here; the fallback copy always comes back 200.
pub async fn quick_replies(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> AcikResult<Json<Vec<String>>> {
    let trip = state
        .store
        .get(&trip_id)
        .await
        .ok_or_else(|| AcikError::trip_not_found(&trip_id))?;
    let child_name = state
        .roster
        .lookup_child(&trip.child_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_else(|| "your child".to_string());

    Ok(Json(state.advisory.quick_replies(&trip, &child_name).await))
}
