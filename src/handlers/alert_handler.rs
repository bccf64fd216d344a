// src/handlers/alert_handler.rs
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use crate::errors::AcikResult;
use crate::models::alert::Alert;
use crate::state::AppState;

pub async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> AcikResult<Json<Alert>> {
    Ok(Json(state.alert_service.resolve(&alert_id).await?))
}
