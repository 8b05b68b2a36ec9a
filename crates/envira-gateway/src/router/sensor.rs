//! Public device API under `/api/v1/sensor`.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use envira_core::{
    stats,
    validation::{validate_latest, validate_reading, validate_stats},
    NewReading, ValidationErrors,
};
use serde_json::{json, Value};
use tracing::info;

use super::{query_payload, Payload};
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/sensor/data", post(store))
        .route("/api/v1/sensor/store", post(store_with_api_key))
        .route("/api/v1/sensor/latest", get(latest))
        .route("/api/v1/sensor/stats", get(statistics))
}

/// Reject ids that passed the field rules but name no user.
async fn ensure_user_exists(
    state: &AppState,
    user_id: &str,
    endpoint: &str,
) -> Result<(), ApiError> {
    if state.users.get(user_id).await?.is_some() {
        return Ok(());
    }
    let mut errors = ValidationErrors::new();
    errors.add("user_id", "The selected user id is invalid.");
    Err(ApiError::rejected(endpoint, errors))
}

async fn persist(
    state: &AppState,
    user_id: &str,
    reading: NewReading,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let reading = envira_core::SensorReading::new(user_id, reading, Utc::now());
    let stored = state
        .readings
        .insert(reading)
        .await
        .map_err(ApiError::StoreFailed)?;

    metrics::READINGS_STORED.inc();
    info!(
        "stored reading {} for {} from {}",
        stored.id, stored.user_id, stored.device_id
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Sensor data stored successfully",
            "data": stored,
        })),
    ))
}

async fn store(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let submission = validate_reading(&payload, "user_id")
        .map_err(|errors| ApiError::rejected("sensor_data", errors))?;
    ensure_user_exists(&state, &submission.owner, "sensor_data").await?;
    persist(&state, &submission.owner, submission.reading).await
}

/// Devices authenticate with the owner's email as API key.
async fn store_with_api_key(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let submission = validate_reading(&payload, "api_key")
        .map_err(|errors| ApiError::rejected("sensor_store", errors))?;
    let user = state
        .users
        .find_by_email(&submission.owner)
        .await?
        .ok_or(ApiError::InvalidApiKey)?;
    persist(&state, &user.id, submission.reading).await
}

async fn latest(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = validate_latest(&query_payload(params))
        .map_err(|errors| ApiError::rejected("sensor_latest", errors))?;
    ensure_user_exists(&state, &query.user_id, "sensor_latest").await?;

    let readings = state.readings.latest(&query.user_id, query.limit).await?;
    Ok(Json(json!({ "success": true, "data": readings })))
}

async fn statistics(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let query = validate_stats(&query_payload(params))
        .map_err(|errors| ApiError::rejected("sensor_stats", errors))?;
    ensure_user_exists(&state, &query.user_id, "sensor_stats").await?;

    let now = Utc::now();
    // The trend compares against the period before, so fetch twice the window.
    let readings = state
        .readings
        .list_since(&query.user_id, now - chrono::Duration::hours(query.hours * 2))
        .await?;
    let summary = stats::statistics(&readings, now, query.hours);

    Ok(Json(json!({ "success": true, "data": summary })))
}
