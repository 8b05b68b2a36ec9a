//! Authenticated dashboard data.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use envira_core::{
    stats::{self, Period, PeriodPoint, RangeStats, SeriesPoint},
    Metric, SensorReading,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Everything the dashboard page renders.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub latest_reading: Option<SensorReading>,
    pub avg_temperature_24h: Option<f64>,
    pub avg_humidity_24h: Option<f64>,
    pub temperature_trend: f64,
    pub humidity_trend: f64,
    pub total_readings: usize,
    pub hourly: Vec<SeriesPoint>,
    pub weekly: Vec<SeriesPoint>,
    pub temperature_stats: RangeStats,
    pub humidity_stats: RangeStats,
}

#[derive(Debug, Deserialize)]
struct PeriodParams {
    period: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(index))
        .route("/api/sensor-data", get(sensor_data))
}

async fn index(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<DashboardView>, ApiError> {
    let now = Utc::now();
    let user_id = user.user_id.as_str();

    let latest_reading = state.readings.latest(user_id, 1).await?.into_iter().next();
    let total_readings = state.readings.count_for_user(user_id).await?;
    // A week covers the daily series and the 48h needed for 24h trends.
    let readings = state
        .readings
        .list_since(user_id, now - Duration::days(7))
        .await?;

    Ok(Json(DashboardView {
        latest_reading,
        avg_temperature_24h: stats::average(&readings, Metric::Temperature, now, 24),
        avg_humidity_24h: stats::average(&readings, Metric::Humidity, now, 24),
        temperature_trend: stats::trend(&readings, Metric::Temperature, now, 24),
        humidity_trend: stats::trend(&readings, Metric::Humidity, now, 24),
        total_readings,
        hourly: stats::hourly_series(&readings, now),
        weekly: stats::daily_series(&readings, now),
        temperature_stats: stats::range_stats(&readings, Metric::Temperature, now),
        humidity_stats: stats::range_stats(&readings, Metric::Humidity, now),
    }))
}

async fn sensor_data(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<PeriodPoint>>, ApiError> {
    let now = Utc::now();
    let period = Period::parse(params.period.as_deref());
    let readings = state
        .readings
        .list_since(&user.user_id, now - Duration::hours(period.hours()))
        .await?;

    Ok(Json(stats::period_series(&readings, now, period)))
}
