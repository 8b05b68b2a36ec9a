//! HTTP routing for Envira Gateway

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::header,
    response::IntoResponse,
    routing::get,
    Form, Json, Router,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

mod chat;
mod dashboard;
mod sensor;

/// Build the main router for the gateway
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .merge(sensor::routes())
        .merge(dashboard::routes())
        .merge(chat::routes())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::export(),
    )
}

/// Query-string parameters as a JSON object so they go through the same
/// validators as request bodies.
fn query_payload(params: HashMap<String, String>) -> Value {
    Value::Object(
        params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<Map<_, _>>(),
    )
}

/// Request body as a JSON value, read from either a JSON or a
/// form-encoded body. Unreadable bodies answer with the validation envelope.
pub(crate) struct Payload(pub Value);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| {
            content_type.starts_with("application/x-www-form-urlencoded")
        })
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let result = if is_form(&req) {
            Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map(|Form(fields)| query_payload(fields))
                .map_err(|rejection| rejection.body_text())
        } else {
            Json::<Value>::from_request(req, state)
                .await
                .map(|Json(value)| value)
                .map_err(|rejection| rejection.body_text())
        };

        result.map(Self).map_err(|reason| {
            debug!("rejected request body: {}", reason);
            metrics::VALIDATION_FAILURES
                .with_label_values(&["body"])
                .inc();
            ApiError::MalformedBody(reason)
        })
    }
}
