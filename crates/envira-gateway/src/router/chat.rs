//! Health-assistant chat backed by the configured AI provider.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use envira_context::Exchange;
use envira_core::{validation::validate_chat, ChatRecord};
use envira_runtime::GenerateRequest;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::Payload;
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

const TIMESTAMP_FORMAT: &str = "%b %-d, %H:%M";

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", get(index))
        .route("/chat/send", post(send_message))
        .route("/chat/clear", post(clear_history))
        .route("/chat/models", get(models))
}

async fn index(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError> {
    let history = state
        .chats
        .recent_for_user(&user.user_id, state.chat.page_limit)
        .await?;
    let ollama_status = state.provider.health_check().await;

    Ok(Json(json!({ "history": history, "ollama_status": ollama_status })))
}

async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Payload(payload): Payload,
) -> Result<Json<Value>, ApiError> {
    let submission =
        validate_chat(&payload).map_err(|errors| ApiError::rejected("chat_send", errors))?;
    let settings = &state.chat;
    let model = submission
        .model
        .unwrap_or_else(|| settings.default_model.clone());

    let records = state
        .chats
        .recent_for_user(&user.user_id, settings.history_limit)
        .await?;
    let history: Vec<Exchange> = records.iter().map(Exchange::from).collect();
    let window = settings.window.apply(&history);
    debug!(
        "context for {}: {} exchanges, {} omitted, {} chars",
        user.user_id,
        window.included().len(),
        window.omitted_count(),
        window.used_chars()
    );
    metrics::CONTEXT_EXCHANGES_OMITTED.observe(window.omitted_count() as f64);

    let prompt = settings.prompt.assemble(&window, &submission.message);
    let request = GenerateRequest::new(prompt)
        .with_model(model.clone())
        .with_sampling(settings.temperature, settings.top_p);

    let provider = state.provider.name();
    metrics::AI_REQUESTS_TOTAL.with_label_values(&[provider]).inc();
    let timer = metrics::AI_LATENCY.with_label_values(&[provider]).start_timer();
    let result = state.provider.generate(request).await;
    timer.observe_duration();

    let reply = result.map_err(|e| {
        metrics::AI_ERRORS
            .with_label_values(&[provider, e.kind()])
            .inc();
        error!("chat error from {}: {}", provider, e);
        ApiError::from(e)
    })?;

    let record = state
        .chats
        .insert(ChatRecord::new(
            &user.user_id,
            submission.message,
            reply.content,
            &model,
        ))
        .await?;
    metrics::CHAT_EXCHANGES_STORED.inc();

    Ok(Json(json!({
        "success": true,
        "message": record.message,
        "response": record.response,
        "model": record.model,
        "timestamp": record.created_at.format(TIMESTAMP_FORMAT).to_string(),
    })))
}

async fn clear_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.chats.delete_for_user(&user.user_id).await?;
    info!("cleared {} chat records for {}", deleted, user.user_id);

    Ok(Json(json!({
        "success": true,
        "message": "Chat history cleared successfully",
    })))
}

async fn models(State(state): State<AppState>, _user: AuthenticatedUser) -> Json<Value> {
    match state.provider.list_models().await {
        Ok(models) => Json(json!({ "success": true, "models": models })),
        Err(e) => {
            warn!("failed to fetch models: {}", e);
            Json(json!({
                "success": false,
                "models": [state.chat.default_model],
            }))
        }
    }
}
