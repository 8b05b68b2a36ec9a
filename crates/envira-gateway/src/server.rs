//! Application assembly and the HTTP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use envira_runtime::OllamaProvider;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::db::Repositories;
use crate::router::build_routes;
use crate::state::AppState;

/// Router with CORS and request tracing layered on.
pub fn build_app(state: AppState) -> Router {
    build_routes(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// State over `repositories`, talking to the configured Ollama server.
pub fn build_state(config: &GatewayConfig, repositories: Repositories) -> AppState {
    let provider = OllamaProvider::new(&config.ollama_base_url, &config.default_model);
    AppState::new(
        repositories,
        Arc::new(provider),
        config.jwt_config(),
        config.chat_settings(),
    )
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn configured_state_serves_health() {
        let config = GatewayConfig::default();
        let state = build_state(&config, Repositories::in_memory());

        assert_eq!(state.provider.name(), "ollama");
        assert_eq!(state.chat.window.max_chars, 3000);

        let response = build_app(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
