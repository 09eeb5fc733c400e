//! HTTP router and shared handler state.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::issuer::TokenIssuer;
use crate::config::Config;
use crate::session::SessionStore;

/// Shared state for HTTP handlers.
pub struct AppState {
    pub config: Config,
    pub store: Arc<SessionStore>,
    pub issuer: Arc<dyn TokenIssuer>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Create the HTTP router for the login endpoints.
///
/// Starts the session sweep on the current runtime.
pub fn create_router(
    config: Config,
    store: Arc<SessionStore>,
    issuer: Arc<dyn TokenIssuer>,
) -> Router {
    Arc::clone(&store).start_cleanup_task();

    let state = Arc::new(AppState { config, store, issuer });

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/authorize", get(handlers::handle_authorize))
        .route("/callback", get(handlers::handle_callback))
        .route("/token", post(handlers::handle_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "oidc-state",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_count = state.store.session_count().await;
    Json(serde_json::json!({
        "status": "ready",
        "service": "oidc-state",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": session_count
    }))
}
