// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::websocket::handler::chat_ws_handler;
use crate::api::websocket::registry::SessionRegistry;
use crate::auth::PrincipalResolver;
use crate::rag::RetrievalResponder;
use crate::storage::ChatStore;

/// Shared state behind every connection
///
/// Collaborators are constructed once at startup and injected here; nothing
/// in the session engine reaches for globals.
pub struct AppState {
    pub registry: SessionRegistry,
    pub responder: Arc<RetrievalResponder>,
    pub store: Arc<dyn ChatStore>,
    pub auth: Arc<dyn PrincipalResolver>,
    /// Maximum entries per session history window
    pub history_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/chat/:chat_id", get(chat_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_sessions: state.registry.active_sessions().await,
    })
}
