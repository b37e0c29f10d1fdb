// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use intelliguide_node::{
    api::server::{create_router, AppState},
    api::websocket::registry::SessionRegistry,
    auth::JwtPrincipalResolver,
    config::NodeConfig,
    rag::{ChatCompletionsGenerator, ResponderConfig, RetrievalResponder, VectorSearchClient},
    storage::{MemoryChatStore, MemoryUserDirectory},
};
use std::{env, sync::Arc};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::from_env()?;

    // Collaborators are built once here and injected; the session engine
    // never constructs its own
    let users = Arc::new(MemoryUserDirectory::new());
    let store = Arc::new(MemoryChatStore::new());
    let auth = Arc::new(JwtPrincipalResolver::new(&config.jwt_secret, users));
    let retriever = Arc::new(VectorSearchClient::new(config.retriever_url.clone()));
    let generator = Arc::new(ChatCompletionsGenerator::new(config.generation.clone()));
    let responder = Arc::new(RetrievalResponder::new(
        retriever,
        generator,
        ResponderConfig {
            top_k: config.retrieval_top_k,
            generation_timeout: config.generation_timeout,
            normalize_output: config.format_responses,
        },
    ));

    let state = Arc::new(AppState {
        registry: SessionRegistry::new(),
        responder,
        store,
        auth,
        history_window: config.history_window,
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(
        "GST IntelliGuide node listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
