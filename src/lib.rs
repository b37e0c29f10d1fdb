// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod auth;
pub mod config;
pub mod rag;
pub mod storage;

// Re-export main types from the session engine
pub use api::server::{create_router, AppState};
pub use api::websocket::history::{HistoryWindow, Role};
pub use api::websocket::messages::CloseCode;
pub use api::websocket::registry::{
    ConnectionHandle, RegisterOutcome, SendOutcome, SessionRegistry,
};

// Re-export collaborator contracts
pub use auth::{AuthError, Principal, PrincipalResolver, UserDirectory, UserRecord};
pub use rag::{
    ContextRetriever, Passage, RagError, ResponderConfig, RetrievalResponder, TextGenerator,
};
pub use storage::{ChatStore, ConversationRecord, ConversationTurn, Sender, StoreError};
