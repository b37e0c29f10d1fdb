// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Durable conversation storage contract
//!
//! The chat loop only emits write requests; which database sits behind the
//! trait is a deployment concern. Turn persistence is fire-and-forget from
//! the session's point of view: a failed append is logged, never fatal.

pub mod memory;

pub use memory::{MemoryChatStore, MemoryUserDirectory};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a persisted turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A conversation header, owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One persisted message, immutable once written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub chat_id: String,
    pub user_id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation failed: {0}")]
    Backend(String),
}

/// Trait for conversation storage backends
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Resolve a conversation header by id
    async fn get_conversation(&self, chat_id: &str)
        -> Result<Option<ConversationRecord>, StoreError>;

    /// Append one turn to a conversation's durable log
    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), StoreError>;
}
