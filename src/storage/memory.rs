// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process reference implementations of the storage collaborators
//!
//! Used by tests and local runs. A deployment swaps these for clients of its
//! real database without touching the session engine.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChatStore, ConversationRecord, ConversationTurn, StoreError};
use crate::auth::{UserDirectory, UserRecord};

/// Conversation store holding everything in memory
#[derive(Default)]
pub struct MemoryChatStore {
    conversations: RwLock<HashMap<String, ConversationRecord>>,
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation owned by `owner_id` and return its record
    pub async fn create_conversation(&self, owner_id: &str, title: &str) -> ConversationRecord {
        let now = Utc::now();
        let record = ConversationRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.conversations
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        record
    }

    /// All turns persisted for a conversation, in write order
    pub async fn turns(&self, chat_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .read()
            .await
            .get(chat_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn get_conversation(
        &self,
        chat_id: &str,
    ) -> Result<Option<ConversationRecord>, StoreError> {
        Ok(self.conversations.read().await.get(chat_id).cloned())
    }

    async fn append_turn(&self, turn: ConversationTurn) -> Result<(), StoreError> {
        self.turns
            .write()
            .await
            .entry(turn.chat_id.clone())
            .or_default()
            .push(turn);
        Ok(())
    }
}

/// User directory holding registered users in memory
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and return the record with its generated id
    pub async fn add_user(&self, username: &str, email: &str) -> UserRecord {
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
        };
        self.users
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        record
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.read().await.get(user_id).cloned()
    }
}
