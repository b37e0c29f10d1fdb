// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Context retrieval collaborator
//!
//! Retrieval is query-only: conversation history never reaches the index, it
//! only conditions generation. Keeping the query stateless keeps retrieval
//! deterministic and cache-friendly.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::RagError;

/// A single passage returned by the retrieval collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub score: f32,
}

/// Trait for context retrieval backends
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Return the top-`k` passages for a question, best match first
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Passage>, RagError>;
}

/// Client for an external vector-search service
///
/// The index itself (chunking, embeddings, persistence) is built and served
/// elsewhere; this node only sends queries.
pub struct VectorSearchClient {
    endpoint: String,
    client: Client,
}

impl VectorSearchClient {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { endpoint, client }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    passages: Vec<Passage>,
}

#[async_trait]
impl ContextRetriever for VectorSearchClient {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Passage>, RagError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&QueryRequest { query: text, k })
            .send()
            .await
            .map_err(|e| RagError::Retrieval(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RagError::Retrieval(format!("{} - {}", status, message)));
        }

        let data: QueryResponse = response
            .json()
            .await
            .map_err(|e| RagError::Retrieval(format!("JSON parse error: {}", e)))?;

        Ok(data.passages)
    }
}
