// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language-generation collaborator
//!
//! The model backend is an opaque request/response oracle behind an
//! OpenAI-compatible chat-completions endpoint. One call per user turn, no
//! retry; the responder owns the fallback path.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::RagError;

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
        }
    }
}

/// Trait for text-generation backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionsGenerator {
    config: GenerationConfig,
    client: Client,
}

impl ChatCompletionsGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagError::Timeout { timeout_ms: 60_000 }
                } else {
                    RagError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RagError::Generation {
                status: status.as_u16(),
                message,
            });
        }

        let data: ChatResponse = response.json().await.map_err(|e| RagError::Generation {
            status: 0,
            message: format!("JSON parse error: {}", e),
        })?;

        let content = data
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(RagError::Generation {
                status: 0,
                message: "response contained no choices".to_string(),
            })?;

        Ok(content)
    }
}
