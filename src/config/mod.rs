// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration from environment variables
//!
//! Variable names follow the original deployment (`SECRET_KEY`,
//! `GROQ_API_KEY`); everything except the signing secret has a default
//! suitable for local runs.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::websocket::history::DEFAULT_WINDOW_ENTRIES;
use crate::rag::responder::{DEFAULT_GENERATION_TIMEOUT, DEFAULT_TOP_K};
use crate::rag::GenerationConfig;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen_addr: String,
    /// HS256 secret shared with the login service
    pub jwt_secret: String,
    pub retriever_url: String,
    pub retrieval_top_k: usize,
    pub history_window: usize,
    pub generation: GenerationConfig,
    pub generation_timeout: Duration,
    /// Normalize model output into the structured advisory format
    pub format_responses: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            jwt_secret: "dev-secret".to_string(),
            retriever_url: "http://127.0.0.1:7700/search".to_string(),
            retrieval_top_k: DEFAULT_TOP_K,
            history_window: DEFAULT_WINDOW_ENTRIES,
            generation: GenerationConfig::default(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            format_responses: false,
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let generation_defaults = GenerationConfig::default();

        Ok(Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            jwt_secret: env::var("SECRET_KEY").context("SECRET_KEY must be set")?,
            retriever_url: env::var("RETRIEVER_URL").unwrap_or(defaults.retriever_url),
            retrieval_top_k: parse_env("RETRIEVAL_TOP_K", defaults.retrieval_top_k),
            history_window: parse_env("HISTORY_WINDOW", defaults.history_window),
            generation: GenerationConfig {
                base_url: env::var("GENERATION_BASE_URL").unwrap_or(generation_defaults.base_url),
                api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
                model: env::var("GENERATION_MODEL").unwrap_or(generation_defaults.model),
                temperature: parse_env("GENERATION_TEMPERATURE", generation_defaults.temperature),
            },
            generation_timeout: Duration::from_secs(parse_env(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )),
            format_responses: env::var("FORMAT_RESPONSES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.format_responses),
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
