// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Answer orchestration: one retrieval call, one generation call per turn
//!
//! `answer` never fails from the caller's point of view. Collaborator errors,
//! timeouts and empty completions all collapse into fixed fallback strings so
//! the session loop can stay oblivious to why a turn went sideways.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use super::generation::TextGenerator;
use super::response_formatter::format_advisory_response;
use super::retriever::ContextRetriever;

pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Shown when retrieval or generation fails for a turn
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, something went wrong while generating an answer. \
     Please try asking your GST question again.";

/// Shown when the model returns an empty completion
pub const EMPTY_ANSWER_FALLBACK: &str = "I could not find relevant GST information.";

const PROMPT_TEMPLATE: &str = r#"You are GST IntelliGuide - an AI assistant EXCLUSIVELY for Indian GST laws.

=== CRITICAL RULE ===
You MUST ONLY answer questions about GST, Indian taxation, CGST, SGST, IGST, tax compliance.
You MUST REFUSE programming, general knowledge, or non-tax questions politely.

=== CONVERSATION HISTORY ===
{chat_history}

=== USER MESSAGE ===
{question}

=== GST KNOWLEDGE ===
{context}

=== RESPONSE RULES ===
1. If NOT about GST -> "I'm GST IntelliGuide, I specialize in Indian GST only. How can I help with GST?"
2. For greetings -> Warm response
3. For follow-ups ("one line", "more detail") -> Apply to previous topic from history
4. For simple questions -> 2-4 sentences with bullets
5. For complex topics -> Use structured format with headers

Your response:"#;

#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub top_k: usize,
    pub generation_timeout: Duration,
    /// Run the structured-format normalization pass over model output
    pub normalize_output: bool,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            normalize_output: false,
        }
    }
}

/// Composes retrieval and generation into one answer-producing operation
pub struct RetrievalResponder {
    retriever: Arc<dyn ContextRetriever>,
    generator: Arc<dyn TextGenerator>,
    config: ResponderConfig,
}

impl RetrievalResponder {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        generator: Arc<dyn TextGenerator>,
        config: ResponderConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            config,
        }
    }

    /// Produce an answer for `question`, conditioned on rendered `history`
    ///
    /// History only shapes phrasing and continuity; it is never used to
    /// retrieve context.
    pub async fn answer(&self, question: &str, history: &str) -> String {
        let passages = match self.retriever.query(question, self.config.top_k).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!("context retrieval failed: {}", e);
                return FALLBACK_ANSWER.to_string();
            }
        };

        let context = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        debug!(
            passages = passages.len(),
            context_chars = context.len(),
            "retrieved context"
        );

        let prompt = build_prompt(history, question, &context);

        let raw = match timeout(
            self.config.generation_timeout,
            self.generator.generate(&prompt),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("generation failed: {}", e);
                return FALLBACK_ANSWER.to_string();
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.generation_timeout.as_millis() as u64,
                    "generation timed out"
                );
                return FALLBACK_ANSWER.to_string();
            }
        };

        if raw.trim().is_empty() {
            return EMPTY_ANSWER_FALLBACK.to_string();
        }

        if self.config.normalize_output {
            format_advisory_response(&raw)
        } else {
            raw
        }
    }
}

/// Substitute history, question and context into the instruction template
pub fn build_prompt(history: &str, question: &str, context: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{chat_history}", history)
        .replace("{question}", question)
        .replace("{context}", context)
}
