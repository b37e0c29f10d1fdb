// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the retrieval and generation collaborators
//!
//! All of these are recoverable at the turn level: the responder converts
//! them into a fixed fallback answer, logs the detail, and the session
//! continues.

use thiserror::Error;

/// Errors that can occur while producing an answer
#[derive(Error, Debug)]
pub enum RagError {
    /// Retrieval collaborator call failed
    #[error("retrieval request failed: {0}")]
    Retrieval(String),

    /// Generation API returned a non-success status
    #[error("generation API error: {status} - {message}")]
    Generation { status: u16, message: String },

    /// Generation request never reached the collaborator
    #[error("generation request failed: {0}")]
    Transport(String),

    /// Generation call exceeded the configured deadline
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}
