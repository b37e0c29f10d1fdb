use axum::extract::ws::CloseFrame;
use std::borrow::Cow;

/// Application-level close codes for the chat endpoint
///
/// Clients rely on these to tell the four rejection conditions apart; the
/// frame reason narrows the cause further (e.g. which auth check failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// Credential missing, invalid/expired, or principal unknown
    Unauthenticated,
    /// Chat id is not a well-formed identifier
    BadRequest,
    /// No conversation exists under the requested id
    NotFound,
    /// Conversation belongs to a different principal
    AccessDenied,
    /// A newer connection took over this conversation
    Superseded,
    /// Validation could not complete (storage failure)
    Internal,
}

impl CloseCode {
    pub fn code(&self) -> u16 {
        match self {
            CloseCode::Unauthenticated => 4401,
            CloseCode::BadRequest => 4001,
            CloseCode::NotFound => 4004,
            CloseCode::AccessDenied => 4403,
            CloseCode::Superseded => 4409,
            CloseCode::Internal => 1011,
        }
    }

    pub fn default_reason(&self) -> &'static str {
        match self {
            CloseCode::Unauthenticated => "not authenticated",
            CloseCode::BadRequest => "malformed chat id",
            CloseCode::NotFound => "chat not found",
            CloseCode::AccessDenied => "access denied",
            CloseCode::Superseded => "superseded by a newer connection",
            CloseCode::Internal => "internal error",
        }
    }
}

/// Build a close frame for a rejection condition
pub fn close_frame(code: CloseCode, reason: &str) -> CloseFrame<'static> {
    CloseFrame {
        code: code.code(),
        reason: Cow::Owned(reason.to_string()),
    }
}

/// Frames queued to a session's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Close(CloseCode),
}
