// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod server;
pub mod websocket;

pub use server::{create_router, AppState};
pub use websocket::history::{HistoryEntry, HistoryWindow, Role};
pub use websocket::messages::CloseCode;
pub use websocket::registry::{ConnectionHandle, RegisterOutcome, SendOutcome, SessionRegistry};
