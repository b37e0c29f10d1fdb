// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-connection chat session loop
//!
//! State machine per connection:
//! Authenticating -> Validating -> Connected -> (Receiving <-> Responding) -> Closed.
//! Auth and validation failures close the transport with a distinct code
//! before the session is ever registered. Turn-level collaborator failures
//! are absorbed by the responder; only transport loss ends a live session.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::history::{HistoryWindow, Role};
use super::messages::{close_frame, CloseCode, Outbound};
use super::registry::{ConnectionHandle, RegisterOutcome, SendOutcome};
use crate::api::server::AppState;
use crate::auth::{Principal, ACCESS_TOKEN_COOKIE};
use crate::storage::{ConversationTurn, Sender};

/// Frames queued per connection before the writer task applies backpressure
const OUTBOUND_CHANNEL_CAPACITY: usize = 32;

/// `GET /ws/chat/{chat_id}` upgrade handler
///
/// The credential cookie is captured from the handshake request; everything
/// else happens on the upgraded socket so rejections can carry a close code.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    Path(chat_id): Path<String>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let credential = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());
    ws.on_upgrade(move |socket| handle_chat_socket(socket, chat_id, credential, state))
}

async fn handle_chat_socket(
    socket: WebSocket,
    chat_id: String,
    credential: Option<String>,
    state: Arc<AppState>,
) {
    // Authenticating
    let principal = match state.auth.resolve(credential.as_deref()).await {
        Ok(principal) => principal,
        Err(err) => {
            info!("chat {} rejected: {}", chat_id, err);
            close_with(socket, CloseCode::Unauthenticated, &err.to_string()).await;
            return;
        }
    };

    // Validating: id format guard runs before any storage lookup
    if Uuid::parse_str(&chat_id).is_err() {
        info!("chat connection rejected: malformed id {:?}", chat_id);
        close_with(socket, CloseCode::BadRequest, "malformed chat id").await;
        return;
    }

    let conversation = match state.store.get_conversation(&chat_id).await {
        Ok(Some(conversation)) => conversation,
        Ok(None) => {
            info!("chat {} rejected: not found", chat_id);
            close_with(socket, CloseCode::NotFound, "chat not found").await;
            return;
        }
        Err(err) => {
            error!("chat {} validation failed: {}", chat_id, err);
            close_with(socket, CloseCode::Internal, "storage unavailable").await;
            return;
        }
    };

    if conversation.owner_id != principal.user_id {
        info!(
            "chat {} rejected: owner mismatch for user {}",
            chat_id, principal.user_id
        );
        close_with(socket, CloseCode::AccessDenied, "access denied").await;
        return;
    }

    run_session(socket, chat_id, principal, state).await;
}

/// Connected through Closed: register, pump frames, clean up
async fn run_session(
    socket: WebSocket,
    chat_id: String,
    principal: Principal,
    state: Arc<AppState>,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(OUTBOUND_CHANNEL_CAPACITY);

    // The writer task owns the sink; the registry and loop only queue frames
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                Outbound::Text(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Outbound::Close(code) => {
                    let _ = sink
                        .send(Message::Close(Some(close_frame(
                            code,
                            code.default_reason(),
                        ))))
                        .await;
                    break;
                }
            }
        }
    });

    let handle = ConnectionHandle::new(tx);
    let conn_id = handle.conn_id();
    if state.registry.register(&chat_id, handle).await == RegisterOutcome::Replaced {
        debug!("chat {} superseded a previous connection", chat_id);
    }
    info!(
        "chat session connected: chat {} user {}",
        chat_id, principal.user_id
    );

    // Window lifetime is exactly the session lifetime
    let mut history = HistoryWindow::new(state.history_window);

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if !process_turn(&state, &chat_id, &principal, &mut history, text).await {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            // Binary, ping and pong frames carry no chat input
            Ok(_) => {}
            Err(err) => {
                debug!("chat {} receive error: {}", chat_id, err);
                break;
            }
        }
    }

    state.registry.unregister(&chat_id, conn_id).await;
    writer.await.ok();
    info!("chat session closed: chat {}", chat_id);
}

/// One Receiving -> Responding cycle; false ends the session
///
/// Persist failures are logged and the turn still completes: delivering the
/// answer wins over durability.
async fn process_turn(
    state: &Arc<AppState>,
    chat_id: &str,
    principal: &Principal,
    history: &mut HistoryWindow,
    question: String,
) -> bool {
    if let Err(err) = state
        .store
        .append_turn(ConversationTurn {
            chat_id: chat_id.to_string(),
            user_id: principal.user_id.clone(),
            sender: Sender::User,
            content: question.clone(),
            timestamp: Utc::now(),
        })
        .await
    {
        warn!("chat {} failed to persist user turn: {}", chat_id, err);
    }

    // Render before appending: the current question reaches the prompt
    // through its question slot, not the history section
    let rendered = history.render();
    history.append(Role::User, question.clone());

    let answer = state.responder.answer(&question, &rendered).await;
    history.append(Role::Assistant, answer.clone());

    if let Err(err) = state
        .store
        .append_turn(ConversationTurn {
            chat_id: chat_id.to_string(),
            user_id: principal.user_id.clone(),
            sender: Sender::Bot,
            content: answer.clone(),
            timestamp: Utc::now(),
        })
        .await
    {
        warn!("chat {} failed to persist bot turn: {}", chat_id, err);
    }

    match state.registry.send(chat_id, &answer).await {
        SendOutcome::Sent => true,
        SendOutcome::Absent => {
            debug!(
                "chat {} answer dropped, session no longer registered",
                chat_id
            );
            false
        }
    }
}

/// Close an unregistered socket with a rejection code
async fn close_with(mut socket: WebSocket, code: CloseCode, reason: &str) {
    let _ = socket
        .send(Message::Close(Some(close_frame(code, reason))))
        .await;
}
