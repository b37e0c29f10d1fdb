// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Credential resolution for incoming chat connections
//!
//! The node never issues or validates credentials itself beyond decoding the
//! session token carried by the transport handshake; everything else is the
//! auth collaborator's problem. The websocket loop only consumes
//! [`PrincipalResolver`].

pub mod jwt;

pub use jwt::{issue_access_token, Claims, JwtPrincipalResolver, ACCESS_TOKEN_COOKIE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The authenticated identity behind a connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
}

/// A registered user as seen by the directory collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Authentication error types
///
/// Each variant maps to a distinct close reason on the websocket; all three
/// close with the unauthenticated code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    MissingCredential,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("user not found")]
    PrincipalNotFound,
}

/// Resolves the handshake credential to a principal
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, credential: Option<&str>) -> Result<Principal, AuthError>;
}

/// Lookup of registered users, backed by whatever user store the deployment
/// runs against
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Option<UserRecord>;
}
