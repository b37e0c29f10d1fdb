// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, Principal, PrincipalResolver, UserDirectory};

/// Cookie carrying the access token during the websocket handshake
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub exp: usize,
}

/// Resolver that decodes an HS256 access token and confirms the principal
/// still exists in the user directory
pub struct JwtPrincipalResolver {
    decoding_key: DecodingKey,
    validation: Validation,
    users: Arc<dyn UserDirectory>,
}

impl JwtPrincipalResolver {
    pub fn new(secret: &str, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            users,
        }
    }
}

#[async_trait]
impl PrincipalResolver for JwtPrincipalResolver {
    async fn resolve(&self, credential: Option<&str>) -> Result<Principal, AuthError> {
        let token = credential.ok_or(AuthError::MissingCredential)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        let user = self
            .users
            .find_user(&data.claims.user_id)
            .await
            .ok_or(AuthError::PrincipalNotFound)?;

        Ok(Principal {
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Mint an access token for a user id
///
/// The login service owns token issuance in production; this mirrors its
/// claims layout for local runs and tests.
pub fn issue_access_token(
    secret: &str,
    user_id: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id: user_id.to_string(),
        exp: (Utc::now().timestamp() as usize) + ttl.as_secs() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
