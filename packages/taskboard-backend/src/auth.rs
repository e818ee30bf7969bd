/// Bearer-token identity and board permissions.
use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use thiserror::Error;

use taskboard_core::storage::memory::MemoryStore;
use taskboard_core::storage::Identity;
use taskboard_core::types::{CurrentUser, Member};

/// Static token table from the server config.
pub struct TokenIdentity {
    /// token -> user_id
    tokens: HashMap<String, String>,
}

impl TokenIdentity {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl Identity for TokenIdentity {
    /// A shared server has no ambient signed-in user; callers are
    /// resolved per request through `verify`.
    fn current_user(&self) -> Option<CurrentUser> {
        None
    }

    fn verify(&self, credential: &str) -> Option<String> {
        self.tokens.get(credential).cloned()
    }
}

/// The identity of one request, resolved from its bearer token.
pub struct RequestIdentity {
    user: CurrentUser,
}

impl RequestIdentity {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

impl Identity for RequestIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        Some(self.user.clone())
    }

    fn verify(&self, _credential: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingCredential,

    #[error("Invalid bearer token")]
    InvalidCredential,

    #[error("Not a member of board {0}")]
    NotMember(String),

    #[error("Read-only access to board {0}")]
    ReadOnly(String),
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller of a board request and check their role.
pub fn authorize(
    identity: &dyn Identity,
    store: &MemoryStore,
    headers: &HeaderMap,
    board_id: &str,
    write: bool,
) -> Result<(RequestIdentity, Member), AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingCredential)?;
    let user_id = identity
        .verify(token)
        .ok_or(AuthError::InvalidCredential)?;
    let member = store
        .member(board_id, &user_id)
        .ok_or_else(|| AuthError::NotMember(board_id.to_string()))?;
    if write && !member.role.can_write() {
        return Err(AuthError::ReadOnly(board_id.to_string()));
    }
    let user = CurrentUser {
        id: member.user_id.clone(),
        display_name: member.display_name.clone(),
        email: member.email.clone(),
    };
    Ok((RequestIdentity { user }, member))
}

/// User id behind a bearer token, without a board check.
pub fn authenticate(identity: &dyn Identity, headers: &HeaderMap) -> Result<String, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingCredential)?;
    identity.verify(token).ok_or(AuthError::InvalidCredential)
}
