//! Axum extractors for authentication.

use crate::auth::token::TokenService;
use crate::config::Config;
use crate::error::AppError;
use crate::storage::{PostStore, UserStore};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;

/// Name of the cookie carrying the bearer token.
pub const TOKEN_COOKIE: &str = "token";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

/// Authenticated identity taken from a verified token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Find the bearer token: the `token` cookie first, then
/// `Authorization: Bearer {token}`.
pub fn locate_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, TOKEN_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Resolve the caller's identity from request headers.
///
/// No token is `Unauthenticated` (401); a token that fails verification
/// is `InvalidToken` (403).
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthSession, AppError> {
    let token = locate_token(headers).ok_or_else(|| {
        AppError::Unauthenticated("Missing token. Log in first".to_string())
    })?;

    let claims = tokens.verify(&token)?;

    Ok(AuthSession {
        user_id: claims.sub,
        email: claims.email,
        name: claims.name,
    })
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.tokens)
    }
}
