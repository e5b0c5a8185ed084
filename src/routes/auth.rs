//! Account endpoints: registration, login, logout and the current user.

use crate::auth::middleware::{AppState, AuthSession, TOKEN_COOKIE};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::auth::token::TokenSubject;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    non_blank, unix_millis, ChangePasswordRequest, LoginRequest, LoginResponse, MeResponse,
    MessageResponse, PublicUser, RegisterRequest, RegisterResponse, StoredUser,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use zeroize::Zeroizing;

/// Where the browser client goes after a successful login.
const LOGIN_REDIRECT: &str = "/willkommen";

/// Longest address accepted (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// Trim and lower-case an email, rejecting obviously malformed input.
pub fn normalize_email(email: Option<String>) -> Result<String, AppError> {
    let email = non_blank(email)
        .ok_or_else(|| AppError::InvalidInput("Email is required".to_string()))?
        .to_lowercase();

    let well_formed = email.len() <= MAX_EMAIL_LEN
        && !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

    if !well_formed {
        return Err(AppError::InvalidInput("Email is malformed".to_string()));
    }

    Ok(email)
}

fn required_password(password: Option<String>, label: &str) -> Result<Zeroizing<String>, AppError> {
    password
        .filter(|p| !p.is_empty())
        .map(Zeroizing::new)
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", label)))
}

/// Hash on the blocking pool so slow Argon2 rounds don't stall the runtime.
async fn hash_blocking(password: Zeroizing<String>) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

async fn verify_blocking(password: Zeroizing<String>, digest: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &digest)).await?
}

async fn verify_dummy_blocking(password: Zeroizing<String>) -> Result<bool, AppError> {
    Ok(tokio::task::spawn_blocking(move || verify_dummy(&password)).await?)
}

fn session_cookie(token: &str, config: &Config, max_age_secs: u64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        TOKEN_COOKIE, token, max_age_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// POST /register - Create an account
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let email = normalize_email(req.email)?;
    let password = required_password(req.password, "Password")?;
    let name = non_blank(req.name);

    // Cheap pre-check so taken emails don't pay for a hash. The store's
    // unique index still decides races.
    if state.users.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_blocking(password).await?;

    let now = unix_millis();
    let user = StoredUser {
        id: nanoid::nanoid!(12),
        email,
        name,
        password_hash,
        created_at: now,
        updated_at: now,
    };

    state.users.insert_user(&user).await?;

    tracing::info!(action = "user_registered", user_id = %user.id, "New user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: PublicUser::from(&user),
        }),
    ))
}

/// POST /login - Verify credentials and issue a token
///
/// The token is returned in the body and also set as an httpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let email = non_blank(req.email)
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AppError::InvalidInput("Email and password are required".to_string()))?;
    let password = required_password(req.password, "Password")?;

    let Some(user) = state.users.get_user_by_email(&email).await? else {
        // Same hashing cost as a wrong password
        verify_dummy_blocking(password).await?;
        tracing::warn!(action = "login_failed", reason = "unknown_email", "Login failed");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_blocking(password, user.password_hash.clone()).await? {
        tracing::warn!(action = "login_failed", user_id = %user.id, reason = "bad_password", "Login failed");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(&TokenSubject {
        user_id: &user.id,
        email: &user.email,
        name: user.name.as_deref(),
    })?;

    let cookie = session_cookie(&token, &state.config, state.tokens.ttl_secs());

    tracing::info!(action = "login", user_id = %user.id, "User logged in");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            redirect: LOGIN_REDIRECT.to_string(),
        }),
    ))
}

/// POST /logout - Clear the token cookie
///
/// Tokens are stateless, so a copy kept elsewhere stays valid until expiry.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session_cookie("", &state.config, 0))],
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// GET /api/me - Identity carried by the caller's token
pub async fn me(session: AuthSession) -> Json<MeResponse> {
    Json(MeResponse {
        id: session.user_id,
        email: session.email,
        name: session.name,
    })
}

/// PUT /api/me/password - Change the caller's password
///
/// Tokens issued before the change keep working until they expire.
pub async fn change_password(
    session: AuthSession,
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let current = required_password(req.current_password, "Current password")?;
    let new = required_password(req.new_password, "New password")?;

    let user = state
        .users
        .get_user(&session.user_id)
        .await?
        .ok_or(AppError::InvalidToken)?;

    if !verify_blocking(current, user.password_hash).await? {
        return Err(AppError::InvalidInput(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = hash_blocking(new).await?;

    if !state
        .users
        .update_password(&user.id, &password_hash, unix_millis())
        .await?
    {
        return Err(AppError::InvalidToken);
    }

    tracing::info!(action = "password_changed", user_id = %user.id, "Password changed");

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// GET /willkommen - Logged-in landing page from `STATIC_DIR`
pub async fn willkommen(
    _session: AuthSession,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let dir = state
        .config
        .static_dir
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;

    match tokio::fs::read_to_string(dir.join("willkommen.html")).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("Page not found".to_string()))
        }
        Err(e) => Err(AppError::Internal(format!("Failed to read page: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email(Some("  Alice@Example.COM ".to_string())).unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn test_normalize_email_rejects_bad_input() {
        for bad in [None, Some(""), Some("   "), Some("no-at-sign"), Some("a b@c.d"), Some("@x"), Some("x@")] {
            let result = normalize_email(bad.map(str::to_string));
            assert!(
                matches!(result, Err(AppError::InvalidInput(_))),
                "expected rejection for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_required_password() {
        assert!(required_password(None, "Password").is_err());
        assert!(required_password(Some(String::new()), "Password").is_err());
        // Whitespace is a legitimate password character
        assert_eq!(
            required_password(Some(" pw ".to_string()), "Password")
                .unwrap()
                .as_str(),
            " pw "
        );
    }
}
