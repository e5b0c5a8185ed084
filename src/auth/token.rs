//! Signed bearer tokens (HS256 JWT).

use crate::error::AppError;
use crate::models::unix_secs;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

/// Identity a token is issued for.
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub name: Option<&'a str>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Signing secret cannot be empty")]
    EmptySecret,

    #[error("Token TTL must be greater than zero")]
    ZeroTtl,
}

/// Issues and verifies tokens with one process-wide symmetric key.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if ttl_secs == 0 {
            return Err(TokenError::ZeroTtl);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(TokenService {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token valid for the configured TTL from now.
    pub fn issue(&self, subject: &TokenSubject<'_>) -> Result<String, AppError> {
        self.issue_at(subject, unix_secs())
    }

    /// Issue a token as if the current time were `issued_at` (Unix seconds).
    pub fn issue_at(&self, subject: &TokenSubject<'_>, issued_at: u64) -> Result<String, AppError> {
        let claims = Claims {
            sub: subject.user_id.to_string(),
            email: subject.email.to_string(),
            name: subject.name.map(str::to_string),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature and expiry.
    ///
    /// Every failure collapses into `InvalidToken`; the cause is only logged
    /// at debug level.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = %e, "Token rejected");
                AppError::InvalidToken
            })
    }
}
