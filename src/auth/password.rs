//! Argon2id password hashing.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=19456,t=2,p=1$...`) so the
//! salt and parameters travel with the hash.

use crate::error::AppError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;

static DUMMY_DIGEST: OnceLock<Option<String>> = OnceLock::new();

/// Hash a plaintext password with a fresh random salt.
///
/// CPU-bound; call from `spawn_blocking` inside request handlers.
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    rand::fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding failed: {}", e)))?;

    // Argon2id, m=19456 (19MB), t=2, p=1
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(digest)
}

/// Check a plaintext password against a stored digest.
///
/// Returns `Ok(false)` on mismatch. A digest that cannot be parsed is a
/// server-side problem and maps to `Internal`.
pub fn verify_password(plaintext: &str, digest: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;

    // Output comparison is constant-time inside the argon2 crate
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Verify against a throwaway digest and report no match.
///
/// Lets a login for an unknown account spend the same Argon2 work as a
/// wrong password. The digest is built on first use.
pub fn verify_dummy(plaintext: &str) -> bool {
    let digest = DUMMY_DIGEST.get_or_init(|| hash_password("inkpad-unused-account").ok());

    if let Some(digest) = digest {
        let _ = verify_password(plaintext, digest);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_not_plaintext() {
        let digest = hash_password("pw123").unwrap();
        assert_ne!(digest, "pw123");
        assert!(!digest.contains("pw123"));
        assert!(digest.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_roundtrip() {
        let digest = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &digest).unwrap());
        assert!(!verify_password("pw124", &digest).unwrap());
        assert!(!verify_password("", &digest).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same password", &first).unwrap());
        assert!(verify_password("same password", &second).unwrap());
    }

    #[test]
    fn test_malformed_digest_is_internal() {
        let result = verify_password("pw123", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_dummy_verification_never_matches() {
        assert!(!verify_dummy("pw123"));
        assert!(!verify_dummy("inkpad-unused-account"));

        // Same parameters as real digests, so the work is comparable
        let digest = DUMMY_DIGEST.get().unwrap().as_ref().unwrap();
        assert!(digest.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }
}
