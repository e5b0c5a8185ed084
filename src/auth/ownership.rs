//! Owner check for mutating a resource.

use crate::auth::middleware::AuthSession;
use crate::error::AppError;

/// Allow the operation only when the caller owns the resource.
pub fn ensure_owner(owner_id: &str, session: &AuthSession) -> Result<(), AppError> {
    if owner_id != session.user_id {
        tracing::warn!(
            action = "ownership_denied",
            user_id = %session.user_id,
            "Mutation attempted by non-owner"
        );
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(())
}
