//! Authentication: password hashing, signed tokens, the request gate and
//! the ownership check.

pub mod middleware;
pub mod ownership;
pub mod password;
pub mod token;

pub use middleware::{authenticate, locate_token, AppState, AuthSession, TOKEN_COOKIE};
pub use ownership::ensure_owner;
pub use password::{hash_password, verify_dummy, verify_password};
pub use token::{Claims, TokenService, TokenSubject};
