//! API route handlers and application composition.

pub mod auth;
pub mod posts;

use crate::auth::middleware::AppState;
use crate::middleware::security_headers;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Account endpoints (the extra paths are aliases kept for older clients)
        .route("/register", post(auth::register))
        .route("/registrar", post(auth::register))
        .route("/api/auth/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/api/auth/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/api/me/password", put(auth::change_password))
        .route("/willkommen", get(auth::willkommen))
        // Post endpoints
        .route(
            "/api/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
}

/// CORS policy. With no configured origins every cross-origin request is
/// refused; otherwise the listed origins may call with credentials (cookies).
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn index() -> &'static str {
    "Blog API running"
}

/// The full application: API routes, optional static files, body limit,
/// CORS and security headers, configured from `state.config`.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = match &config.static_dir {
        Some(dir) => api_router().fallback_service(ServeDir::new(dir)),
        None => api_router().route("/", get(index)),
    };

    router
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state)
}
