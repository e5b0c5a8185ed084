//! inkpad application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Build the token service from the signing secret
//! 3. Connect to Redis
//! 4. Build the app (API routes, optional static files, CORS, security headers)
//! 5. Start Axum server

use inkpad::{
    auth::{AppState, TokenService},
    config::{Config, RECOMMENDED_SECRET_LEN},
    routes,
    storage::RedisStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter support (RUST_LOG), info by default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load config from environment; a missing JWT_SECRET stops startup here
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting inkpad on {}", config.bind_addr);

    if config.jwt_secret.len() < RECOMMENDED_SECRET_LEN {
        tracing::warn!(
            min_len = RECOMMENDED_SECRET_LEN,
            "JWT_SECRET is shorter than recommended"
        );
    }

    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl_secs)
        .expect("Invalid token configuration");

    // Connect to Redis
    let redis_client = redis::Client::open(config.redis_url.as_str()).expect("Invalid Redis URL");

    // Verify Redis connection
    redis_client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");
    tracing::info!("Connected to Redis");

    let store = RedisStore::new(redis_client);

    // Build shared state
    let state = AppState {
        users: Arc::new(store.clone()),
        posts: Arc::new(store),
        tokens: Arc::new(tokens),
        config: Arc::new(config.clone()),
    };

    if let Some(dir) = &config.static_dir {
        tracing::info!(static_dir = %dir.display(), "Serving static files");
    }

    let app = routes::build_app(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
