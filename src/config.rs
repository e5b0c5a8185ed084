use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Minimum secret length below which startup logs a warning.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    // Token signing
    pub jwt_secret: String,
    pub token_ttl_secs: u64,

    // Store
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
    pub static_dir: Option<PathBuf>,
    pub cors_origins: Vec<String>,

    // Cookie
    pub cookie_secure: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("static_dir", &self.static_dir)
            .field("cors_origins", &self.cors_origins)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Signing secret - required, there is no built-in fallback
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let token_ttl_secs: u64 = parse_env_or_default("TOKEN_TTL_SECS", 7_200)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Store connection string
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let mut bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // PORT wins over the port part of BIND_ADDR
        if let Ok(port) = env::var("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|e| ConfigError::ParseError("PORT".to_string(), format!("{}: {}", e, port)))?;
            bind_addr.set_port(port);
        }

        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 1_048_576)?;

        let static_dir = env::var("STATIC_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        for origin in &cors_origins {
            if axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::InvalidValue(
                    "CORS_ORIGINS".to_string(),
                    format!("not a valid origin: {}", origin),
                ));
            }
        }

        let cookie_secure = parse_env_or_default("COOKIE_SECURE", false)?;

        Ok(Config {
            jwt_secret,
            token_ttl_secs,
            redis_url,
            bind_addr,
            max_body_bytes,
            static_dir,
            cors_origins,
            cookie_secure,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
