use axum::http::HeaderValue;
use std::env;
use std::path::PathBuf;

/// AppConfig
///
/// Holds the portal's entire configuration state. Immutable once loaded and pulled
/// into handlers via `FromRef`, like every other piece of the unified state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and fail-fast rules.
    pub env: Env,
    // Base URL of the backend document/transcript API.
    pub api_base_url: String,
    // JSON file acting as the durable session storage.
    pub session_file: PathBuf,
    // Socket address the portal server binds to. Loopback unless overridden, since
    // the process holds a single user's session.
    pub bind_addr: String,
    // The only browser origin allowed to call the portal cross-origin.
    pub frontend_origin: HeaderValue,
    // How many documents the home view lists.
    pub recent_documents_limit: u32,
}

/// Env
///
/// Defines the runtime context: local development (pretty logs, permissive
/// defaults) or production (JSON logs, mandatory backend URL).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SESSION_FILE: &str = ".insurai/session.json";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_RECENT_DOCUMENTS_LIMIT: u32 = 3;

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests; no environment variables needed.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            frontend_origin: HeaderValue::from_static(DEFAULT_FRONTEND_ORIGIN),
            recent_documents_limit: DEFAULT_RECENT_DOCUMENTS_LIMIT,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in production when `API_BASE_URL` is missing. In any environment, panics
    /// when `RECENT_DOCUMENTS_LIMIT` is set but not a positive integer, or when
    /// `FRONTEND_ORIGIN` is not a valid header value.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => {
                env::var("API_BASE_URL").expect("FATAL: API_BASE_URL must be set in production.")
            }
            Env::Local => {
                env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            }
        };

        let recent_documents_limit = match env::var("RECENT_DOCUMENTS_LIMIT") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .expect("FATAL: RECENT_DOCUMENTS_LIMIT must be a positive integer."),
            Err(_) => DEFAULT_RECENT_DOCUMENTS_LIMIT,
        };

        let frontend_origin = match env::var("FRONTEND_ORIGIN") {
            Ok(raw) => HeaderValue::from_str(raw.trim())
                .expect("FATAL: FRONTEND_ORIGIN must be a valid origin, e.g. http://localhost:3000."),
            Err(_) => HeaderValue::from_static(DEFAULT_FRONTEND_ORIGIN),
        };

        Self {
            env,
            api_base_url,
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            frontend_origin,
            recent_documents_limit,
        }
    }
}
