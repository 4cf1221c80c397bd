//! Service configuration.
//!
//! Resolved once at startup from environment variables (with a `.env`
//! fallback via `dotenvy`) and passed down explicitly; nothing reads the
//! environment after construction.

use std::time::Duration;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::pipeline::DEFAULT_STAGE_PAUSE;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Address the HTTP surface binds to.
    pub bind_addr: String,
    /// Base URL of the OpenAI-compatible model backend (ending in `/v1`).
    pub model_base_url: String,
    /// Model identifier sent with every completion request.
    pub model_name: String,
    /// Service-level model credential; per-request keys override it.
    pub model_api_key: Option<String>,
    /// Service-level repository token; per-request tokens override it.
    pub github_token: Option<String>,
    /// Bounded context-cache capacity.
    pub cache_capacity: usize,
    /// Pause between phase status transitions.
    pub stage_pause: Duration,
    /// Per-fragment model backend timeout.
    pub fragment_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_owned(),
            model_base_url: "http://127.0.0.1:1234/v1".to_owned(),
            model_name: "qwen2.5-coder-14b-instruct".to_owned(),
            model_api_key: None,
            github_token: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            stage_pause: DEFAULT_STAGE_PAUSE,
            fragment_timeout: Duration::from_secs(120),
        }
    }
}

impl ServiceConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            bind_addr: env_or("DIAGRAMSMITH_BIND_ADDR", defaults.bind_addr),
            model_base_url: env_or("MODEL_BASE_URL", defaults.model_base_url),
            model_name: env_or("MODEL_NAME", defaults.model_name),
            model_api_key: std::env::var("MODEL_API_KEY").ok(),
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            cache_capacity: env_parsed("DIAGRAMSMITH_CACHE_CAPACITY", defaults.cache_capacity),
            stage_pause: Duration::from_millis(env_parsed(
                "DIAGRAMSMITH_STAGE_PAUSE_MS",
                defaults.stage_pause.as_millis() as u64,
            )),
            fragment_timeout: Duration::from_secs(env_parsed(
                "MODEL_FRAGMENT_TIMEOUT_SECS",
                defaults.fragment_timeout.as_secs(),
            )),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
