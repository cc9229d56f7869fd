// src/config.rs
use std::time::Duration;

use log::warn;

pub const DEFAULT_BACKEND_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PREDICT_API_URL: &str = "http://localhost:8080/api/predict";
pub const DEFAULT_STATIC_DIR: &str = "./static";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MOCK_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the external classifier backend.
    pub backend_api_url: String,
    /// Address the proxy listens on.
    pub bind_addr: String,
    /// Prediction endpoint the upload widget submits to.
    pub predict_api_url: String,
    /// Directory of the static demo page.
    pub static_dir: String,
    /// Client-side upload cap enforced by the widget.
    pub max_upload_bytes: usize,
    /// Simulated latency before the demo fallback result is served.
    pub mock_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_api_url: DEFAULT_BACKEND_API_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            predict_api_url: DEFAULT_PREDICT_API_URL.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            mock_delay: Duration::from_millis(DEFAULT_MOCK_DELAY_MS),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults. Unparseable numeric values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("BACKEND_API_URL") {
            config.backend_api_url = value;
        }
        if let Ok(value) = std::env::var("BIND_ADDR") {
            config.bind_addr = value;
        }
        if let Ok(value) = std::env::var("PREDICT_API_URL") {
            config.predict_api_url = value;
        }
        if let Ok(value) = std::env::var("STATIC_DIR") {
            config.static_dir = value;
        }
        if let Ok(value) = std::env::var("MAX_UPLOAD_BYTES") {
            match value.parse() {
                Ok(bytes) => config.max_upload_bytes = bytes,
                Err(_) => warn!("ignoring invalid MAX_UPLOAD_BYTES: {value}"),
            }
        }
        if let Ok(value) = std::env::var("MOCK_DELAY_MS") {
            match value.parse() {
                Ok(ms) => config.mock_delay = Duration::from_millis(ms),
                Err(_) => warn!("ignoring invalid MOCK_DELAY_MS: {value}"),
            }
        }

        config
    }
}
