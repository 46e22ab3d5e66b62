//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Remote API ===
    /// Base URL of the admin API, ending in `/api`.
    #[serde(default = "default_api_url")]
    pub admin_api_url: String,

    /// Static bearer token. Takes precedence over the token store.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Location of the persisted token store.
    #[serde(default)]
    pub token_store_path: Option<PathBuf>,

    /// Request timeout. Unset means requests wait indefinitely.
    #[serde(default)]
    pub http_timeout_ms: Option<u64>,
}

fn default_api_url() -> String {
    "http://localhost:3000/api".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_api_url: default_api_url(),
            admin_token: None,
            token_store_path: None,
            http_timeout_ms: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.admin_api_url)
            .map_err(|e| format!("ADMIN_API_URL is not a valid url: {}", e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err("ADMIN_API_URL must use http or https".to_string());
        }

        if matches!(self.admin_token.as_deref(), Some("")) {
            return Err("ADMIN_TOKEN must not be empty when set".to_string());
        }

        if self.http_timeout_ms == Some(0) {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Request timeout, if one is configured.
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_ms.map(Duration::from_millis)
    }

    /// Effective token store path: the configured one, else the user config dir.
    pub fn token_store_path(&self) -> Option<PathBuf> {
        self.token_store_path.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("market-admin").join("store.json"))
        })
    }
}
