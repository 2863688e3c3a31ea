use std::path::PathBuf;

use crate::codec::cache::DEFAULT_CAPACITY;

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Discovery cache capacity.
    pub cache_capacity: usize,
    /// Optional dictionary table replacing the builtin one.
    pub dictionary_path: Option<PathBuf>,
    /// Public base URL used in share and preview links.
    pub public_url: String,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            host: lookup("HOST").unwrap_or(defaults.host),
            cache_capacity: lookup("CHESS_CACHE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.cache_capacity),
            dictionary_path: lookup("CHESS_DICTIONARY_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            public_url: lookup("CHESS_PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.public_url),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Page URL for a share code.
    pub fn share_url(&self, code: &str) -> String {
        format!("{}/p/{code}", self.public_url)
    }

    /// Preview-image URL for a preview code.
    pub fn preview_url(&self, preview_code: &str) -> String {
        format!("{}/og/{preview_code}.png", self.public_url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            cache_capacity: DEFAULT_CAPACITY,
            dictionary_path: None,
            public_url: "https://chss.chat".to_string(),
        }
    }
}
