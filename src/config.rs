//! # Configuration Management
//!
//! This module provides configuration management for the mission service.
//! Configuration is stored in Cloudflare KV storage and loaded at runtime
//! with defaults for all required settings.
//!
//! ## Configuration Sources
//!
//! 1. **KV Storage**: Primary configuration source stored under the "config" key
//! 2. **Defaults**: Fallback values when KV storage is unavailable or empty

use crate::constants::{
    DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_MEDIA_BASE_URL, MEDIA_BUCKET_NAME, MISSIONS_DB_NAME,
};
use serde::{Deserialize, Serialize};
use worker::kv::KvStore;
use worker::{console_log, Result};

/// Configuration for the mission service.
///
/// Loaded once per isolate and shared read-only across requests; every field
/// is a plain value so concurrent handlers never contend on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the D1 binding holding mission rows.
    /// Must match the binding name in wrangler.toml.
    pub database_name: String,

    /// Name of the R2 binding holding uploaded media.
    pub bucket_name: String,

    /// Public base URL uploaded objects are served from.
    pub media_base_url: String,

    /// Host the offline cache considers "same origin". Requests to other
    /// hosts pass through uncached. `None` disables the check.
    pub site_host: Option<String>,

    /// Maximum accepted upload size in bytes.
    pub max_upload_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_name: MISSIONS_DB_NAME.to_string(),
            bucket_name: MEDIA_BUCKET_NAME.to_string(),
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
            site_host: None,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration from KV storage with fallback to defaults.
    ///
    /// Reads the "config" key; if it is absent the defaults apply. KV access
    /// errors are propagated, invalid JSON in the stored value surfaces as a
    /// parse error rather than being silently replaced.
    pub async fn load(kv: &KvStore) -> Result<Self> {
        match kv.get("config").json().await? {
            Some(config) => {
                console_log!("Configuration loaded from KV storage");
                Ok(config)
            }
            None => {
                console_log!("Config not found in KV, using default");
                Ok(Self::default())
            }
        }
    }

    /// Public URL for an object stored under `key`.
    pub fn public_media_url(&self, key: &str) -> String {
        format!("{}/{}", self.media_base_url.trim_end_matches('/'), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_media_url_joins_without_double_slash() {
        let mut config = Config::default();
        config.media_base_url = "https://media.example.com/".to_string();
        assert_eq!(
            config.public_media_url("motivation/1-a.png"),
            "https://media.example.com/motivation/1-a.png"
        );
    }
}
