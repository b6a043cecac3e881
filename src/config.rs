// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database path for the cache and upload queue
    pub cache_db_path: PathBuf,

    /// Remote backend API endpoint URL
    pub backend_api_url: String,

    /// Optional authentication token for the backend API
    #[serde(default)]
    pub backend_api_key: Option<String>,

    /// Deadline for each backend or image-host call, in seconds
    pub request_timeout_secs: u64,

    /// Reachability probe interval for the headless daemon, in seconds
    pub probe_interval_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("PLACESHOT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let mut config: Config = if std::path::Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };

        if let Ok(val) = std::env::var("PLACESHOT_CACHE_DB_PATH") {
            config.cache_db_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PLACESHOT_BACKEND_API_URL") {
            config.backend_api_url = val;
        }
        if let Ok(val) = std::env::var("PLACESHOT_BACKEND_API_KEY") {
            config.backend_api_key = Some(val);
        }
        if let Ok(val) = std::env::var("PLACESHOT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = val.parse()?;
        }
        if let Ok(val) = std::env::var("PLACESHOT_PROBE_INTERVAL_SECS") {
            config.probe_interval_secs = val.parse()?;
        }
        if let Ok(val) = std::env::var("PLACESHOT_LOG_LEVEL") {
            config.log_level = val;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_db_path: PathBuf::from("placeshot-cache.db"),
            backend_api_url: String::from("http://localhost:3000/api"),
            backend_api_key: None,
            request_timeout_secs: 30,
            probe_interval_secs: 60,
            log_level: String::from("info"),
        }
    }
}
