//! Sync Configuration
//!
//! Provider, container id and token live in `sync_config.json` inside the data
//! directory. The explicit [`Credentials`] value derived from it is what cache and
//! fetch calls receive; nothing reads configuration from global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{SyncError, SyncResult};

pub const CONFIG_FILE_NAME: &str = "sync_config.json";

pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEARCH_THRESHOLD: f64 = 0.4;
pub const DEFAULT_ICON_PROXY_BASE: &str = "https://wsrv.nl/";
pub const DEFAULT_FAVICON_SERVICE_BASE: &str = "https://www.google.com/s2/favicons";

/// Gist-style document providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Github,
    Gitee,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Gitee => "gitee",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Github => "https://api.github.com",
            Provider::Gitee => "https://gitee.com/api/v5",
        }
    }
}

/// Everything needed to address one remote blob container
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub provider: Provider,
    /// Overrides the provider's default API base
    pub base_url: Option<String>,
    pub blob_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(provider: Provider, blob_id: &str, token: &str) -> Self {
        Self {
            provider,
            base_url: None,
            blob_id: blob_id.to_string(),
            token: token.to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Short blake3 digest of the token; never log or persist the token itself
    pub fn token_hash(&self) -> String {
        let hash = blake3::hash(self.token.as_bytes());
        hash.to_hex()[..16].to_string()
    }

    /// Stable id for this provider endpoint (provider name + effective base)
    pub fn provider_id(&self) -> String {
        format!("{}@{}", self.provider.as_str(), self.api_base())
    }

    /// Scope shared by the cache slot and request coalescing
    pub fn scope_key(&self) -> String {
        format!(
            "{}::{}::{}",
            self.provider_id(),
            self.blob_id,
            self.token_hash()
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("blob_id", &self.blob_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Persisted sync settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub provider: Provider,
    pub base_url: Option<String>,
    pub blob_id: String,
    pub token: String,
    /// Staleness window for the local snapshot cache
    pub cache_max_age_secs: u64,
    pub http_timeout_secs: u64,
    pub icon_proxy_base: String,
    pub favicon_service_base: String,
    /// Fuzzy match threshold, 0 = exact only, 1 = match anything
    pub search_threshold: f64,
    pub log_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            blob_id: String::new(),
            token: String::new(),
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            icon_proxy_base: DEFAULT_ICON_PROXY_BASE.to_string(),
            favicon_service_base: DEFAULT_FAVICON_SERVICE_BASE.to_string(),
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
            log_dir: None,
        }
    }
}

impl SyncConfig {
    pub fn is_configured(&self) -> bool {
        !self.blob_id.trim().is_empty() && !self.token.trim().is_empty()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            provider: self.provider,
            base_url: self.base_url.clone(),
            blob_id: self.blob_id.trim().to_string(),
            token: self.token.trim().to_string(),
        }
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn search_threshold(&self) -> f64 {
        self.search_threshold.clamp(0.0, 1.0)
    }
}

/// Path of the config file inside a data directory
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

/// Load settings; `Ok(None)` when the file does not exist yet
pub fn load_config(path: &Path) -> SyncResult<Option<SyncConfig>> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::Config(format!("{}: {}", path.display(), e))),
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
}

pub fn save_config(path: &Path, config: &SyncConfig) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::Config(e.to_string()))?;
    }
    let json =
        serde_json::to_string_pretty(config).map_err(|e| SyncError::Config(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| SyncError::Config(e.to_string()))
}
