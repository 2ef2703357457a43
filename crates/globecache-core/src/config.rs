//! Worker configuration.
//!
//! The configuration carries the version tag that both cache partition names
//! are derived from, the scope URL relative asset paths resolve against, and
//! the fixed list of assets to pre-cache on install.
//!
//! Configuration is stored at `~/.config/globecache/config.json`.

use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, WorkerError, WorkerResult};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "globecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_VERSION: &str = "wwii-globe-v1.0.0";

pub const DEFAULT_SCOPE: &str = "http://localhost:8000/";

/// Files cached immediately on install.
/// CDN resources are cached on first access via the runtime partition.
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./battles.json",
    "./chapters.json",
    "./i18n.json",
];

pub const DEFAULT_SYNC_TAG: &str = "sync-battles";

pub const DEFAULT_SYNC_RESOURCE: &str = "./battles.json";

pub const DEFAULT_OFFLINE_PAGE: &str =
    "<h1>Offline</h1><p>You are currently offline. Please check your internet connection.</p>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub version: String,
    pub scope: String,
    pub static_assets: Vec<String>,
    pub sync_tag: String,
    pub sync_resource: String,
    pub offline_page: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            static_assets: DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            sync_tag: DEFAULT_SYNC_TAG.to_string(),
            sync_resource: DEFAULT_SYNC_RESOURCE.to_string(),
            offline_page: DEFAULT_OFFLINE_PAGE.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Name of the partition holding the pre-cached static assets
    pub fn static_cache_name(&self) -> String {
        format!("{}-static", self.version)
    }

    /// Name of the partition filled by intercepted requests
    pub fn runtime_cache_name(&self) -> String {
        format!("{}-runtime", self.version)
    }

    /// Whether a partition name belongs to the current version
    pub fn is_current_partition(&self, name: &str) -> bool {
        name == self.static_cache_name() || name == self.runtime_cache_name()
    }

    /// Resolve a possibly relative path against the worker scope
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        let scope = Url::parse(&self.scope)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.scope, e)))?;
        scope
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    pub fn load() -> WorkerResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path, falling back to defaults when it is absent
    pub fn load_from(path: &PathBuf) -> WorkerResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> WorkerResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &PathBuf) -> WorkerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> WorkerResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WorkerError::Config("Could not find config directory".to_string()))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory the on-disk cache storage lives in
    pub fn cache_dir(&self) -> WorkerResult<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| WorkerError::Config("Could not find cache directory".to_string()))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
