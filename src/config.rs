//! Configuration for the offline layer
//!
//! Covers the cache version, the hosts and paths the router classifies
//! against, the precache manifest, and the fallback payload catalog. Loaded
//! from a YAML file when one exists; every field has a default, so the layer
//! also runs with no configuration at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fallback::FallbackCatalog;
use crate::store::NamespaceKind;

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE: &str = "tripcache.yaml";

/// Default HTML served for navigations that fail with nothing cached
const DEFAULT_SHELL: &str = "<!doctype html>\n\
<html lang=\"en\">\n\
<head><meta charset=\"utf-8\"><title>TripMate</title></head>\n\
<body>\n\
<h1>TripMate</h1>\n\
<p>You're offline. Saved trips are still available.</p>\n\
</body>\n\
</html>\n";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Reading the config file failed
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid YAML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Settings controlling caching, routing, and fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Cache version tag appended to every namespace name
    ///
    /// Bumping this retires all previous namespaces on the next activation.
    pub version: String,
    /// Origin the app itself is served from
    pub site_base: String,
    /// Origin of the backend API
    pub api_base: String,
    /// Path prefix identifying API data requests
    pub api_prefix: String,
    /// Cross-origin hosts whose responses are treated as static assets
    pub asset_hosts: Vec<String>,
    /// URLs fetched ahead of time during install
    ///
    /// Entries may be absolute URLs (cross-origin allowed) or paths resolved
    /// against `site_base`.
    pub precache: Vec<String>,
    /// HTML served for navigations when the network and cache both miss
    pub default_shell: String,
    /// Overrides the on-disk location of the store and sync queue
    pub cache_dir: Option<PathBuf>,
    /// Synthetic payloads served for unreachable API endpoints
    pub fallbacks: FallbackCatalog,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            site_base: "https://tripmate.example".to_string(),
            api_base: "https://api.tripmate.example".to_string(),
            api_prefix: "/api/".to_string(),
            asset_hosts: vec![
                "https://fonts.googleapis.com".to_string(),
                "https://fonts.gstatic.com".to_string(),
                "https://unpkg.com".to_string(),
            ],
            precache: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/styles.css".to_string(),
                "/app.js".to_string(),
                "/manifest.json".to_string(),
                "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css".to_string(),
            ],
            default_shell: DEFAULT_SHELL.to_string(),
            cache_dir: None,
            fallbacks: FallbackCatalog::default(),
        }
    }
}

impl OfflineConfig {
    /// Loads configuration from file
    ///
    /// Search order:
    /// 1. Explicit path if provided (an error if it does not exist)
    /// 2. ./tripcache.yaml (current directory)
    /// 3. XDG config directory (`~/.config/tripcache/config.yaml` on Linux)
    ///
    /// Falls back to `OfflineConfig::default()` when no file is found.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = if let Some(p) = explicit_path {
            if p.exists() {
                Some(p.to_path_buf())
            } else {
                return Err(ConfigError::NotFound(p.to_path_buf()));
            }
        } else {
            Self::find_config_file()
        };

        match path {
            Some(p) => Self::load_from_path(&p),
            None => Ok(Self::default()),
        }
    }

    fn find_config_file() -> Option<PathBuf> {
        // Check current directory
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        // Check XDG config directory
        if let Some(project_dirs) = directories::ProjectDirs::from("", "", "tripcache") {
            let xdg_path = project_dirs.config_dir().join("config.yaml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        None
    }

    /// Loads configuration from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The versioned namespace tag for a cache partition
    ///
    /// # Arguments
    /// * `kind` - Which partition to name
    ///
    /// # Returns
    /// A tag like `static-v1`.
    pub fn namespace(&self, kind: NamespaceKind) -> String {
        format!("{}-{}", kind.prefix(), self.version)
    }

    /// Every namespace tag belonging to the current version
    pub fn current_namespaces(&self) -> Vec<String> {
        NamespaceKind::ALL
            .iter()
            .map(|kind| self.namespace(*kind))
            .collect()
    }

    /// Joins a path onto the API origin
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// The health endpoint probed to decide whether the backend is reachable
    pub fn health_url(&self) -> String {
        self.api_url(&format!("{}health", self.api_prefix))
    }

    /// The precache manifest with relative entries resolved against `site_base`
    pub fn precache_urls(&self) -> Vec<String> {
        self.precache
            .iter()
            .map(|entry| {
                if entry.starts_with("http://") || entry.starts_with("https://") {
                    entry.clone()
                } else {
                    format!("{}{}", self.site_base.trim_end_matches('/'), entry)
                }
            })
            .collect()
    }
}
