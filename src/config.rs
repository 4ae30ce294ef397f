//! Configuration
//!
//! `BookConfig` is assembled with the `config` crate from built-in defaults,
//! the global file, the workspace file and `AGENTBOOK__*` environment
//! variables (see [`ConfigLoader`]).

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;
pub use paths::{config_home, global_config_path, WORKSPACE_CONFIG_FILE};

use crate::error::BookError;
use crate::logging::LoggingConfig;
use crate::resolver::federation::DEFAULT_AGENTS_ENDPOINT;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOCAL_SERVER_URL: &str = "http://localhost:4440";
pub const DEFAULT_FEDERATION_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_RESOLVER_CACHE_TTL_MS: u64 = 5000;
/// Agents directory used when none is configured, relative to the workspace.
pub const DEFAULT_AGENTS_DIR: &str = "agents";

fn default_local_server_url() -> String {
    DEFAULT_LOCAL_SERVER_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_FEDERATION_TIMEOUT_MS
}

fn default_agents_endpoint() -> String {
    DEFAULT_AGENTS_ENDPOINT.to_string()
}

fn default_resolver_cache_ttl_ms() -> u64 {
    DEFAULT_RESOLVER_CACHE_TTL_MS
}

/// `[federation]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Per-server listing fetch timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Listing path appended to each federated server URL.
    #[serde(default = "default_agents_endpoint")]
    pub agents_endpoint: String,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            agents_endpoint: default_agents_endpoint(),
        }
    }
}

impl FederationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    /// Public origin of this server; local agent URLs are built from it.
    #[serde(default = "default_local_server_url")]
    pub local_server_url: String,

    /// Federated servers, in lookup order.
    #[serde(default)]
    pub federated_servers: Vec<String>,

    #[serde(default)]
    pub federation: FederationConfig,

    #[serde(default = "default_resolver_cache_ttl_ms")]
    pub resolver_cache_ttl_ms: u64,

    /// Directory of `*.book` files; relative paths are taken from the workspace root.
    #[serde(default)]
    pub agents_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            local_server_url: default_local_server_url(),
            federated_servers: Vec::new(),
            federation: FederationConfig::default(),
            resolver_cache_ttl_ms: default_resolver_cache_ttl_ms(),
            agents_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl BookConfig {
    /// Parsed [`local_server_url`](Self::local_server_url).
    pub fn server_url(&self) -> Result<Url, BookError> {
        let url = Url::parse(self.local_server_url.trim()).map_err(|e| {
            BookError::ConfigError(format!(
                "Invalid local_server_url '{}': {}",
                self.local_server_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(BookError::ConfigError(format!(
                "local_server_url must be an absolute http(s) URL, got '{}'",
                self.local_server_url
            )));
        }
        Ok(url)
    }

    pub fn resolver_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.resolver_cache_ttl_ms)
    }

    /// Configured agents directory resolved against `workspace_root`.
    pub fn resolve_agents_dir(&self, workspace_root: &Path) -> PathBuf {
        let dir = self
            .agents_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AGENTS_DIR));
        if dir.is_absolute() {
            dir
        } else {
            workspace_root.join(dir)
        }
    }

    /// Check URLs and numeric bounds.
    pub fn validate(&self) -> Result<(), BookError> {
        self.server_url()?;
        for server in &self.federated_servers {
            let valid = Url::parse(server.trim())
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or(false);
            if !valid {
                return Err(BookError::ConfigError(format!(
                    "Invalid federated server URL '{}'",
                    server
                )));
            }
        }
        if self.federation.timeout_ms == 0 {
            return Err(BookError::ConfigError(
                "federation.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
