//! Proxy configuration file
//!
//! One TOML file holds the listener address, the upstream URL templates and
//! the sentinel entry names looked up inside runtime archives. A missing file
//! means built-in defaults; a present file is parsed and then checked so that
//! a broken template fails at startup rather than on the first request.

pub mod schema;

pub use schema::Config;

use crate::error::{ProxyError, ProxyResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Placeholders each upstream template must carry
const RUNTIME_PLACEHOLDERS: &[&str] = &["{version}"];
const BUNDLE_PLACEHOLDERS: &[&str] = &["{org}", "{repo}", "{release}"];

/// Reads and writes the proxy's `config.toml`
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user file, `<config dir>/carimbo-proxy/config.toml`
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Manager for an explicit file (`--config` / `CARIMBO_PROXY_CONFIG`)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("carimbo-proxy")
            .join("config.toml")
    }

    /// Load and check the file, or the defaults when there is none
    pub async fn load(&self) -> ProxyResult<Config> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let config = self.read(&self.config_path).await?;
        check(&config).map_err(|reason| ProxyError::ConfigInvalid {
            path: self.config_path.clone(),
            reason,
        })?;
        debug!(
            path = %self.config_path.display(),
            runtime_url = %config.upstream.runtime_url,
            bundle_url = %config.upstream.bundle_url,
            "config loaded"
        );
        Ok(config)
    }

    async fn read(&self, path: &Path) -> ProxyResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ProxyError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ProxyError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write `config` as TOML, creating the parent directory if needed
    pub async fn save(&self, config: &Config) -> ProxyResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProxyError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ProxyError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject values the proxy could never serve a request with
fn check(config: &Config) -> Result<(), String> {
    let upstream = &config.upstream;
    for (key, template, required) in [
        ("upstream.runtime_url", &upstream.runtime_url, RUNTIME_PLACEHOLDERS),
        ("upstream.bundle_url", &upstream.bundle_url, BUNDLE_PLACEHOLDERS),
    ] {
        if let Some(missing) = required.iter().find(|p| !template.contains(**p)) {
            return Err(format!("{} is missing the {} placeholder", key, missing));
        }
    }

    if upstream.max_body_bytes == 0 {
        return Err("upstream.max_body_bytes must be greater than zero".to_string());
    }

    let runtime = &config.runtime;
    if runtime.script_entry.is_empty() || runtime.binary_entry.is_empty() {
        return Err("runtime entry names must not be empty".to_string());
    }
    if runtime.script_entry == runtime.binary_entry {
        return Err(format!(
            "runtime.script_entry and runtime.binary_entry are both '{}'",
            runtime.script_entry
        ));
    }

    Ok(())
}
