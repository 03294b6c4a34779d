//! Configuration schema for carimbo-proxy
//!
//! Configuration is stored at `~/.config/carimbo-proxy/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP listener settings
    pub server: ServerConfig,

    /// Remote artifact host settings
    pub upstream: UpstreamConfig,

    /// Runtime archive layout
    pub runtime: RuntimeConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to bind (overridden by `PORT`)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream artifact host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Runtime archive URL template, `{version}` is substituted
    pub runtime_url: String,

    /// Source bundle URL template, `{org}`, `{repo}` and `{release}` are substituted
    pub bundle_url: String,

    /// User-Agent sent upstream
    pub user_agent: String,

    /// Largest response body accepted from upstream
    pub max_body_bytes: u64,

    /// Treat non-2xx upstream statuses as transport failures
    pub strict_status: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            runtime_url:
                "https://github.com/carimbolabs/carimbo/releases/download/v{version}/WebAssembly.zip"
                    .to_string(),
            bundle_url: "https://github.com/{org}/{repo}/archive/refs/tags/v{release}.zip"
                .to_string(),
            user_agent: concat!("carimbo-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 512 * 1024 * 1024,
            strict_status: true,
        }
    }
}

/// Names of the payload entries inside a runtime archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Script module entry name
    pub script_entry: String,

    /// Binary module entry name
    pub binary_entry: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            script_entry: "carimbo.js".to_string(),
            binary_entry: "carimbo.wasm".to_string(),
        }
    }
}
