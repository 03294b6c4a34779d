//! Error types for carimbo-proxy
//!
//! All modules use `ProxyResult<T>` as their return type.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Stage of the runtime fetch pipeline that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Connecting to or talking with the upstream host
    Network,
    /// Reading the response body or an archive entry
    Read,
    /// Parsing the fetched bytes as an archive
    Decode,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Read => "read",
            Self::Decode => "decode",
        };
        write!(f, "{}", name)
    }
}

/// All errors that can occur in carimbo-proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    // Upstream errors
    #[error("upstream request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("failed to read upstream body from {url}: {reason}")]
    Read { url: String, reason: String },

    // Archive errors
    #[error("failed to decode archive: {0}")]
    Decode(#[source] zip::result::ZipError),

    #[error("failed to read archive entry {name}: {source}")]
    EntryRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive {context}: {source}")]
    Write {
        context: String,
        #[source]
        source: zip::result::ZipError,
    },

    // Aggregates at the cache / bundle boundary
    #[error("fetching runtime {version} failed at {stage} stage: {source}")]
    Fetch {
        version: String,
        stage: FetchStage,
        #[source]
        source: Box<ProxyError>,
    },

    #[error("transforming bundle {org}/{repo}@{release} failed: {source}")]
    Transform {
        org: String,
        repo: String,
        release: String,
        #[source]
        source: Box<ProxyError>,
    },

    // Server errors
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a bind error for a listen address
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.to_string(),
            source,
        }
    }

    /// Create an archive write error
    pub fn write(context: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Write {
            context: context.into(),
            source,
        }
    }

    /// Wrap a runtime pipeline error, tagging it with the stage that failed
    pub fn fetch(version: impl Into<String>, source: ProxyError) -> Self {
        let stage = source.stage().unwrap_or(FetchStage::Network);
        Self::Fetch {
            version: version.into(),
            stage,
            source: Box::new(source),
        }
    }

    /// Pipeline stage this error belongs to, if any
    pub fn stage(&self) -> Option<FetchStage> {
        match self {
            Self::Transport { .. } => Some(FetchStage::Network),
            Self::Read { .. } | Self::EntryRead { .. } => Some(FetchStage::Read),
            Self::Decode(_) => Some(FetchStage::Decode),
            Self::Fetch { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether this error was caused by the upstream host or its payload
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Read { .. }
                | Self::Decode(_)
                | Self::EntryRead { .. }
                | Self::Fetch { .. }
                | Self::Transform { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Bind { .. } => Some("Set PORT (or --port) to a free port"),
            Self::InvalidAddress(_) => Some("Use an IP address for --host, e.g. 0.0.0.0"),
            Self::ConfigInvalid { .. } => Some("Run: carimbo-proxy config init --force"),
            _ => None,
        }
    }
}
