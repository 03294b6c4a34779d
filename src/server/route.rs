//! Request classification and path parameter extraction

use regex::Regex;
use std::sync::LazyLock;

/// `/<version>/<org>/<repo>/<release>...`, only the first segment is required
///
/// Unanchored: the leftmost match wins, so empty leading segments are skipped.
static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?P<version>[^/]+)(?:/(?P<org>[^/]+)/(?P<repo>[^/]+)/(?P<release>[^/]+))?")
        .expect("path pattern is valid")
});

/// Cache header sent with every versioned artifact
pub const CACHE_FOREVER: &str = "public, max-age=31536000";

/// What an inbound path asks for, decided by its suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `*.js`: runtime script module
    Script,
    /// `*.wasm`: runtime binary module
    Binary,
    /// `*.zip`: stripped source release
    Bundle,
    /// `*.ico`: empty favicon
    Favicon,
    /// Anything else: landing page
    Landing,
}

impl Route {
    /// Classify a request path by suffix
    pub fn classify(path: &str) -> Self {
        if path.ends_with(".js") {
            Self::Script
        } else if path.ends_with(".wasm") {
            Self::Binary
        } else if path.ends_with(".zip") {
            Self::Bundle
        } else if path.ends_with(".ico") {
            Self::Favicon
        } else {
            Self::Landing
        }
    }

    /// Content-Type of a successful response
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Script => "application/javascript",
            Self::Binary => "application/wasm",
            Self::Bundle => "application/zip",
            Self::Favicon => "image/x-icon",
            Self::Landing => "text/html",
        }
    }

    /// Cache-Control of a successful response, if any
    pub fn cache_control(&self) -> Option<&'static str> {
        match self {
            Self::Landing => None,
            _ => Some(CACHE_FOREVER),
        }
    }
}

/// Named segments extracted from a request path
///
/// Fields the path does not provide are `None`. Nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    pub version: Option<String>,
    pub org: Option<String>,
    pub repo: Option<String>,
    pub release: Option<String>,
}

impl PathParams {
    /// Extract parameters from `path` with the fixed four-segment pattern
    pub fn extract(path: &str) -> Self {
        let Some(captures) = PATH_PATTERN.captures(path) else {
            return Self::default();
        };
        let field = |name: &str| captures.name(name).map(|m| m.as_str().to_string());

        Self {
            version: field("version"),
            org: field("org"),
            repo: field("repo"),
            release: field("release"),
        }
    }
}
