//! Upstream artifact host access
//!
//! The `Upstream` trait is the only seam between the proxy and the network.
//! It retrieves raw bytes for a fully formed locator with no caching, no
//! retry and no transformation. `Locators` builds those locators from the
//! configured URL templates.

mod http;
#[cfg(test)]
pub(crate) mod stub;

pub use http::HttpUpstream;

use crate::config::schema::UpstreamConfig;
use crate::error::ProxyResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Source of raw artifact bytes
///
/// Implemented by `HttpUpstream` for the real remote host and by stubs in
/// tests.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetch the full body behind `locator`
    async fn fetch(&self, locator: &str) -> ProxyResult<Bytes>;
}

/// URL templates for the two artifact kinds served by the proxy
#[derive(Debug, Clone)]
pub struct Locators {
    runtime: String,
    bundle: String,
}

impl Locators {
    /// Create locators from explicit templates
    pub fn new(runtime: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            bundle: bundle.into(),
        }
    }

    /// Create locators from the `[upstream]` config section
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.runtime_url.clone(), config.bundle_url.clone())
    }

    /// Locator of the runtime archive for `version`
    ///
    /// The version is substituted verbatim, empty or garbage keys included.
    pub fn runtime(&self, version: &str) -> String {
        self.runtime.replace("{version}", version)
    }

    /// Locator of the tagged source archive for `org/repo` at `release`
    pub fn bundle(&self, org: &str, repo: &str, release: &str) -> String {
        self.bundle
            .replace("{org}", org)
            .replace("{repo}", repo)
            .replace("{release}", release)
    }
}

impl Default for Locators {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}
