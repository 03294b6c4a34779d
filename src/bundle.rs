//! Source release bundles
//!
//! Fetches the tagged source archive of a game repository and strips its
//! synthetic root folder before it is served. Nothing is cached here.

use crate::archive::strip_root_dir;
use crate::error::{ProxyError, ProxyResult};
use crate::upstream::{Locators, Upstream};
use bytes::Bytes;
use std::sync::Arc;
use tracing::info;

/// Fetch-and-transform pipeline for source bundles
pub struct BundleService {
    upstream: Arc<dyn Upstream>,
    locators: Locators,
}

impl BundleService {
    pub fn new(upstream: Arc<dyn Upstream>, locators: Locators) -> Self {
        Self { upstream, locators }
    }

    /// Fetch `org/repo` at `release` with the root directory stripped
    ///
    /// Fetch failures surface as-is. Decode and write failures from the
    /// transform are wrapped in `ProxyError::Transform`.
    pub async fn fetch(&self, org: &str, repo: &str, release: &str) -> ProxyResult<Bytes> {
        let url = self.locators.bundle(org, repo, release);
        info!(org, repo, release, url = %url, "fetching source bundle");

        let body = self.upstream.fetch(&url).await?;
        let fetched = body.len();

        let stripped = tokio::task::spawn_blocking(move || strip_root_dir(&body))
            .await
            .map_err(|e| ProxyError::Internal(format!("bundle transform task failed: {}", e)))?
            .map_err(|e| ProxyError::Transform {
                org: org.to_string(),
                repo: repo.to_string(),
                release: release.to_string(),
                source: Box::new(e),
            })?;

        info!(org, repo, release, fetched, served = stripped.len(), "source bundle ready");
        Ok(Bytes::from(stripped))
    }
}
