//! HTTP upstream backed by a blocking `ureq` agent
//!
//! Requests run on tokio's blocking pool so the async executor is never
//! stalled by network I/O. No retry and no timeout beyond the transport
//! defaults.

use crate::config::schema::UpstreamConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::upstream::Upstream;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Instant;
use tracing::debug;

/// Real upstream talking HTTP(S) to the artifact host
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl HttpUpstream {
    /// Build an upstream from the `[upstream]` config section
    pub fn new(config: &UpstreamConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .user_agent(config.user_agent.clone())
            .http_status_as_error(config.strict_status)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn fetch_blocking(&self, url: &str) -> ProxyResult<Vec<u8>> {
        let started = Instant::now();
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| ProxyError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| ProxyError::Read {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream fetch complete"
        );
        Ok(body)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, locator: &str) -> ProxyResult<Bytes> {
        debug!(url = locator, "fetching from upstream");

        let this = self.clone();
        let url = locator.to_string();
        let body = tokio::task::spawn_blocking(move || this.fetch_blocking(&url))
            .await
            .map_err(|e| ProxyError::Internal(format!("upstream fetch task failed: {}", e)))??;

        Ok(Bytes::from(body))
    }
}
