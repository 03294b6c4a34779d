//! Version-keyed fetch-once runtime cache
//!
//! Each version key owns a `OnceCell`. The first caller for a key spawns the
//! fetch; callers racing on the same key wait on that cell instead of
//! fetching again, while unrelated keys proceed in parallel. The fetch runs
//! on its own task, so a caller that goes away (client disconnect) never
//! cancels a fetch other callers are waiting on.
//!
//! Filled entries live for the whole process. A failed fetch drops the slot
//! once no other caller is waiting on it, so the next caller retries and
//! failing keys never accumulate.

use crate::error::{ProxyError, ProxyResult};
use crate::runtime::bundle::{extract_bundle, RuntimeBundle, Sentinels};
use crate::upstream::{Locators, Upstream};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

type Slot = Arc<OnceCell<RuntimeBundle>>;

/// Fetch, decode and extract one runtime archive
struct Loader {
    upstream: Arc<dyn Upstream>,
    locators: Locators,
    sentinels: Sentinels,
}

impl Loader {
    async fn load(&self, version: &str) -> ProxyResult<RuntimeBundle> {
        let url = self.locators.runtime(version);
        info!(version, url = %url, "fetching runtime");

        let body = self
            .upstream
            .fetch(&url)
            .await
            .map_err(|e| ProxyError::fetch(version, e))?;

        let sentinels = self.sentinels.clone();
        let bundle = tokio::task::spawn_blocking(move || extract_bundle(&body, &sentinels))
            .await
            .map_err(|e| ProxyError::Internal(format!("runtime extraction task failed: {}", e)))?
            .map_err(|e| ProxyError::fetch(version, e))?;

        info!(
            version,
            script_bytes = bundle.script.len(),
            binary_bytes = bundle.binary.len(),
            "runtime cached"
        );
        Ok(bundle)
    }
}

/// Process-wide cache of runtime bundles keyed by version
pub struct RuntimeCache {
    loader: Arc<Loader>,
    entries: Arc<DashMap<String, Slot>>,
}

impl RuntimeCache {
    /// Create an empty cache fetching through `upstream`
    pub fn new(upstream: Arc<dyn Upstream>, locators: Locators, sentinels: Sentinels) -> Self {
        Self {
            loader: Arc::new(Loader {
                upstream,
                locators,
                sentinels,
            }),
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Get the bundle for `version`, fetching it on first use
    ///
    /// The key is used verbatim; validating it is the caller's job.
    pub async fn get(&self, version: &str) -> ProxyResult<RuntimeBundle> {
        let slot = self.slot(version);
        if let Some(bundle) = slot.get() {
            debug!(version, "runtime cache hit");
            return Ok(bundle.clone());
        }

        debug!(version, "runtime cache miss");
        let loader = Arc::clone(&self.loader);
        let entries = Arc::clone(&self.entries);
        let key = version.to_string();
        let task = tokio::spawn(async move {
            let result = slot
                .get_or_try_init(|| loader.load(&key))
                .await
                .cloned();
            if result.is_err() {
                // Waiters still holding the slot retry on it; the last one out removes it
                drop(slot);
                entries.remove_if(&key, |_, slot| {
                    !slot.initialized() && Arc::strong_count(slot) == 1
                });
            }
            result
        });

        let bundle = task
            .await
            .map_err(|e| ProxyError::Internal(format!("runtime fetch task failed: {}", e)))??;
        debug!(version, cached = self.len(), "runtime ready");
        Ok(bundle)
    }

    /// Whether a bundle for `version` is already cached
    #[cfg(test)]
    pub(crate) fn contains(&self, version: &str) -> bool {
        self.entries
            .get(version)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of cached bundles
    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Whether no bundle has been cached yet
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, version: &str) -> Slot {
        if let Some(slot) = self.entries.get(version) {
            return Arc::clone(slot.value());
        }
        let slot = self.entries.entry(version.to_string()).or_default();
        Arc::clone(slot.value())
    }
}
