//! In-memory upstream for tests

use crate::error::{ProxyError, ProxyResult};
use crate::upstream::Upstream;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a deflated zip from `(name, content)` pairs
pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Upstream serving fixed bodies by locator, counting every fetch
#[derive(Default)]
pub struct StubUpstream {
    bodies: HashMap<String, Vec<u8>>,
    fallback: Option<Vec<u8>>,
    delay: Option<Duration>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for every locator without an explicit route
    pub fn with_fallback(mut self, body: Vec<u8>) -> Self {
        self.fallback = Some(body);
        self
    }

    /// Serve `body` for exactly `locator`
    pub fn with_route(mut self, locator: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(locator.to_string(), body);
        self
    }

    /// Sleep before answering each fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every subsequent fetch fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn fetch(&self, locator: &str) -> ProxyResult<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(locator.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(ProxyError::Transport {
                url: locator.to_string(),
                reason: "stub upstream is down".to_string(),
            });
        }

        self.bodies
            .get(locator)
            .or(self.fallback.as_ref())
            .map(|body| Bytes::from(body.clone()))
            .ok_or_else(|| ProxyError::Transport {
                url: locator.to_string(),
                reason: "no route".to_string(),
            })
    }
}
