//! Carimbo Proxy - runtime and bundle caching proxy
//!
//! Serves versioned Carimbo runtime modules (script + WebAssembly) and
//! game source bundles, fetched on demand from the release host and
//! re-packaged before they are served.

pub mod archive;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod runtime;
pub mod server;
pub mod upstream;

pub use error::{ProxyError, ProxyResult};
