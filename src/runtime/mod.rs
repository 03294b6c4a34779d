//! Runtime modules served to the browser
//!
//! A runtime release is one upstream archive holding a script module and a
//! binary module. `RuntimeCache` fetches each release at most once and keeps
//! the extracted `RuntimeBundle` for the life of the process.

mod bundle;
mod cache;

pub use bundle::{extract_bundle, RuntimeBundle, Sentinels};
pub use cache::RuntimeCache;
