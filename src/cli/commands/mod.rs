//! CLI command implementations

pub mod completions;
pub mod config;
pub mod serve;

pub use completions::execute as completions;
pub use config::execute as config;
pub use serve::execute as serve;
