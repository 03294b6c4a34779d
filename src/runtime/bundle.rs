//! Runtime bundle and sentinel extraction

use crate::config::schema::RuntimeConfig;
use crate::error::{ProxyError, ProxyResult};
use bytes::Bytes;
use std::io::{Cursor, Read};
use tracing::warn;
use zip::ZipArchive;

/// Script and binary modules of one runtime release
///
/// Immutable once built. Cloning is cheap, both payloads are shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeBundle {
    /// The JavaScript loader module
    pub script: Bytes,
    /// The WebAssembly module
    pub binary: Bytes,
}

/// Entry names searched for inside a runtime archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    pub script: String,
    pub binary: String,
}

impl Sentinels {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            script: config.script_entry.clone(),
            binary: config.binary_entry.clone(),
        }
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

/// Pull the sentinel entries out of a runtime archive
///
/// Entries not named by `sentinels` are ignored. A missing sentinel leaves
/// its field empty rather than failing.
pub fn extract_bundle(data: &[u8], sentinels: &Sentinels) -> ProxyResult<RuntimeBundle> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(ProxyError::Decode)?;
    let mut script = None;
    let mut binary = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(ProxyError::Decode)?;

        let slot = if entry.name() == sentinels.script {
            &mut script
        } else if entry.name() == sentinels.binary {
            &mut binary
        } else {
            continue;
        };

        // Declared sizes come from the archive header and are not trusted
        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| ProxyError::EntryRead {
                name: entry.name().to_string(),
                source: e,
            })?;
        *slot = Some(Bytes::from(content));
    }

    if script.is_none() {
        warn!(entry = %sentinels.script, "runtime archive has no script module");
    }
    if binary.is_none() {
        warn!(entry = %sentinels.binary, "runtime archive has no binary module");
    }

    Ok(RuntimeBundle {
        script: script.unwrap_or_default(),
        binary: binary.unwrap_or_default(),
    })
}
