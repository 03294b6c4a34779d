//! Root-directory stripping for tagged source archives
//!
//! Tag archives wrap every file in one synthetic top-level folder
//! (`repo-1.2.3/...`). `strip_root_dir` rewrites the archive with the first
//! path segment of every entry removed. Entry data is copied raw, so the
//! compressed bytes and CRCs of the input carry over unchanged.
//!
//! An entry without a separator (a top-level file) or the root folder entry
//! itself ends up with an empty name. Two entries colliding on the same
//! stripped name abort the whole transform.

use crate::error::{ProxyError, ProxyResult};
use std::io::Cursor;
use tracing::trace;
use zip::{ZipArchive, ZipWriter};

/// Drop the first path segment of `name`
pub fn strip_first_segment(name: &str) -> &str {
    match name.split_once('/') {
        Some((_, rest)) => rest,
        None => "",
    }
}

/// Rewrite `data` with the synthetic top-level directory removed
///
/// Fails with `Decode` if the input is not a readable archive and with
/// `Write` if any output entry cannot be written. No partial output is ever
/// returned.
pub fn strip_root_dir(data: &[u8]) -> ProxyResult<Vec<u8>> {
    let mut reader = ZipArchive::new(Cursor::new(data)).map_err(ProxyError::Decode)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(data.len())));

    for index in 0..reader.len() {
        let entry = reader.by_index_raw(index).map_err(ProxyError::Decode)?;
        let name = strip_first_segment(entry.name()).to_string();
        trace!(from = entry.name(), to = %name, "renaming archive entry");

        writer
            .raw_copy_file_rename(entry, name.as_str())
            .map_err(|e| ProxyError::write(format!("entry '{}'", name), e))?;
    }

    let output = writer
        .finish()
        .map_err(|e| ProxyError::write("central directory", e))?;
    Ok(output.into_inner())
}
