//! Shared utilities for doc-xref crates.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

/// Replace the report at `path` with `contents`.
///
/// The report is staged in a `.doc-xref*` temp file next to the target and
/// renamed into place, so a reader sees either the old report or the new one.
/// A target that already holds exactly `contents` is left alone and `false`
/// is returned.
pub fn write_report(path: &Path, contents: &str) -> io::Result<bool> {
    if fs::read(path).map_or(false, |existing| existing == contents.as_bytes()) {
        return Ok(false);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = Builder::new()
        .prefix(".doc-xref")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(staged.path(), metadata.permissions())?;
    }

    staged.persist(path).map_err(|err| err.error)?;
    Ok(true)
}
