//! Corpus discovery: every markup file beneath the content root.

use std::io;
use std::path::{Path, PathBuf};

use doc_xref_config::PatternList;
use walkdir::WalkDir;

use crate::identity::PageId;
use crate::OperationError;

/// A markup file that belongs to the corpus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusFile {
    pub absolute: PathBuf,
    /// Path relative to the content root.
    pub relative: PathBuf,
}

impl CorpusFile {
    pub fn identity(&self) -> PageId {
        PageId::from_relative_path(&self.relative)
    }

    /// Relative path rendered with `/` separators on every platform.
    pub fn display_path(&self) -> String {
        display_path(&self.relative)
    }
}

/// List all files under `root` whose extension matches `extension`
/// (ASCII case-insensitive), minus those matching `exclude`. Output is sorted
/// by relative path.
pub fn discover(
    root: &Path,
    extension: &str,
    exclude: &PatternList,
) -> Result<Vec<CorpusFile>, OperationError> {
    let metadata = std::fs::metadata(root).map_err(|source| OperationError::CorpusUnavailable {
        root: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(OperationError::CorpusUnavailable {
            root: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| OperationError::CorpusUnavailable {
            root: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source: err.into(),
        })?;

        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        if exclude.matches(&relative) {
            tracing::debug!(path = %relative.display(), "excluded by content.exclude");
            continue;
        }

        files.push(CorpusFile {
            absolute: entry.path().to_path_buf(),
            relative,
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

pub(crate) fn display_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
