//! Corpus Index assembly.
//!
//! Files are parsed and extracted in parallel, then inserted by a single
//! writer. The finished [`CorpusIndex`] is never mutated again; validation
//! only ever receives a shared reference to it.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use doc_xref_parser::MarkupParser;
use rayon::prelude::*;

use crate::corpus::CorpusFile;
use crate::extract::{extract, ExtractOptions, Extraction};
use crate::identity::PageId;
use crate::{MalformedDocument, OperationError};

/// Extracted data for one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRecord {
    /// Source file relative to the content root.
    pub path: PathBuf,
    pub anchors: BTreeSet<String>,
    /// Distinct internal link targets mapped to their first line.
    pub links: BTreeMap<String, usize>,
}

/// Complete mapping from page identity to its record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorpusIndex {
    pages: BTreeMap<PageId, PageRecord>,
}

impl CorpusIndex {
    pub fn get(&self, identity: &str) -> Option<&PageRecord> {
        self.pages.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.pages.contains_key(identity)
    }

    /// Pages in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&PageId, &PageRecord)> {
        self.pages.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &PageId> {
        self.pages.keys()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Result of indexing a corpus: the index plus every file left out of it.
#[derive(Clone, Debug, Default)]
pub struct IndexBuild {
    pub index: CorpusIndex,
    pub malformed: Vec<MalformedDocument>,
    pub files_scanned: usize,
}

/// Fail when two files normalise to the same identity.
pub fn ensure_unique_identities(files: &[CorpusFile]) -> Result<(), OperationError> {
    let mut seen: BTreeMap<PageId, &CorpusFile> = BTreeMap::new();
    for file in files {
        match seen.entry(file.identity()) {
            Entry::Occupied(existing) => {
                return Err(OperationError::IdentityCollision {
                    identity: existing.key().clone(),
                    first: existing.get().relative.clone(),
                    second: file.relative.clone(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
        }
    }
    Ok(())
}

/// Parse and extract every file, then assemble the index.
///
/// Runs on the current rayon pool. Read failures abort the build; parse
/// failures are collected as [`MalformedDocument`] entries and the page is
/// left out of the index.
pub fn build_index(
    files: &[CorpusFile],
    parser: &dyn MarkupParser,
    options: ExtractOptions,
) -> Result<IndexBuild, OperationError> {
    ensure_unique_identities(files)?;

    let parsed = files
        .par_iter()
        .map(|file| process_file(file, parser, options).map(|result| (file, result)))
        .collect::<Result<Vec<_>, OperationError>>()?;

    let mut pages = BTreeMap::new();
    let mut malformed = Vec::new();
    for (file, result) in parsed {
        match result {
            Ok(extraction) => {
                pages.insert(
                    file.identity(),
                    PageRecord {
                        path: file.relative.clone(),
                        anchors: extraction.anchors,
                        links: extraction.links,
                    },
                );
            }
            Err(err) => {
                tracing::warn!(path = %file.display_path(), error = %err.source, "malformed document");
                malformed.push(err);
            }
        }
    }

    Ok(IndexBuild {
        index: CorpusIndex { pages },
        malformed,
        files_scanned: files.len(),
    })
}

fn process_file(
    file: &CorpusFile,
    parser: &dyn MarkupParser,
    options: ExtractOptions,
) -> Result<Result<Extraction, MalformedDocument>, OperationError> {
    let bytes = std::fs::read(&file.absolute).map_err(|source| OperationError::Io {
        path: file.absolute.clone(),
        source,
    })?;

    let document = match parser.parse_bytes(&bytes) {
        Ok(document) => document,
        Err(source) => {
            return Ok(Err(MalformedDocument {
                path: file.relative.clone(),
                source,
            }))
        }
    };

    let extraction = extract(&document, options);
    tracing::debug!(
        path = %file.display_path(),
        anchors = extraction.anchors.len(),
        links = extraction.links.len(),
        "extracted page"
    );
    Ok(Ok(extraction))
}
