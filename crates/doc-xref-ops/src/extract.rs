//! Anchor and link extraction over a single parsed page.

use std::collections::{BTreeMap, BTreeSet};

use doc_xref_parser::{Document, NodeKind};

use crate::slug::slugify;

/// Extraction switches.
#[derive(Clone, Copy, Debug)]
pub struct ExtractOptions {
    /// Also collect `#fragment` links that point into the same page.
    pub same_page_links: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            same_page_links: true,
        }
    }
}

/// Anchors a page exposes and the internal links it contains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    pub anchors: BTreeSet<String>,
    /// Distinct link targets, each with the line of its first occurrence.
    pub links: BTreeMap<String, usize>,
}

/// Walk `document` once and collect its anchors and internal links.
///
/// A heading contributes an anchor only when its first child is a plain text
/// run; headings that open with emphasis, code, a link or an image expose
/// nothing.
pub fn extract(document: &Document, options: ExtractOptions) -> Extraction {
    let mut extraction = Extraction::default();

    for node in document.descendants() {
        match &node.kind {
            NodeKind::Heading { .. } => {
                let Some(text) = node.first_child().and_then(|child| child.as_text()) else {
                    continue;
                };
                let slug = slugify(text);
                if !slug.is_empty() {
                    extraction.anchors.insert(slug);
                }
            }
            NodeKind::Link { destination, .. } => {
                if is_internal(destination, options.same_page_links) {
                    extraction
                        .links
                        .entry(destination.clone())
                        .or_insert_with(|| document.line_of(node.span.start));
                }
            }
            _ => {}
        }
    }

    extraction
}

/// Root-absolute targets are internal. `//host/...` is a network-path
/// reference and stays external.
pub fn is_internal(target: &str, same_page_links: bool) -> bool {
    if target.starts_with("//") {
        return false;
    }
    target.starts_with('/') || (same_page_links && target.starts_with('#'))
}
