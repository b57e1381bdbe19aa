//! Reverse lookup: which pages link to a given page or anchor.

use doc_xref_format::RefMatch;

use crate::corpus::display_path;
use crate::index::CorpusIndex;
use crate::validate::split_link;
use crate::OperationError;

/// Every indexed link that resolves to `query`.
///
/// `query` is `/page` or `/page#anchor`. Without an anchor, links to any
/// anchor of the page count as well. Same-page `#anchor` links count for the
/// page they sit on.
pub fn find_refs(index: &CorpusIndex, query: &str) -> Result<Vec<RefMatch>, OperationError> {
    let (wanted_page, wanted_anchor) = split_link(query);
    if !wanted_page.starts_with('/') || wanted_page.starts_with("//") {
        return Err(OperationError::InvalidInput(format!(
            "refs target must be a root-relative page such as /guides/intro, got '{query}'"
        )));
    }

    let mut matches = Vec::new();
    for (identity, record) in index.iter() {
        for (link, line) in &record.links {
            let (path, fragment) = split_link(link);
            let target = if path.is_empty() {
                identity.as_str()
            } else {
                path
            };
            if target != wanted_page {
                continue;
            }
            if wanted_anchor.is_some() && fragment != wanted_anchor {
                continue;
            }
            matches.push(RefMatch {
                source: identity.to_string(),
                path: display_path(&record.path),
                line: *line,
                link: link.clone(),
            });
        }
    }

    matches.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.link.cmp(&b.link))
    });
    tracing::info!(query, matches = matches.len(), "reference search finished");
    Ok(matches)
}
