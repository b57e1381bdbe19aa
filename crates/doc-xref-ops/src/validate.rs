//! Link validation against a finished [`CorpusIndex`].

use doc_xref_config::PatternList;
use doc_xref_format::{CheckStatus, FailureReason, LinkCheck};
use rayon::prelude::*;

use crate::index::CorpusIndex;

const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Validation switches.
#[derive(Clone, Copy, Debug)]
pub struct ValidateOptions<'a> {
    /// Attach a "did you mean" candidate to failed checks.
    pub suggestions: bool,
    /// Link paths matching these patterns are not checked at all.
    pub ignore: &'a PatternList,
}

/// Split a link target at its first `#`.
///
/// Returns the page part and the fragment, if any. The fragment keeps any
/// further `#` characters.
pub fn split_link(link: &str) -> (&str, Option<&str>) {
    match link.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (link, None),
    }
}

/// Check every distinct internal link of every indexed page.
///
/// Results are sorted by source identity, then link target, so repeated runs
/// over an unchanged corpus produce identical output.
pub fn validate(index: &CorpusIndex, options: ValidateOptions<'_>) -> Vec<LinkCheck> {
    let pending: Vec<(&str, &str, usize)> = index
        .iter()
        .flat_map(|(identity, record)| {
            record
                .links
                .iter()
                .map(move |(link, line)| (identity.as_str(), link.as_str(), *line))
        })
        .filter(|(_, link, _)| {
            let (path, _) = split_link(link);
            let ignored = !path.is_empty() && options.ignore.matches(path);
            if ignored {
                tracing::debug!(link = %link, "skipped by check.ignore_links");
            }
            !ignored
        })
        .collect();

    let mut checks: Vec<LinkCheck> = pending
        .par_iter()
        .map(|&(source, link, line)| check_link(index, source, link, line, options.suggestions))
        .collect();

    checks.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.link.cmp(&b.link)));
    checks
}

fn check_link(
    index: &CorpusIndex,
    source: &str,
    link: &str,
    line: usize,
    suggestions: bool,
) -> LinkCheck {
    let (path, fragment) = split_link(link);
    let target = if path.is_empty() { source } else { path };

    let status = match index.get(target) {
        None => CheckStatus::Failed {
            reason: FailureReason::UnresolvedLink,
            suggestion: suggestions
                .then(|| closest(target, index.identities().map(|id| id.as_str())))
                .flatten()
                .map(|candidate| match fragment {
                    Some(fragment) => format!("{candidate}#{fragment}"),
                    None => candidate.to_string(),
                }),
        },
        Some(record) => match fragment {
            Some(fragment) if !record.anchors.contains(fragment) => CheckStatus::Failed {
                reason: FailureReason::UnresolvedAnchor,
                suggestion: suggestions
                    .then(|| closest(fragment, record.anchors.iter().map(String::as_str)))
                    .flatten()
                    .map(|anchor| format!("{path}#{anchor}")),
            },
            _ => CheckStatus::Passed,
        },
    };

    LinkCheck {
        source: source.to_string(),
        link: link.to_string(),
        target: target.to_string(),
        line,
        status,
    }
}

/// Most similar candidate above the similarity threshold. Ties keep the
/// earliest candidate.
fn closest<'a>(needle: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = strsim::normalized_levenshtein(needle, candidate);
        if score <= SUGGESTION_THRESHOLD {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_hash() {
        assert_eq!(split_link("/a/b"), ("/a/b", None));
        assert_eq!(split_link("/a/b#c"), ("/a/b", Some("c")));
        assert_eq!(split_link("#intro"), ("", Some("intro")));
        assert_eq!(split_link("/a#b#c"), ("/a", Some("b#c")));
        assert_eq!(split_link("/a#"), ("/a", Some("")));
    }

    #[test]
    fn closest_respects_threshold() {
        let ids = ["/guides/install", "/reference/api"];
        assert_eq!(
            closest("/guides/instal", ids.iter().copied()),
            Some("/guides/install")
        );
        assert_eq!(closest("/zzz", ids.iter().copied()), None);
    }
}
