use doc_xref_format::OutputFormat;
use doc_xref_ops::{OperationError, Operations, RefsOptions};
use doc_xref_test_support::Corpus;
use pretty_assertions::assert_eq;

fn corpus() -> Corpus {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "[b](/b)\n\n[start](/b#getting-started)\n")
        .page("b.mdx", "# Getting Started\n\n[top](#getting-started)\n")
        .page("c.mdx", "Also [b](/b#faq).\n");
    corpus
}

fn refs(corpus: &Corpus, target: &str) -> Result<doc_xref_ops::RefsOutcome, OperationError> {
    Operations::new(corpus.config()).refs(RefsOptions {
        target: target.to_string(),
        format: Some(OutputFormat::Plain),
    })
}

#[test]
fn page_query_matches_every_anchor() {
    let corpus = corpus();
    let outcome = refs(&corpus, "/b").expect("refs");

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(
        outcome.rendered,
        "a.mdx:1 -> /b\na.mdx:3 -> /b#getting-started\nb.mdx:3 -> #getting-started\nc.mdx:1 -> /b#faq\n"
    );
}

#[test]
fn anchor_query_matches_only_that_anchor() {
    let corpus = corpus();
    let outcome = refs(&corpus, "/b#getting-started").expect("refs");

    let sources: Vec<&str> = outcome
        .matches
        .iter()
        .map(|m| m.source.as_str())
        .collect();
    assert_eq!(sources, vec!["/a", "/b"]);
}

#[test]
fn no_references_exits_one() {
    let corpus = corpus();
    let outcome = refs(&corpus, "/c").expect("refs");

    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.rendered, "No references found for '/c'.\n");
}

#[test]
fn relative_target_is_rejected() {
    let corpus = corpus();
    let err = refs(&corpus, "b").expect_err("relative target");

    assert!(matches!(err, OperationError::InvalidInput(_)));
}
