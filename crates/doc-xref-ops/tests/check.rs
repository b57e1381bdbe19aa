use std::sync::Arc;

use doc_xref_format::{CheckStatus, FailureReason, OutputFormat};
use doc_xref_ops::{CheckOptions, OperationError, Operations};
use doc_xref_parser::{Document, MarkupParser, ParseError};
use doc_xref_test_support::Corpus;
use pretty_assertions::assert_eq;

fn run_check(corpus: &Corpus) -> doc_xref_ops::CheckOutcome {
    Operations::new(corpus.config())
        .check(CheckOptions::default())
        .expect("check run")
}

#[test]
fn link_to_existing_anchor_passes() {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "See [b](/b) and [start](/b#getting-started).\n")
        .page("b.mdx", "# Getting Started\n\nWelcome.\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.report.pages_scanned, 2);
    assert_eq!(outcome.report.checks.len(), 2);
    assert!(outcome.report.checks.iter().all(|check| check.passed()));
    assert_eq!(outcome.report.checks[1].link, "/b#getting-started");
    assert_eq!(outcome.report.checks[1].target, "/b");
}

#[test]
fn missing_page_is_unresolved_link() {
    let corpus = Corpus::new();
    corpus.page("a.mdx", "[gone](/c)\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.report.failure_count(), 1);
    let failure = &outcome.report.checks[0];
    assert_eq!(failure.link, "/c");
    assert_eq!(failure.source, "/a");
    assert_eq!(failure.reason(), Some(FailureReason::UnresolvedLink));
    assert_eq!(
        outcome.rendered,
        "/a\n  FAIL  /c [unresolved-link] (line 1)\n\n1 link checked across 1 page: 0 passed, 1 failed\n"
    );
}

#[test]
fn missing_anchor_is_unresolved_anchor() {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "Intro text.\n\n[b](/b#missing-section)\n")
        .page("b.mdx", "# Overview\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.report.checks.len(), 1);
    let failure = &outcome.report.checks[0];
    assert_eq!(failure.reason(), Some(FailureReason::UnresolvedAnchor));
    assert_eq!(failure.line, 3);
}

#[test]
fn same_page_fragment_resolves_against_source() {
    let corpus = Corpus::new();
    corpus.page("a.mdx", "# Intro\n\nJump to [intro](#intro).\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.report.checks.len(), 1);
    assert_eq!(outcome.report.checks[0].target, "/a");
    assert!(outcome.report.checks[0].passed());
}

#[test]
fn same_page_links_can_be_disabled() {
    let corpus = Corpus::new();
    corpus
        .config_file("[check]\nsame_page_links = false\n")
        .page("a.mdx", "# Intro\n\n[missing](#nowhere)\n");

    let outcome = run_check(&corpus);

    assert!(outcome.report.checks.is_empty());
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn malformed_page_is_reported_and_links_to_it_fail() {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "[broken](/broken)\n")
        .page("broken.mdx", "---\ntitle: never closed\n\n# Broken\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.report.pages_scanned, 2);
    assert_eq!(outcome.report.malformed.len(), 1);
    assert_eq!(outcome.report.malformed[0].path, "broken.mdx");
    assert_eq!(outcome.report.checks.len(), 1);
    assert_eq!(
        outcome.report.checks[0].reason(),
        Some(FailureReason::UnresolvedLink)
    );
    assert_eq!(outcome.exit_code, 1);
}

#[test]
fn strict_mode_fails_on_malformed_documents() {
    let corpus = Corpus::new();
    corpus
        .page("ok.mdx", "# Fine\n")
        .page_bytes("bad.mdx", b"# Bad \xff\xfe\n");

    let ops = Operations::new(corpus.config());
    let lenient = ops.check(CheckOptions::default()).expect("lenient run");
    let strict = ops
        .check(CheckOptions {
            strict: true,
            ..CheckOptions::default()
        })
        .expect("strict run");

    assert_eq!(lenient.report.malformed.len(), 1);
    assert_eq!(lenient.exit_code, 0);
    assert_eq!(strict.exit_code, 1);
}

#[test]
fn page_without_links_produces_no_checks() {
    let corpus = Corpus::new();
    corpus.page(
        "plain.mdx",
        "# Plain\n\nExternal [site](https://example.com) and ![img](/img.png).\n",
    );

    let outcome = run_check(&corpus);

    assert!(outcome.report.checks.is_empty());
    assert_eq!(outcome.report.pages_scanned, 1);
}

#[test]
fn repeated_links_are_checked_once_at_first_line() {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "First [b](/b).\n\n- again [b](/b)\n\n> and [b](/b)\n")
        .page("b.mdx", "# B\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.report.checks.len(), 1);
    assert_eq!(outcome.report.checks[0].line, 1);
}

#[test]
fn nested_links_are_found() {
    let corpus = Corpus::new();
    corpus.page(
        "a.mdx",
        "- item with [one](/one)\n\n| col |\n| --- |\n| [two](/two) |\n\n> quoted [three](/three)\n",
    );

    let outcome = run_check(&corpus);

    let links: Vec<&str> = outcome
        .report
        .checks
        .iter()
        .map(|check| check.link.as_str())
        .collect();
    assert_eq!(links, vec!["/one", "/three", "/two"]);
}

#[test]
fn results_are_sorted_and_repeatable() {
    let corpus = Corpus::new();
    corpus
        .page("z.mdx", "[a](/a) [missing](/missing)\n")
        .page("a.mdx", "[z](/z#nope) [z](/z)\n")
        .page("guides/intro.mdx", "# Intro\n\n[a](/a)\n");

    let first = run_check(&corpus);
    let second = run_check(&corpus);

    assert_eq!(first.report, second.report);
    assert_eq!(first.rendered, second.rendered);

    let order: Vec<(&str, &str)> = first
        .report
        .checks
        .iter()
        .map(|check| (check.source.as_str(), check.link.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("/a", "/z"),
            ("/a", "/z#nope"),
            ("/guides/intro", "/a"),
            ("/z", "/a"),
            ("/z", "/missing"),
        ]
    );
}

#[test]
fn failures_carry_suggestions() {
    let corpus = Corpus::new();
    corpus
        .page(
            "a.mdx",
            "[typo](/guides/instal) [anchor](/guides/install#getting-start)\n",
        )
        .page("guides/install.mdx", "# Getting Started\n");

    let outcome = run_check(&corpus);

    let suggestions: Vec<Option<&str>> = outcome
        .report
        .checks
        .iter()
        .map(|check| match &check.status {
            CheckStatus::Failed { suggestion, .. } => suggestion.as_deref(),
            CheckStatus::Passed => None,
        })
        .collect();
    assert_eq!(
        suggestions,
        vec![
            Some("/guides/install"),
            Some("/guides/install#getting-started"),
        ]
    );
}

#[test]
fn suggestions_can_be_disabled() {
    let corpus = Corpus::new();
    corpus
        .config_file("[check]\nsuggestions = false\n")
        .page("a.mdx", "[typo](/guides/instal)\n")
        .page("guides/install.mdx", "# Install\n");

    let outcome = run_check(&corpus);

    assert_eq!(
        outcome.report.checks[0].status,
        CheckStatus::Failed {
            reason: FailureReason::UnresolvedLink,
            suggestion: None,
        }
    );
}

#[test]
fn ignored_link_patterns_are_not_checked() {
    let corpus = Corpus::new();
    corpus
        .config_file("[check]\nignore_links = [\"/api/**\"]\n")
        .page("a.mdx", "[api](/api/v1/users) [gone](/gone)\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.report.checks.len(), 1);
    assert_eq!(outcome.report.checks[0].link, "/gone");
}

#[test]
fn excluded_files_are_not_indexed() {
    let corpus = Corpus::new();
    corpus
        .config_file("[content]\nexclude = [\"drafts/**\"]\n")
        .page("a.mdx", "# A\n")
        .page("drafts/wip.mdx", "[nowhere](/nowhere)\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.report.pages_scanned, 1);
    assert!(outcome.report.checks.is_empty());
}

#[test]
fn configured_extension_selects_files() {
    let corpus = Corpus::new();
    corpus
        .config_file("[content]\nextension = \".md\"\n")
        .page("a.md", "[b](/b)\n")
        .page("b.md", "# B\n")
        .page("ignored.mdx", "[gone](/gone)\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.report.pages_scanned, 2);
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn json_report_is_machine_readable() {
    let corpus = Corpus::new();
    corpus.page("a.mdx", "[gone](/c)\n");

    let outcome = Operations::new(corpus.config())
        .check(CheckOptions {
            format: Some(OutputFormat::Json),
            ..CheckOptions::default()
        })
        .expect("check run");

    let value: serde_json::Value = serde_json::from_str(&outcome.rendered).expect("valid json");
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["checks"][0]["reason"], "unresolved-link");
    assert_eq!(value["checks"][0]["status"], "failed");
}

#[test]
fn report_can_be_written_to_file() {
    let corpus = Corpus::new();
    corpus.page("a.mdx", "# A\n");
    let target = corpus.path().join("out/report.txt");

    let outcome = Operations::new(corpus.config())
        .check(CheckOptions {
            output_path: Some(target.clone()),
            ..CheckOptions::default()
        })
        .expect("check run");

    assert_eq!(outcome.written_to.as_deref(), Some(target.as_path()));
    let written = std::fs::read_to_string(&target).expect("read report");
    assert_eq!(written, outcome.rendered);
}

#[test]
fn identity_collision_aborts_the_run() {
    let corpus = Corpus::new();
    corpus.page("guide.mdx", "# One\n").page("guide.MDX", "# Two\n");

    let err = Operations::new(corpus.config())
        .check(CheckOptions::default())
        .expect_err("collision");

    match err {
        OperationError::IdentityCollision { identity, .. } => {
            assert_eq!(identity.as_str(), "/guide")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_content_root_is_fatal() {
    let corpus = Corpus::new();
    corpus.config_file("[content]\nroot = \"does-not-exist\"\n");

    let err = Operations::new(corpus.config())
        .check(CheckOptions::default())
        .expect_err("missing root");

    assert!(matches!(err, OperationError::CorpusUnavailable { .. }));
}

struct RejectEverything;

impl MarkupParser for RejectEverything {
    fn parse(&self, _source: &str) -> Result<Document, ParseError> {
        Err(ParseError::UnbalancedTree)
    }
}

#[test]
fn custom_parser_is_used_for_every_page() {
    let corpus = Corpus::new();
    corpus.page("a.mdx", "# A\n").page("b.mdx", "# B\n");

    let outcome = Operations::with_parser(corpus.config(), Arc::new(RejectEverything))
        .check(CheckOptions::default())
        .expect("check run");

    assert_eq!(outcome.report.malformed.len(), 2);
    assert!(outcome.report.checks.is_empty());
}

#[test]
fn worker_count_does_not_change_results() {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "[b](/b#x) [c](/c)\n")
        .page("b.mdx", "# X\n")
        .page("c.mdx", "[a](/a)\n");

    let default_run = run_check(&corpus);

    let mut config = corpus.config();
    config.check.jobs = 1;
    let ops = Operations::new(config);
    assert_eq!(ops.config().check.jobs, 1);
    let single = ops
        .check(CheckOptions::default())
        .expect("single worker run");

    assert_eq!(default_run.report, single.report);
}

#[test]
fn byte_order_mark_does_not_hide_first_heading() {
    let corpus = Corpus::new();
    corpus
        .page("a.mdx", "[b](/b#getting-started)\n")
        .page("b.mdx", "\u{feff}# Getting Started\n");

    let outcome = run_check(&corpus);

    assert_eq!(outcome.exit_code, 0);
    assert!(outcome.report.checks[0].passed());
}

#[test]
fn content_root_that_is_a_file_is_fatal() {
    let corpus = Corpus::new();
    corpus.config_file("[content]\nroot = \"pages/a.mdx\"\n");
    corpus.page("a.mdx", "# A\n");

    let err = Operations::new(corpus.config())
        .check(CheckOptions::default())
        .expect_err("root is a file");

    assert!(matches!(err, OperationError::CorpusUnavailable { .. }));
}

#[cfg(unix)]
#[test]
fn unreadable_directory_under_root_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let corpus = Corpus::new();
    corpus.page("a.mdx", "# A\n").page("locked/b.mdx", "# B\n");
    let locked = corpus.root().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).expect("chmod");

    // Privileged users can still list the directory.
    let readable = std::fs::read_dir(&locked).is_ok();
    let result = Operations::new(corpus.config()).check(CheckOptions::default());
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("restore");

    if readable {
        return;
    }
    assert!(matches!(
        result,
        Err(OperationError::CorpusUnavailable { .. })
    ));
}
