//! Report model and output formatters for doc-xref commands.
//!
//! Operations produce the plain data types defined here; rendering to text or
//! JSON happens in one place so every command shares the same conventions.

use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;

pub use doc_xref_config::OutputFormat;

/// Why a link check failed.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    UnresolvedLink,
    UnresolvedAnchor,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::UnresolvedLink => "unresolved-link",
            FailureReason::UnresolvedAnchor => "unresolved-anchor",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single link check.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed {
        reason: FailureReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
}

/// One distinct internal link of one source page.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LinkCheck {
    /// Identity of the page containing the link.
    pub source: String,
    /// Link target exactly as written.
    pub link: String,
    /// Page identity the link resolves against.
    pub target: String,
    /// Line of the first occurrence within the source file.
    pub line: usize,
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl LinkCheck {
    pub fn passed(&self) -> bool {
        matches!(self.status, CheckStatus::Passed)
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match &self.status {
            CheckStatus::Passed => None,
            CheckStatus::Failed { reason, .. } => Some(*reason),
        }
    }
}

/// A file excluded from the index because it could not be parsed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MalformedDocument {
    pub path: String,
    pub message: String,
}

/// Everything one validation run found.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Report {
    pub pages_scanned: usize,
    pub checks: Vec<LinkCheck>,
    pub malformed: Vec<MalformedDocument>,
}

impl Report {
    pub fn failures(&self) -> impl Iterator<Item = &LinkCheck> {
        self.checks.iter().filter(|check| !check.passed())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn passed_count(&self) -> usize {
        self.checks.len() - self.failure_count()
    }

    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|check| !check.passed())
    }
}

/// Render a validation report. `quiet` hides passing checks in plain output.
pub fn render_report(
    report: &Report,
    format: OutputFormat,
    quiet: bool,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Plain => Ok(render_report_plain(report, quiet)),
        OutputFormat::Json => {
            let payload = JsonReport {
                summary: Summary {
                    pages_scanned: report.pages_scanned,
                    checks: report.checks.len(),
                    passed: report.passed_count(),
                    failed: report.failure_count(),
                    malformed: report.malformed.len(),
                },
                checks: &report.checks,
                malformed: &report.malformed,
            };
            serde_json::to_string_pretty(&payload)
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    checks: &'a [LinkCheck],
    malformed: &'a [MalformedDocument],
}

#[derive(Serialize)]
struct Summary {
    pages_scanned: usize,
    checks: usize,
    passed: usize,
    failed: usize,
    malformed: usize,
}

fn render_report_plain(report: &Report, quiet: bool) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;

    for check in &report.checks {
        if quiet && check.passed() {
            continue;
        }
        if current != Some(check.source.as_str()) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", check.source);
            current = Some(check.source.as_str());
        }
        match &check.status {
            CheckStatus::Passed => {
                let _ = writeln!(out, "  ok    {}", check.link);
            }
            CheckStatus::Failed { reason, suggestion } => {
                let _ = write!(
                    out,
                    "  FAIL  {} [{}] (line {})",
                    check.link, reason, check.line
                );
                if let Some(suggestion) = suggestion {
                    let _ = write!(out, ". Did you mean '{suggestion}'?");
                }
                out.push('\n');
            }
        }
    }

    if !report.malformed.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("malformed documents\n");
        for entry in &report.malformed {
            let _ = writeln!(out, "  {}: {}", entry.path, entry.message);
        }
    }

    if !out.is_empty() {
        out.push('\n');
    }
    let _ = write!(
        out,
        "{} {} checked across {} {}: {} passed, {} failed",
        report.checks.len(),
        plural(report.checks.len(), "link", "links"),
        report.pages_scanned,
        plural(report.pages_scanned, "page", "pages"),
        report.passed_count(),
        report.failure_count(),
    );
    if !report.malformed.is_empty() {
        let _ = write!(
            out,
            ", {} malformed {}",
            report.malformed.len(),
            plural(report.malformed.len(), "document", "documents")
        );
    }
    out.push('\n');
    out
}

/// Serializable view of one Corpus Index entry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PageEntry {
    pub identity: String,
    pub path: String,
    pub anchors: Vec<String>,
    pub links: Vec<String>,
}

/// Render the corpus index for inspection.
pub fn render_index(pages: &[PageEntry], format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({ "pages": pages })),
        OutputFormat::Plain => {
            let mut out = String::new();
            for page in pages {
                let _ = writeln!(out, "{} ({})", page.identity, page.path);
                for anchor in &page.anchors {
                    let _ = writeln!(out, "  #{anchor}");
                }
                for link in &page.links {
                    let _ = writeln!(out, "  -> {link}");
                }
            }
            let _ = writeln!(
                out,
                "{} {} indexed",
                pages.len(),
                plural(pages.len(), "page", "pages")
            );
            Ok(out)
        }
    }
}

/// A link that resolves to the page (and anchor) being searched for.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RefMatch {
    pub source: String,
    pub path: String,
    pub line: usize,
    pub link: String,
}

/// Render the result of a reference search.
pub fn render_refs(
    query: &str,
    matches: &[RefMatch],
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "query": query,
            "matches": matches,
        })),
        OutputFormat::Plain => {
            if matches.is_empty() {
                return Ok(format!("No references found for '{query}'.\n"));
            }
            let mut out = String::new();
            for m in matches {
                let _ = writeln!(out, "{}:{} -> {}", m.path, m.line, m.link);
            }
            Ok(out)
        }
    }
}

fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}
