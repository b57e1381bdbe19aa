//! Cross-reference operations shared by doc-xref commands.
//!
//! A run discovers the corpus, builds the [`CorpusIndex`] on a bounded worker
//! pool and then validates, renders or searches it.

mod corpus;
mod error;
mod extract;
mod identity;
mod index;
mod refs;
mod slug;
mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use doc_xref_config::{Config, OutputFormat};
use doc_xref_format::{render_index, render_refs, render_report, PageEntry, RefMatch, Report};
use doc_xref_parser::{CmarkParser, MarkupParser};
use doc_xref_utils::write_report;

pub use corpus::{discover, CorpusFile};
pub use error::{MalformedDocument, OperationError};
pub use extract::{extract, is_internal, ExtractOptions, Extraction};
pub use identity::PageId;
pub use index::{build_index, ensure_unique_identities, CorpusIndex, IndexBuild, PageRecord};
pub use refs::find_refs;
pub use slug::slugify;
pub use validate::{split_link, validate, ValidateOptions};

/// Options for `check`.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// Overrides `report.format` from config.
    pub format: Option<OutputFormat>,
    pub quiet: bool,
    /// Malformed documents fail the run too.
    pub strict: bool,
    /// Write the rendered report here instead of returning it for stdout.
    pub output_path: Option<PathBuf>,
}

/// Result of `check`.
#[derive(Debug)]
pub struct CheckOutcome {
    pub report: Report,
    pub rendered: String,
    pub exit_code: i32,
    pub written_to: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct IndexOptions {
    pub format: Option<OutputFormat>,
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub pages: Vec<PageEntry>,
    pub malformed: Vec<MalformedDocument>,
    pub rendered: String,
}

/// Options for `refs`.
#[derive(Clone, Debug)]
pub struct RefsOptions {
    /// `/page` or `/page#anchor`.
    pub target: String,
    pub format: Option<OutputFormat>,
}

#[derive(Debug)]
pub struct RefsOutcome {
    pub matches: Vec<RefMatch>,
    pub rendered: String,
    /// `0` when at least one reference exists, `1` otherwise.
    pub exit_code: i32,
}

/// Operation bundle wiring configuration to the parser and worker pool.
pub struct Operations {
    config: Config,
    parser: Arc<dyn MarkupParser>,
}

impl Operations {
    /// Build the operation layer with the default CommonMark parser.
    pub fn new(config: Config) -> Self {
        Self::with_parser(config, Arc::new(CmarkParser::new()))
    }

    /// Build the operation layer around a custom markup parser.
    pub fn with_parser(config: Config, parser: Arc<dyn MarkupParser>) -> Self {
        Self { config, parser }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover, parse and index the whole corpus.
    pub fn build_index(&self) -> Result<IndexBuild, OperationError> {
        let content = &self.config.content;
        let files = discover(&content.root, &content.extension, &content.exclude)?;
        tracing::debug!(
            root = %content.root.display(),
            files = files.len(),
            "discovered corpus"
        );

        let options = ExtractOptions {
            same_page_links: self.config.check.same_page_links,
        };
        let parser = self.parser.as_ref();
        let build = self.pool()?.install(|| build_index(&files, parser, options))?;

        tracing::info!(
            pages = build.index.len(),
            malformed = build.malformed.len(),
            "corpus index built"
        );
        Ok(build)
    }

    /// Validate every internal link in the corpus.
    pub fn check(&self, options: CheckOptions) -> Result<CheckOutcome, OperationError> {
        let build = self.build_index()?;
        let validate_options = ValidateOptions {
            suggestions: self.config.check.suggestions,
            ignore: &self.config.check.ignore_links,
        };
        let checks = self
            .pool()?
            .install(|| validate(&build.index, validate_options));

        let report = Report {
            pages_scanned: build.files_scanned,
            checks,
            malformed: build.malformed.iter().map(report_entry).collect(),
        };
        tracing::info!(
            checks = report.checks.len(),
            failed = report.failure_count(),
            "validation finished"
        );

        let format = options.format.unwrap_or(self.config.report.format);
        let rendered = render_report(&report, format, options.quiet)?;

        let failed = report.has_failures() || (options.strict && !report.malformed.is_empty());
        let exit_code = if failed { 1 } else { 0 };

        let written_to = match options.output_path {
            Some(path) => {
                let replaced =
                    write_report(&path, &rendered).map_err(|source| OperationError::Io {
                        path: path.clone(),
                        source,
                    })?;
                if !replaced {
                    tracing::debug!(path = %path.display(), "report unchanged");
                }
                Some(path)
            }
            None => None,
        };

        Ok(CheckOutcome {
            report,
            rendered,
            exit_code,
            written_to,
        })
    }

    /// Render the corpus index for inspection.
    pub fn index(&self, options: IndexOptions) -> Result<IndexOutcome, OperationError> {
        let build = self.build_index()?;
        let pages: Vec<PageEntry> = build
            .index
            .iter()
            .map(|(identity, record)| PageEntry {
                identity: identity.to_string(),
                path: corpus::display_path(&record.path),
                anchors: record.anchors.iter().cloned().collect(),
                links: record.links.keys().cloned().collect(),
            })
            .collect();

        let format = options.format.unwrap_or(self.config.report.format);
        let rendered = render_index(&pages, format)?;
        Ok(IndexOutcome {
            pages,
            malformed: build.malformed,
            rendered,
        })
    }

    /// List every link that resolves to `options.target`.
    pub fn refs(&self, options: RefsOptions) -> Result<RefsOutcome, OperationError> {
        let build = self.build_index()?;
        let matches = find_refs(&build.index, &options.target)?;

        let format = options.format.unwrap_or(self.config.report.format);
        let rendered = render_refs(&options.target, &matches, format)?;
        let exit_code = if matches.is_empty() { 1 } else { 0 };
        Ok(RefsOutcome {
            matches,
            rendered,
            exit_code,
        })
    }

    fn pool(&self) -> Result<rayon::ThreadPool, OperationError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if self.config.check.jobs > 0 {
            builder = builder.num_threads(self.config.check.jobs);
        }
        Ok(builder.build()?)
    }
}

fn report_entry(malformed: &MalformedDocument) -> doc_xref_format::MalformedDocument {
    doc_xref_format::MalformedDocument {
        path: corpus::display_path(&malformed.path),
        message: malformed.source.to_string(),
    }
}
