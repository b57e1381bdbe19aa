//! Configuration primitives and loader for doc-xref.
//!
//! Settings resolve through the precedence stack
//! override flag → working directory → git root → built-in defaults.
//! Each layer merges field-wise over the one below it, and the merged result is
//! validated once into typed structures so downstream crates never touch raw
//! TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".doc-xref.toml";

const DEFAULT_CONTENT_ROOT: &str = "pages";
const DEFAULT_EXTENSION: &str = "mdx";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub content: ContentSettings,
    pub check: CheckSettings,
    pub report: ReportSettings,
    pub sources: ConfigSources,
}

/// Where the documentation corpus lives and which files belong to it.
#[derive(Clone, Debug)]
pub struct ContentSettings {
    pub root: PathBuf,
    /// Markup extension without the leading dot, e.g. `mdx`.
    pub extension: String,
    pub exclude: PatternList,
}

/// Settings that govern link resolution.
#[derive(Clone, Debug)]
pub struct CheckSettings {
    /// Worker count for parsing and validation; `0` lets rayon decide.
    pub jobs: usize,
    pub suggestions: bool,
    pub same_page_links: bool,
    pub ignore_links: PatternList,
}

/// Settings for report rendering.
#[derive(Clone, Debug)]
pub struct ReportSettings {
    pub format: OutputFormat,
}

/// Rendering formats shared by every command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            _ => Err(()),
        }
    }
}

/// Pattern plus compiled matcher.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    glob: Glob,
    matcher: GlobMatcher,
}

impl Pattern {
    fn new(source: ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                matcher: glob.compile_matcher(),
                original: value,
                glob,
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn glob(&self) -> &Glob {
        &self.glob
    }

    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        self.matcher.is_match(path)
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    /// Compile a list of patterns outside of the file loader, e.g. from CLI flags.
    pub fn compile<I, S>(patterns: I) -> Result<Self, ConfigValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = ConfigSource::default(PathBuf::from("."));
        let compiled = patterns
            .into_iter()
            .map(|pattern| Pattern::new(source.clone(), pattern.into()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PatternList::new(compiled))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// True when any pattern in the list matches `path`.
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            content: resolved.content,
            check: resolved.check,
            report: resolved.report,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

/// Strip a leading dot and validate a markup extension.
pub fn normalize_extension(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if stripped.is_empty() {
        return Err("extension cannot be empty".into());
    }
    if stripped
        .chars()
        .any(|ch| ch == '.' || ch == '/' || ch == '\\' || ch.is_whitespace())
    {
        return Err(format!(
            "extension '{value}' must be a single suffix such as 'mdx'"
        ));
    }
    Ok(stripped.to_string())
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let content = ContentPartial {
        root: Some(Located::new(
            PathBuf::from(DEFAULT_CONTENT_ROOT),
            source.clone(),
        )),
        extension: Some(Located::new(DEFAULT_EXTENSION.into(), source.clone())),
        exclude: Some(Located::new(
            vec!["**/node_modules/**".into()],
            source.clone(),
        )),
    };

    let check = CheckPartial {
        jobs: Some(Located::new(0, source.clone())),
        suggestions: Some(Located::new(true, source.clone())),
        same_page_links: Some(Located::new(true, source.clone())),
        ignore_links: Some(Located::new(Vec::new(), source.clone())),
    };

    let report = ReportPartial {
        format: Some(Located::new("plain".into(), source)),
    };

    PartialConfig {
        content: Some(content),
        check: Some(check),
        report: Some(report),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    content: Option<ContentPartial>,
    check: Option<CheckPartial>,
    report: Option<ReportPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_content) = other.content.take() {
            match &mut self.content {
                Some(content) => content.merge(other_content),
                None => self.content = Some(other_content),
            }
        }

        if let Some(other_check) = other.check.take() {
            match &mut self.check {
                Some(check) => check.merge(other_check),
                None => self.check = Some(other_check),
            }
        }

        if let Some(other_report) = other.report.take() {
            match &mut self.report {
                Some(report) => report.merge(other_report),
                None => self.report = Some(other_report),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let content_partial = self.content.unwrap_or_default();
        let root_loc = content_partial
            .root
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_CONTENT_ROOT), fallback()));
        let root = resolve_path(&root_loc);

        let extension_loc = content_partial
            .extension
            .unwrap_or_else(|| Located::new(DEFAULT_EXTENSION.into(), fallback()));
        let extension = match normalize_extension(&extension_loc.value) {
            Ok(extension) => extension,
            Err(message) => {
                errors.push(
                    ConfigValidationError::new(Some(extension_loc.source.clone()), message)
                        .with_context("content.extension"),
                );
                DEFAULT_EXTENSION.to_string()
            }
        };

        let exclude = compile_patterns(
            content_partial.exclude.unwrap_or_default(),
            "content.exclude",
            &mut errors,
        );

        let check_partial = self.check.unwrap_or_default();
        let jobs = check_partial.jobs.map(|located| located.value).unwrap_or(0);
        let suggestions = check_partial
            .suggestions
            .map(|located| located.value)
            .unwrap_or(true);
        let same_page_links = check_partial
            .same_page_links
            .map(|located| located.value)
            .unwrap_or(true);
        let ignore_links = compile_patterns(
            check_partial.ignore_links.unwrap_or_default(),
            "check.ignore_links",
            &mut errors,
        );

        let report_partial = self.report.unwrap_or_default();
        let format_loc = report_partial
            .format
            .unwrap_or_else(|| Located::new("plain".into(), fallback()));
        let format = match format_loc.value.parse::<OutputFormat>() {
            Ok(format) => format,
            Err(_) => {
                errors.push(
                    ConfigValidationError::new(
                        Some(format_loc.source.clone()),
                        format!(
                            "unknown report format '{}' (expected 'plain' or 'json')",
                            format_loc.value
                        ),
                    )
                    .with_context("report.format"),
                );
                OutputFormat::Plain
            }
        };

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            content: ContentSettings {
                root,
                extension,
                exclude: PatternList::new(exclude),
            },
            check: CheckSettings {
                jobs,
                suggestions,
                same_page_links,
                ignore_links: PatternList::new(ignore_links),
            },
            report: ReportSettings { format },
        })
    }
}

#[derive(Clone, Debug, Default)]
struct ContentPartial {
    root: Option<Located<PathBuf>>,
    extension: Option<Located<String>>,
    exclude: Option<Located<Vec<String>>>,
}

impl ContentPartial {
    fn merge(&mut self, other: ContentPartial) {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.extension.is_some() {
            self.extension = other.extension;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct CheckPartial {
    jobs: Option<Located<usize>>,
    suggestions: Option<Located<bool>>,
    same_page_links: Option<Located<bool>>,
    ignore_links: Option<Located<Vec<String>>>,
}

impl CheckPartial {
    fn merge(&mut self, other: CheckPartial) {
        if other.jobs.is_some() {
            self.jobs = other.jobs;
        }
        if other.suggestions.is_some() {
            self.suggestions = other.suggestions;
        }
        if other.same_page_links.is_some() {
            self.same_page_links = other.same_page_links;
        }
        if other.ignore_links.is_some() {
            self.ignore_links = other.ignore_links;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ReportPartial {
    format: Option<Located<String>>,
}

impl ReportPartial {
    fn merge(&mut self, other: ReportPartial) {
        if other.format.is_some() {
            self.format = other.format;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

impl Default for Located<Vec<String>> {
    fn default() -> Self {
        Located::new(Vec::new(), ConfigSource::default(PathBuf::from(".")))
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn compile_patterns(
    located: Located<Vec<String>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(located.source.clone(), pattern) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    content: ContentSettings,
    check: CheckSettings,
    report: ReportSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigValidationError {}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    check: Option<RawCheck>,
    #[serde(default)]
    report: Option<RawReport>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            content: self
                .content
                .map(|content| content.into_partial(source.clone())),
            check: self.check.map(|check| check.into_partial(source.clone())),
            report: self.report.map(|report| report.into_partial(source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContent {
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

impl RawContent {
    fn into_partial(self, source: ConfigSource) -> ContentPartial {
        ContentPartial {
            root: self.root.map(|value| Located::new(value, source.clone())),
            extension: self
                .extension
                .map(|value| Located::new(value, source.clone())),
            exclude: self.exclude.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCheck {
    #[serde(default)]
    jobs: Option<usize>,
    #[serde(default)]
    suggestions: Option<bool>,
    #[serde(default)]
    same_page_links: Option<bool>,
    #[serde(default)]
    ignore_links: Option<Vec<String>>,
}

impl RawCheck {
    fn into_partial(self, source: ConfigSource) -> CheckPartial {
        CheckPartial {
            jobs: self.jobs.map(|value| Located::new(value, source.clone())),
            suggestions: self
                .suggestions
                .map(|value| Located::new(value, source.clone())),
            same_page_links: self
                .same_page_links
                .map(|value| Located::new(value, source.clone())),
            ignore_links: self.ignore_links.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReport {
    #[serde(default)]
    format: Option<String>,
}

impl RawReport {
    fn into_partial(self, source: ConfigSource) -> ReportPartial {
        ReportPartial {
            format: self.format.map(|value| Located::new(value, source)),
        }
    }
}
