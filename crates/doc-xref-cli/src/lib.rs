use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use doc_xref_config::{normalize_extension, Config, LoadOptions};
use doc_xref_format::OutputFormat;
use doc_xref_ops::{
    CheckOptions, CheckOutcome, IndexOptions, IndexOutcome, Operations, RefsOptions, RefsOutcome,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Entry point for CLI execution. Returns the desired exit code; fatal
/// errors come back as `Err` and map to exit code 2 in `main`.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let config = load_config(&cli.global)?;
    tracing::debug!(
        root = %config.content.root.display(),
        extension = %config.content.extension,
        "configuration loaded"
    );
    let ops = Operations::new(config);

    match cli.command {
        Command::Check(args) => handle_check(&ops, args),
        Command::Index(args) => handle_index(&ops, args),
        Command::Refs(args) => handle_refs(&ops, args),
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` selects info and `-vv` debug.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut options = LoadOptions::default();
    if let Some(path) = &global.config {
        options = options.with_override_path(path.clone());
    }
    let mut config = Config::load(options)?;

    if let Some(root) = &global.root {
        let cwd = std::env::current_dir().context("failed to resolve working directory")?;
        config.content.root = cwd.join(root);
    }
    if let Some(extension) = &global.extension {
        config.content.extension =
            normalize_extension(extension).map_err(|msg| anyhow!("--extension: {msg}"))?;
    }
    if let Some(jobs) = global.jobs {
        config.check.jobs = jobs;
    }
    Ok(config)
}

fn handle_check(ops: &Operations, args: CheckArgs) -> Result<i32> {
    let CheckArgs {
        format,
        quiet,
        strict,
        output,
    } = args;

    let options = CheckOptions {
        format: format.map(Into::into),
        quiet,
        strict,
        output_path: output,
    };
    let CheckOutcome {
        rendered,
        exit_code,
        written_to,
        ..
    } = ops.check(options)?;

    match written_to {
        Some(path) => eprintln!("report written to {}", path.display()),
        None => emit(&rendered),
    }
    Ok(exit_code)
}

fn handle_index(ops: &Operations, args: IndexArgs) -> Result<i32> {
    let IndexOutcome {
        rendered,
        malformed,
        ..
    } = ops.index(IndexOptions {
        format: args.format.map(Into::into),
    })?;

    for entry in &malformed {
        eprintln!("skipped malformed document {entry}");
    }
    emit(&rendered);
    Ok(0)
}

fn handle_refs(ops: &Operations, args: RefsArgs) -> Result<i32> {
    let RefsOutcome {
        rendered,
        exit_code,
        ..
    } = ops.refs(RefsOptions {
        target: args.target,
        format: args.format.map(Into::into),
    })?;

    emit(&rendered);
    Ok(exit_code)
}

fn emit(content: &str) {
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Cross-reference checker for documentation sites",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Use this config file instead of the discovered ones
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Content root directory
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Markup file extension
    #[arg(long, global = true, value_name = "EXT")]
    extension: Option<String>,
    /// Worker threads (0 = one per CPU)
    #[arg(long, global = true, value_name = "N")]
    jobs: Option<usize>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every internal link in the corpus
    Check(CheckArgs),
    /// Print the corpus index (pages, anchors, links)
    Index(IndexArgs),
    /// List links that resolve to a page or anchor
    Refs(RefsArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Report format
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Hide passing checks
    #[arg(long)]
    quiet: bool,
    /// Also fail when any document could not be parsed
    #[arg(long)]
    strict: bool,
    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct IndexArgs {
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Args)]
struct RefsArgs {
    /// Page identity, optionally with an anchor (`/guides/intro#setup`)
    #[arg(value_name = "TARGET")]
    target: String,
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatValue {
    Plain,
    Json,
}

impl From<FormatValue> for OutputFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Plain => OutputFormat::Plain,
            FormatValue::Json => OutputFormat::Json,
        }
    }
}
