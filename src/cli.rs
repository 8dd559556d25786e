//! Command-line interface for codereview.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{self, EngineConfig};
use crate::detect::Language;
use crate::orchestrator::{EngineError, Orchestrator};
use crate::report;
use crate::score::Rating;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default config file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["codereview.yaml", ".codereview.yaml"];

/// Embedded default configuration written by `init`.
const DEFAULT_CONFIG: &str = include_str!("templates/default.yaml");

/// Severity-ranked code review with optional AI assessment.
///
/// Runs quality, security, performance and language-specific checks over a
/// source file and rates the result. With --ai, a chat-completion endpoint
/// adds a quality score and suggestions (falling back to a local estimate
/// when it is unavailable).
#[derive(Parser)]
#[command(name = "codereview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a source file
    #[command(visible_alias = "review")]
    Analyze(AnalyzeArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// File to analyze, or "-" to read from stdin
    pub path: PathBuf,

    /// Language tag (default: inferred from the file extension)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Request an AI assessment
    #[arg(long)]
    pub ai: bool,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Apply the fix with this id and report on the patched source
    #[arg(long)]
    pub fix: Option<String>,

    /// Save the patched source back to PATH (with --fix)
    #[arg(long, requires = "fix")]
    pub write: bool,

    /// Exit non-zero if the rating is this or worse
    /// (excellent, good, needs-improvement, poor)
    #[arg(long)]
    pub fail_on: Option<String>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "codereview.yaml")]
    pub output: PathBuf,
}

/// Discover a config file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match explicit.map(Path::to_path_buf).or_else(discover_config) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            EngineConfig::parse_file(&path)
                .map_err(|e| anyhow::anyhow!("error parsing config {}: {}", path.display(), e))?
        }
        None => EngineConfig::default(),
    };
    config::validate(&config)?;
    Ok(config)
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))
    }
}

fn resolve_language(args: &AnalyzeArgs) -> anyhow::Result<Language> {
    match &args.language {
        Some(tag) => tag.parse::<Language>().map_err(anyhow::Error::msg),
        None => Ok(args
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(Language::from_extension)
            .unwrap_or_default()),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Analyze the source, then apply `fix_id` if given. Returns the patched
/// source when a fix was applied.
async fn review(
    orchestrator: &Orchestrator,
    source: &str,
    language: Language,
    want_ai: bool,
    fix_id: Option<&str>,
) -> Result<Option<String>, EngineError> {
    orchestrator.submit(source, language, want_ai).await?;
    match fix_id {
        Some(id) => orchestrator.apply_fix(id).await.map(Some),
        None => Ok(None),
    }
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let fail_on = match args.fail_on.as_deref().map(str::parse::<Rating>) {
        Some(Ok(rating)) => Some(rating),
        Some(Err(e)) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
        None => None,
    };

    if args.write && args.path == Path::new("-") {
        eprintln!("Error: --write needs a file path, not stdin");
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'codereview init' to create a config file");
            return Ok(EXIT_ERROR);
        }
    };

    let language = match resolve_language(args) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let source = match read_source(&args.path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let orchestrator = Orchestrator::new(config);
    if args.ai && !orchestrator.has_credential() {
        eprintln!(
            "Warning: --ai requested but no credential found (set {})",
            orchestrator.config().ai.api_key_env
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    let pb = (args.format == "pretty").then(|| spinner("Analyzing..."));

    let outcome = rt.block_on(review(
        &orchestrator,
        &source,
        language,
        args.ai,
        args.fix.as_deref(),
    ));

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let patched = match outcome {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Some(ref patched) = patched {
        if args.write {
            std::fs::write(&args.path, patched)?;
            eprintln!("Wrote fixed source to {}", args.path.display());
        } else {
            eprintln!("Fix applied in memory; use --write to save it");
        }
    }

    let report = orchestrator
        .current_report()
        .ok_or_else(|| anyhow::anyhow!("analysis produced no report"))?;
    let fixes = orchestrator.current_fixes();

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &report, &fixes)?,
        _ => report::write_pretty(&path_str, &report, &fixes),
    }

    match fail_on {
        Some(threshold) if report.rating() >= threshold => Ok(EXIT_FAILED),
        _ => Ok(EXIT_SUCCESS),
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune thresholds", args.output.display());
    println!(
        "  2. Run: codereview analyze <file> --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}
