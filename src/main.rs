use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use gn_patcher::{
    discover_sources, load_from_path, plan_file, EditError, EditSpec, Lexer, RewriteOutcome,
    RewritePlan, RewriteReport, TargetEdit,
};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const SCRIPT_NAME: &str = "BUILD.gn";

#[derive(Parser)]
#[command(name = "gn-patcher")]
#[command(about = "Format-preserving edits to GN build scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite build scripts in place
    Apply {
        /// Build scripts, or directories searched for BUILD.gn files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Exit non-zero if any build script would be rewritten
    Check {
        /// Build scripts, or directories searched for BUILD.gn files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,
    },

    /// Print the token stream of a build script
    Tokens {
        /// Build script to lex
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct EditArgs {
    /// TOML edit spec to apply
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Use the stock PDFium edits (shared pdfium library, V8 includes)
    #[arg(long, conflicts_with = "spec")]
    pdfium: bool,

    /// Target whose static_library declaration becomes shared_library
    #[arg(short, long)]
    target: Option<String>,

    /// Extra source path to add to the target (repeatable)
    #[arg(long = "source", value_name = "PATH")]
    sources: Vec<String>,

    /// Directory whose C/C++ files are added to the target's sources
    #[arg(long, value_name = "DIR")]
    contrib: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            paths,
            edits,
            dry_run,
            diff,
        } => cmd_apply(&paths, &edits, dry_run, diff),

        Commands::Check { paths, edits } => cmd_check(&paths, &edits),

        Commands::Tokens { file } => cmd_tokens(&file),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into the BUILD.gn files below them.
fn collect_scripts(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();

    for path in paths {
        if !path.is_dir() {
            scripts.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name() == SCRIPT_NAME {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();

        if found.is_empty() {
            anyhow::bail!("No {} files found under {}", SCRIPT_NAME, path.display());
        }
        scripts.extend(found);
    }

    Ok(scripts)
}

/// The edit spec named by the command line, before per-script sources.
fn base_spec(args: &EditArgs) -> Result<EditSpec> {
    let mut spec = if let Some(path) = &args.spec {
        load_from_path(path)?
    } else if args.pdfium {
        EditSpec::pdfium(Vec::<String>::new())
    } else {
        EditSpec::default()
    };

    if let Some(name) = &args.target {
        match &mut spec.target {
            Some(target) => target.name = name.clone(),
            None => spec.target = Some(TargetEdit::new(name.clone())),
        }
    }

    if !args.sources.is_empty() || args.contrib.is_some() {
        let target = spec
            .target
            .as_mut()
            .context("--source and --contrib need a target (--target, --pdfium or a spec)")?;
        target.extra_sources.extend(args.sources.iter().cloned());
    }

    spec.validate().context("invalid edit spec")?;
    Ok(spec)
}

/// Add sources found under `--contrib`, relative to the script's directory.
fn spec_for_script(base: &EditSpec, contrib: Option<&Path>, script: &Path) -> Result<EditSpec> {
    let mut spec = base.clone();

    if let (Some(contrib), Some(target)) = (contrib, spec.target.as_mut()) {
        let script_dir = script
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", script.display()))?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let contrib = contrib
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", contrib.display()))?;

        target
            .extra_sources
            .extend(discover_sources(&contrib, &script_dir)?);
    }

    Ok(spec)
}

/// Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn describe_report(report: &RewriteReport) {
    if report.target_renamed {
        println!("    declaration flipped");
    }
    if report.injected_sources > 0 {
        println!("    {} source(s) added", report.injected_sources);
    }
    if report.injected_values > 0 {
        println!("    {} config value(s) added", report.injected_values);
    }
    for missed in &report.unmatched {
        println!("    {}", format!("{missed} not found").yellow());
    }
}

/// Why a single script could not be planned.
enum ScriptFailure {
    Setup(anyhow::Error),
    Edit(EditError),
}

impl ScriptFailure {
    fn print(&self, script: &Path) {
        match self {
            ScriptFailure::Setup(err) => {
                eprintln!("{} {}: {:#}", "✗".red(), script.display(), err);
            }
            ScriptFailure::Edit(err) => print_failure(script, err),
        }
    }
}

fn print_failure(script: &Path, err: &EditError) {
    eprintln!("{} {}: {}", "✗".red(), script.display(), err);
    if err.gn_error().is_some() {
        eprintln!(
            "  {}",
            "The script could not be parsed; it was left untouched".red()
        );
    }
}

fn plan_script(
    base: &EditSpec,
    edits: &EditArgs,
    script: &Path,
) -> Result<RewritePlan, ScriptFailure> {
    let spec =
        spec_for_script(base, edits.contrib.as_deref(), script).map_err(ScriptFailure::Setup)?;
    plan_file(script, &spec).map_err(ScriptFailure::Edit)
}

fn cmd_apply(paths: &[PathBuf], edits: &EditArgs, dry_run: bool, show_diff: bool) -> Result<()> {
    let base = base_spec(edits)?;
    let scripts = collect_scripts(paths)?;

    if base.is_empty() {
        println!("{}", "No edits requested; scripts will round-trip unchanged".yellow());
    }
    if dry_run {
        println!("{}", "[DRY RUN - showing what would be rewritten]".cyan());
    }

    let mut total_rewritten = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for script in &scripts {
        let plan = match plan_script(&base, edits, script) {
            Ok(plan) => plan,
            Err(failure) => {
                failure.print(script);
                total_failed += 1;
                continue;
            }
        };

        if plan.is_noop() {
            println!("{} {}: Unchanged", "⊙".yellow(), script.display());
            total_unchanged += 1;
            continue;
        }

        if show_diff {
            display_diff(script, &plan.original, &plan.rewritten);
        }

        if dry_run {
            println!("{} {}: Would rewrite", "✓".green(), script.display());
            describe_report(&plan.report);
            total_rewritten += 1;
            continue;
        }

        match plan.apply() {
            Ok(outcome @ RewriteOutcome::Rewritten { .. }) => {
                println!("{} {}: Rewritten", "✓".green(), script.display());
                describe_report(outcome.report());
                total_rewritten += 1;
            }
            Ok(RewriteOutcome::Unchanged { .. }) => {
                println!("{} {}: Unchanged", "⊙".yellow(), script.display());
                total_unchanged += 1;
            }
            Err(err) => {
                print_failure(script, &err);
                total_failed += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} rewritten", format!("{}", total_rewritten).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(paths: &[PathBuf], edits: &EditArgs) -> Result<()> {
    let base = base_spec(edits)?;
    let scripts = collect_scripts(paths)?;

    let mut pending = 0;
    let mut failed = 0;

    for script in &scripts {
        match plan_script(&base, edits, script) {
            Ok(plan) if plan.is_noop() => {
                println!("{} {}: Up to date", "✓".green(), script.display());
            }
            Ok(plan) => {
                println!("{} {}: Needs rewrite", "⊙".yellow(), script.display());
                describe_report(&plan.report);
                pending += 1;
            }
            Err(failure) => {
                failure.print(script);
                failed += 1;
            }
        }
    }

    if pending > 0 || failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_tokens(file: &Path) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    for token in Lexer::new(&source) {
        let token = token.with_context(|| format!("failed to lex {}", file.display()))?;
        println!(
            "{:<20} {:<30} {}{}",
            format!("{:?}", token.kind()).bold(),
            token.text().unwrap_or_default(),
            token
                .leading_whitespace()
                .map(|ws| format!(" leading={ws:?}"))
                .unwrap_or_default()
                .dimmed(),
            token
                .trailing_whitespace()
                .map(|ws| format!(" trailing={ws:?}"))
                .unwrap_or_default()
                .dimmed(),
        );
    }

    Ok(())
}
