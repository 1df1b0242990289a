use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "patch-triage",
    version,
    about = "Classify diff hunks and derive FAIL_TO_PASS / PASS_TO_PASS test sets"
)]
pub struct Cli {
    /// Config file (default: ./patch-triage.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug events to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump the parsed files and hunks as JSON.
    Parse(DiffArgs),
    /// Classify every hunk and print statistics as JSON.
    Classify(ClassifyArgs),
    /// Write the test-side and code-side patches.
    Split(SplitArgs),
    /// Print the changed-file/module index as JSON.
    Index(DiffArgs),
    /// Derive FAIL_TO_PASS and PASS_TO_PASS from run reports.
    Categorize(CategorizeArgs),
    /// Print normalized test names, one per line.
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Unified diff file ("-" for stdin).
    pub diff: PathBuf,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Unified diff file ("-" for stdin).
    pub diff: PathBuf,

    /// Language hint; detected per file when omitted.
    #[arg(short, long)]
    pub language: Option<String>,

    /// Also list every hunk with its category and confidence.
    #[arg(long)]
    pub hunks: bool,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Unified diff file ("-" for stdin).
    pub diff: PathBuf,

    #[arg(short, long)]
    pub language: Option<String>,

    /// Destination of the TEST + MIXED patch.
    #[arg(long)]
    pub test_out: PathBuf,

    /// Destination of the CODE + UNKNOWN patch.
    #[arg(long)]
    pub code_out: PathBuf,

    /// Shift hunk line numbers past excluded hunks (overrides config).
    #[arg(long)]
    pub rebase: bool,
}

#[derive(Args, Debug)]
pub struct CategorizeArgs {
    /// Report of the run without the change.
    #[arg(long)]
    pub baseline: PathBuf,

    /// Report of the run with only the test changes applied.
    #[arg(long)]
    pub test_only: Option<PathBuf>,

    /// Report of the run with the whole change applied.
    #[arg(long)]
    pub full: PathBuf,

    /// Diff used to build the change index for PASS_TO_PASS filtering.
    #[arg(long)]
    pub patch: Option<PathBuf>,

    #[arg(short, long)]
    pub language: Option<String>,

    /// Write JSON here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
