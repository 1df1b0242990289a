use anyhow::{Context, Result};
use serde_json::json;
use std::io::Read;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use patch_triage::categorize::{Runs, categorize};
use patch_triage::classify::Classifier;
use patch_triage::cli::{self, CategorizeArgs, ClassifyArgs, Commands, SplitArgs};
use patch_triage::config::Config;
use patch_triage::index::ChangedFileIndex;
use patch_triage::normalize::normalize_test_name;
use patch_triage::parser::parse_diff;
use patch_triage::reconstruct::{PatchStats, split_patch};
use patch_triage::report::RunReport;

fn main() -> Result<()> {
    let args = cli::parse_args();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to determine current directory")?;
            Config::discover(&cwd)?
        }
    };

    match args.command {
        Commands::Parse(diff_args) => handle_parse(&diff_args.diff)?,
        Commands::Classify(classify_args) => handle_classify(&classify_args, &config)?,
        Commands::Split(split_args) => handle_split(&split_args, &config)?,
        Commands::Index(diff_args) => {
            let diff = read_input(&diff_args.diff)?;
            print_json(&ChangedFileIndex::from_diff(&diff))?;
        }
        Commands::Categorize(categorize_args) => handle_categorize(&categorize_args, &config)?,
        Commands::Normalize(normalize_args) => {
            for name in &normalize_args.names {
                println!("{}", normalize_test_name(name));
            }
        }
    }

    Ok(())
}

/// Log to stderr. RUST_LOG wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a file, or stdin when the path is "-".
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn handle_parse(path: &Path) -> Result<()> {
    let diff = read_input(path)?;
    let files: Vec<_> = parse_diff(&diff)
        .iter()
        .map(|file| {
            json!({
                "path": file.path(),
                "old_path": file.old_path,
                "new_path": file.new_path,
                "is_binary": file.is_binary,
                "is_new_file": file.is_new_file,
                "is_deleted": file.is_deleted,
                "hunks": file.hunks.iter().map(|h| json!({
                    "header": h.header,
                    "old_start": h.old_start,
                    "old_count": h.old_count,
                    "new_start": h.new_start,
                    "new_count": h.new_count,
                    "context": h.context,
                    "lines": h.lines.len(),
                    "content_hash": h.content_hash,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    print_json(&files)
}

fn handle_classify(args: &ClassifyArgs, config: &Config) -> Result<()> {
    let diff = read_input(&args.diff)?;
    let registry = config.registry()?;
    let classifier = Classifier::new(&registry, &config.classifier);

    let mut files = parse_diff(&diff);
    classifier.classify_all(&mut files, args.language.as_deref());

    let stats = PatchStats::collect(&files);
    if !args.hunks {
        return print_json(&stats);
    }
    let hunks: Vec<_> = files
        .iter()
        .flat_map(|file| {
            file.hunks.iter().map(move |h| {
                json!({
                    "path": file.path(),
                    "header": h.header,
                    "category": h.category,
                    "confidence": h.confidence,
                    "content_hash": h.content_hash,
                })
            })
        })
        .collect();
    print_json(&json!({ "stats": stats, "hunks": hunks }))
}

fn handle_split(args: &SplitArgs, config: &Config) -> Result<()> {
    let diff = read_input(&args.diff)?;
    let registry = config.registry()?;
    let classifier = Classifier::new(&registry, &config.classifier);
    let rebase = args.rebase || config.reconstruct.rebase_line_numbers;
    let language = args.language.as_deref();

    let split = split_patch(&diff, language, &classifier, rebase);
    write_output(&args.test_out, &split.test)?;
    write_output(&args.code_out, &split.code)?;

    eprintln!(
        "test patch: {} bytes -> {}",
        split.test.len(),
        args.test_out.display()
    );
    eprintln!(
        "code patch: {} bytes -> {}",
        split.code.len(),
        args.code_out.display()
    );
    Ok(())
}

fn handle_categorize(args: &CategorizeArgs, config: &Config) -> Result<()> {
    let priority = &config.outcomes.priority;
    let baseline = RunReport::load(&args.baseline)?.resolve(priority);
    let full = RunReport::load(&args.full)?.resolve(priority);
    let test_only = args
        .test_only
        .as_deref()
        .map(RunReport::load)
        .transpose()?
        .map(|r| r.resolve(priority));

    let index = match &args.patch {
        Some(path) => Some(ChangedFileIndex::from_diff(&read_input(path)?)),
        None => None,
    };

    let result = categorize(
        Runs {
            baseline: &baseline,
            test_only: test_only.as_ref(),
            full: &full,
        },
        index.as_ref(),
        args.language.as_deref(),
    );

    let rendered = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    match &args.output {
        Some(path) => write_output(path, &format!("{rendered}\n")),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
