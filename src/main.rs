use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use psetdoc::{ItemKind, ParseError, ParserSession, SchemaDefinition, Settings};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "psetdoc", about = "Extract IFC property and quantity set definitions from documentation pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Property set page (4 columns)
    Pset,
    /// Quantity set page (3 columns)
    Qto,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Pset => ItemKind::PropertySet,
            KindArg::Qto => ItemKind::QuantitySet,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one documentation page and print its schema as JSON
    Parse {
        file: PathBuf,
        /// Force the page kind (default: from the file name prefix)
        #[arg(short, long)]
        kind: Option<KindArg>,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse every Pset_/Qto_ page directly inside a directory
    Batch {
        dir: PathBuf,
        #[arg(short, long)]
        kind: Option<KindArg>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Abort on the first failing page
        #[arg(long)]
        fail_fast: bool,
        /// Worker threads (default: one per core)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
    },
    /// Print the normalized form of a version tag
    NormalizeVersion { text: String },
}

fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let session = ParserSession::new().with_enum_extension(&settings.enum_extension);

    let result = match cli.command {
        Commands::Parse { file, kind, output } => {
            let kind = resolve_kind(&file, kind)?;
            let schema = session
                .parse_file(&file, kind)
                .map_err(|e| anyhow::anyhow!(e.chain()))?;
            write_json(&schema, output.as_deref(), settings.pretty)
        }
        Commands::Batch {
            dir,
            kind,
            output,
            fail_fast,
            jobs,
        } => {
            let fail_fast = fail_fast || settings.fail_fast;
            let pages = list_pages(&dir, &settings.enum_extension)?;
            if pages.is_empty() {
                println!("No Pset_/Qto_ pages found in {}.", dir.display());
                return Ok(());
            }
            eprintln!("Parsing {} pages...", pages.len());
            let outcome = run_batch(&session, &pages, kind.map(ItemKind::from), fail_fast, jobs)?;
            write_json(&outcome.schemas, output.as_deref(), settings.pretty)?;

            let stats = session.cache().stats();
            eprintln!(
                "Parsed {} pages ({} failed). Enumerations: {} loaded, {} cache hits.",
                outcome.schemas.len(),
                outcome.failures.len(),
                stats.loads,
                stats.hits,
            );
            for (path, err) in &outcome.failures {
                eprintln!("  {}: {}", path.display(), err.chain());
            }
            if !outcome.failures.is_empty() {
                bail!("{} pages failed to parse", outcome.failures.len());
            }
            Ok(())
        }
        Commands::NormalizeVersion { text } => {
            let normalized = psetdoc::normalize_version(&text)?;
            println!("{}", normalized);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct BatchOutcome {
    schemas: Vec<SchemaDefinition>,
    failures: Vec<(PathBuf, ParseError)>,
}

fn run_batch(
    session: &ParserSession,
    pages: &[PathBuf],
    kind: Option<ItemKind>,
    fail_fast: bool,
    jobs: Option<usize>,
) -> Result<BatchOutcome> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build().context("Failed to build worker pool")?;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let parse_one = |path: &PathBuf| {
        // list_pages only returns names with a known prefix
        let kind = kind.or_else(|| page_kind(path)).unwrap_or(ItemKind::PropertySet);
        let result = session.parse_file(path, kind);
        pb.inc(1);
        result
    };

    let outcome = pool.install(|| {
        if fail_fast {
            pages
                .par_iter()
                .map(parse_one)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(|schemas| BatchOutcome {
                    schemas,
                    failures: Vec::new(),
                })
        } else {
            let results: Vec<_> = pages.par_iter().map(|p| (p, parse_one(p))).collect();
            let mut outcome = BatchOutcome {
                schemas: Vec::new(),
                failures: Vec::new(),
            };
            for (path, result) in results {
                match result {
                    Ok(schema) => outcome.schemas.push(schema),
                    Err(err) => {
                        warn!("Skipping {}: {}", path.display(), err.chain());
                        outcome.failures.push((path.clone(), err));
                    }
                }
            }
            Ok(outcome)
        }
    });
    pb.finish_and_clear();

    let outcome = outcome.map_err(|e| anyhow::anyhow!(e.chain()))?;
    info!(
        "Batch finished: {} schemas, {} failures",
        outcome.schemas.len(),
        outcome.failures.len()
    );
    Ok(outcome)
}

/// Pset_/Qto_ pages directly inside `dir`, sorted by name.
fn list_pages(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        let matches_ext = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if path.is_file() && matches_ext && page_kind(&path).is_some() {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}

fn page_kind(path: &Path) -> Option<ItemKind> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(ItemKind::from_name)
}

fn resolve_kind(path: &Path, forced: Option<KindArg>) -> Result<ItemKind> {
    match forced {
        Some(kind) => Ok(kind.into()),
        None => page_kind(path).with_context(|| {
            format!(
                "Cannot tell whether {} is a property or quantity set; pass --kind",
                path.display()
            )
        }),
    }
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
