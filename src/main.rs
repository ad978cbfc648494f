//! spacetally - Aggregates filesystem policy dumps into usage reports.
//!
//! Usage:
//!   tally ingest              Parse dumps into tree snapshots
//!   tally report              Build projections and write report files
//!   tally show SNAPSHOT       Print a snapshot as a tree
//!   tally --help              Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use spacetally_core::{Node, RenderConfig};
use spacetally_ingest::{Ingestor, load_snapshot, save_snapshot, snapshot_path};
use spacetally_project::{BaseForest, ProjectionAssembler, ReportConfig, render};

#[derive(Parser)]
#[command(
    name = "spacetally",
    version,
    about = "Aggregates filesystem policy dumps into usage reports",
    long_about = "spacetally turns policy-engine file dumps into usage trees and renders \
                  regrouped report views (by storage, user, production or taxonomy).\n\n\
                  Run `tally ingest` once per dump refresh, then `tally report`."
)]
struct Cli {
    /// Report configuration file (TOML); the standard catalog is used without one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse dump files and save one tree snapshot per source
    Ingest {
        /// Directory holding the standard dump files
        #[arg(short, long)]
        dump_dir: Option<PathBuf>,

        /// Where to write snapshots
        #[arg(short, long)]
        snapshot_dir: Option<PathBuf>,
    },

    /// Build projections from snapshots and write report files
    Report {
        /// Where to read snapshots from
        #[arg(short, long)]
        snapshot_dir: Option<PathBuf>,

        /// Where to write report files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Default render depth
        #[arg(long)]
        depth: Option<u32>,

        /// Only build these projections
        #[arg(short = 'p', long = "projection")]
        projections: Vec<String>,

        /// Also write a JSON document per projection
        #[arg(long)]
        json: bool,
    },

    /// Print a snapshot as an indented tree
    Show {
        /// Snapshot file
        snapshot: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReportConfig::default(),
    };

    match cli.command {
        Command::Ingest {
            dump_dir,
            snapshot_dir,
        } => {
            let mut config = config;
            if let Some(dir) = dump_dir {
                config.dump_dir = dir;
            }
            if let Some(dir) = snapshot_dir {
                config.snapshot_dir = dir;
            }
            run_ingest(&config)?;
        }
        Command::Report {
            snapshot_dir,
            output_dir,
            depth,
            projections,
            json,
        } => {
            let mut config = config;
            if let Some(dir) = snapshot_dir {
                config.snapshot_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(depth) = depth {
                config.render = RenderConfig::builder()
                    .default_depth(depth)
                    .max_depth(config.render.max_depth)
                    .build()
                    .context("Invalid render depth")?;
            }
            run_report(&config, &projections, json)?;
        }
        Command::Show {
            snapshot,
            depth,
            format,
        } => {
            run_show(&snapshot, depth, format)?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `SPACETALLY_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("SPACETALLY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Ingest every configured source and save its snapshot.
fn run_ingest(config: &ReportConfig) -> Result<()> {
    let sources = config.sources();
    std::fs::create_dir_all(&config.snapshot_dir).with_context(|| {
        format!(
            "Failed to create snapshot directory {}",
            config.snapshot_dir.display()
        )
    })?;

    let results = Ingestor::new().ingest_all(&sources);

    let mut saved = 0usize;
    for tree in results.into_iter().flatten() {
        let path = snapshot_path(&config.snapshot_dir, &tree.source);
        save_snapshot(&tree, &path).context("Failed to save snapshot")?;
        info!(
            source = %tree.source.key(),
            size = %format_size(tree.total_size()),
            files = tree.total_files(),
            malformed = tree.stats.malformed,
            path = %path.display(),
            "Saved snapshot"
        );
        saved += 1;
    }

    if saved == 0 {
        bail!("No source could be ingested");
    }
    eprintln!("Ingested {saved} of {} sources", sources.len());
    Ok(())
}

/// Build the configured projections and write their outputs.
fn run_report(config: &ReportConfig, only: &[String], json: bool) -> Result<()> {
    let sources = config.sources();
    let forest = BaseForest::load_snapshots(&config.snapshot_dir, &sources);
    if forest.is_empty() {
        bail!(
            "No snapshots found in {}; run `tally ingest` first",
            config.snapshot_dir.display()
        );
    }

    let mut specs = config.projections().context("Invalid projection catalog")?;
    if !only.is_empty() {
        specs.retain(|spec| only.iter().any(|name| name == spec.name.as_str()));
        if specs.is_empty() {
            bail!("No projection matches {}", only.join(", "));
        }
    }

    let assembler = ProjectionAssembler::new(&forest).with_render_config(config.render.clone());
    let mut written = 0usize;
    let mut failed = 0usize;

    for result in assembler.build_all(&specs) {
        match result {
            Ok(projection) => {
                let files = render::write_projection(&projection, &config.output_dir, json)
                    .with_context(|| format!("Failed to write {}", projection.name()))?;
                written += files.len();
            }
            Err(err) => {
                warn!("{err}");
                failed += 1;
            }
        }
    }

    let overview = forest.overview("overview");
    let overview_path = config.output_dir.join("outfile_overview.js");
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    std::fs::write(&overview_path, render::js_tree("overview", &overview))
        .with_context(|| format!("Failed to write {}", overview_path.display()))?;
    written += 1;

    eprintln!(
        "Wrote {written} files to {} ({} projections, {failed} skipped)",
        config.output_dir.display(),
        specs.len() - failed
    );
    Ok(())
}

/// Print a snapshot.
fn run_show(path: &Path, depth: u32, format: OutputFormat) -> Result<()> {
    let tree = load_snapshot(path).context("Failed to load snapshot")?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" {} - {}", tree.source.key(), format_size(tree.total_size()));
            println!(
                " {} files, {} lines read, {} malformed",
                tree.total_files(),
                tree.stats.lines,
                tree.stats.malformed
            );
            println!(" Ingested in {:.2}s", tree.duration.as_secs_f64());
            println!("{}", "─".repeat(60));
            println!();

            print_node(&tree.root, 0, depth, tree.total_size());

            if tree.has_warnings() {
                println!();
                println!("{} line(s) skipped during ingestion", tree.stats.malformed);
            }
        }
        OutputFormat::Json => {
            let mut root = tree.root;
            root.set_depth_limit(depth);
            println!("{}", serde_json::to_string_pretty(&root.render_rows())?);
        }
    }

    Ok(())
}

/// Print a node and its children, largest first.
fn print_node(node: &Node, depth: u32, max_depth: u32, root_size: u64) {
    let indent = "  ".repeat(depth as usize);
    let ratio = if root_size > 0 {
        node.total_size() as f64 / root_size as f64 * 100.0
    } else {
        0.0
    };

    println!(
        "{}{}{:<40} {:>10} {:>8} files {:>5.1}% {}",
        indent,
        if node.is_leaf() { "  " } else { "▼ " },
        truncate(node.title(), 40),
        format_size(node.total_size()),
        node.total_files(),
        ratio,
        make_bar(ratio / 100.0, 10)
    );

    if depth < max_depth {
        let mut children: Vec<&Node> = node.children().collect();
        children.sort_by(|a, b| b.total_size().cmp(&a.total_size()));
        for child in children {
            print_node(child, depth + 1, max_depth, root_size);
        }
    }
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}
