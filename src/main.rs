mod catalog;
mod error;
mod linker;
mod parser;
mod pipeline;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use catalog::{load_catalog, DirectorySource, IndexSource, TermCatalog};
use pipeline::{Mode, RunReport, Status};
use settings::Settings;

#[derive(Parser)]
#[command(name = "knowledge_linker", about = "Link glossary terms inside case notes")]
struct Cli {
    /// Settings file (default: ./knowledge_linker.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert [[term]] links into case documents (preview unless --commit)
    Link {
        /// Vault root (overrides settings)
        #[arg(long)]
        vault: Option<PathBuf>,
        /// Write changes back to disk
        #[arg(long)]
        commit: bool,
        /// Preview only (the default; kept for existing scripts)
        #[arg(long, conflicts_with = "commit")]
        dry_run: bool,
        /// Only process the first few documents
        #[arg(long)]
        test: bool,
        /// Max documents to process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Rebuild the term index from the glossary and theory directories
    Index {
        #[arg(long)]
        vault: Option<PathBuf>,
    },
    /// Show the term catalog in match order
    Terms {
        #[arg(long)]
        vault: Option<PathBuf>,
        /// Number of terms to list
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Link {
            vault,
            commit,
            dry_run,
            test,
            limit,
        } => {
            let settings = settings.with_vault_root(vault);
            let mode = if commit && !dry_run { Mode::Commit } else { Mode::Preview };
            let limit = if test { Some(settings.test_limit) } else { limit };
            link(&settings, mode, limit)
        }
        Commands::Index { vault } => {
            let settings = settings.with_vault_root(vault);
            let index = catalog::index::build_index(
                &settings.glossary_path(),
                &settings.theory_path(),
                &settings.vault_root,
            );
            let path = settings.term_index_path();
            index
                .write(&path)
                .with_context(|| format!("Failed to write term index {}", path.display()))?;
            println!("Wrote {}", path.display());
            println!(
                "Total terms: {} (glossary {}, theory {})",
                index.metadata.total_terms, index.metadata.glossary_count, index.metadata.theory_count
            );
            Ok(())
        }
        Commands::Terms { vault, limit } => {
            let settings = settings.with_vault_root(vault);
            let catalog = load_settings_catalog(&settings);
            println!("{} terms", catalog.len());
            for (i, term) in catalog.iter().take(limit).enumerate() {
                println!("{:>4} | {:>2} | {}", i + 1, term.length, term.name);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_settings_catalog(settings: &Settings) -> TermCatalog {
    let index = IndexSource::new(settings.term_index_path());
    let scan = DirectorySource::new(settings.glossary_path(), settings.theory_path());
    load_catalog(&[&index, &scan])
}

fn link(settings: &Settings, mode: Mode, limit: Option<usize>) -> anyhow::Result<()> {
    let catalog = load_settings_catalog(settings);
    if catalog.is_empty() {
        println!("No terms available; documents will be scanned but nothing can be linked.");
    } else {
        let sample: Vec<&str> = catalog.iter().take(10).map(|t| t.name.as_str()).collect();
        println!("Loaded {} terms (e.g. {})", catalog.len(), sample.join(", "));
    }

    let cases = settings.cases_path();
    let paths = pipeline::collect_documents(&cases, limit);
    if paths.is_empty() {
        println!("No case documents under {}.", cases.display());
        return Ok(());
    }
    if mode == Mode::Preview {
        println!("Preview mode: no files will be modified.");
    }
    info!(documents = paths.len(), ?mode, "Linking case documents");

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    let report = pipeline::run(&paths, &catalog, &settings.target_sections, mode, &pb);
    pb.finish_and_clear();

    print_report(&report, mode);
    Ok(())
}

fn print_report(report: &RunReport, mode: Mode) {
    let total = report.results.len();
    for (i, (path, result)) in report.results.iter().enumerate() {
        let name = truncate(&path.display().to_string(), 60);
        match result {
            Ok(o) if o.status == Status::Modified => {
                println!("  [{}/{}] linked  {} (+{})", i + 1, total, name, o.links_inserted());
                for section in &o.sections {
                    println!("          {}: {}", section.title, section.annotation.linked.join(", "));
                }
            }
            Ok(o) if o.status == Status::NoTargetSections => {
                println!("  [{}/{}] skip    {} (no target sections)", i + 1, total, name);
            }
            Ok(_) => println!("  [{}/{}] clean   {}", i + 1, total, name),
            Err(e) => println!("  [{}/{}] error   {}: {}", i + 1, total, name, e),
        }
    }

    let s = &report.summary;
    println!("\nScanned:            {}", s.scanned);
    println!("Modified:           {}", s.modified);
    println!("Unchanged:          {}", s.unchanged);
    println!("No target sections: {}", s.no_target_sections);
    println!("Links inserted:     {}", s.links_inserted);
    println!("Errors:             {}", s.errors.len());
    for (path, message) in &s.errors {
        println!("  {}: {}", path.display(), message);
    }

    if mode == Mode::Preview {
        println!("\nPreview only. Re-run with --commit to write these changes.");
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
