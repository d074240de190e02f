//! rapports CLI
//!
//! Commands:
//!   chunk     - Chunk one report and print the result
//!   rules     - Show the heading rules used for an institution
//!   catalogue - List a folder's catalogue and its uncatalogued files
//!   ingest    - Ingest a catalogued folder and list or search what it holds
//!   config    - Show or initialize the configuration

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rapports::{
    summarize_reports, Catalogue, Chunk, ChunkStats, Config, DocumentLoader, InMemoryIndex,
    IngestProgress, Ingestor, Institution, ReportChunker, ReportInfo, SearchFilter, Strategy,
    TextLoader, VectorIndex,
};
use std::path::{Path, PathBuf};

const CATALOGUE_FILE: &str = "catalogue.toml";

#[derive(Parser)]
#[command(name = "rapports")]
#[command(about = "Structure-aware chunking and retrieval for French institutional reports")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.rapports/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk one report file (.txt, or .pdf with its extracted .txt alongside)
    Chunk {
        file: PathBuf,

        /// Publishing institution (default: from the folder's catalogue)
        #[arg(short, long)]
        institution: Option<String>,

        /// Publication year (default: from the folder's catalogue)
        #[arg(short, long)]
        year: Option<i64>,

        /// Report title (default: from the catalogue, else the file name)
        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        theme: Option<String>,

        /// Override the configured strategy (sections, recursive)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the heading rules resolved for an institution (all mappings if omitted)
    Rules { institution: Option<String> },

    /// List catalogue entries and uncatalogued report files in a folder
    Catalogue {
        folder: PathBuf,

        /// Catalogue file (default: <folder>/catalogue.toml)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Ingest a catalogued folder into an in-memory index
    Ingest {
        folder: PathBuf,

        /// Catalogue file (default: <folder>/catalogue.toml)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Search the ingested chunks
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long)]
        institution: Option<String>,

        #[arg(long)]
        year: Option<i64>,

        #[arg(long)]
        theme: Option<String>,

        /// Number of results (default: retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunk {
            file,
            institution,
            year,
            title,
            theme,
            strategy,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(name) = strategy {
                config.chunking.strategy = Strategy::parse(&name)
                    .with_context(|| format!("Unknown strategy '{}'", name))?;
            }
            let report = resolve_report(&file, institution, year, title, theme)?;
            let chunker = ReportChunker::from_config(&config)?;

            let document = TextLoader::new().load(&file)?;
            let chunks = chunker.chunk_report(&document, &report)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                print_chunks(&report, config.chunking.strategy, &chunks);
            }
        }

        Commands::Rules { institution } => {
            let config = load_config(cli.config.as_deref())?;
            let chunker = ReportChunker::from_config(&config)?;
            match institution {
                Some(name) => {
                    let institution = Institution::parse(&name);
                    let rules = chunker.registry().resolve(&institution);
                    println!(
                        "{} → {} ({} rules)\n",
                        institution.to_string().bold(),
                        rules.name().cyan(),
                        rules.len()
                    );
                    for (i, rule) in rules.rules().iter().enumerate() {
                        println!(
                            "  {}. {:<11} {}",
                            i + 1,
                            format!("{:?}", rule.level).dimmed(),
                            rule.regex.as_str()
                        );
                    }
                }
                None => {
                    for institution in Institution::all() {
                        let rules = chunker.registry().resolve(&institution);
                        println!("  {:<22} {}", institution.to_string(), rules.name().cyan());
                    }
                    println!("  {:<22} {}", "(other)".dimmed(), "generic".cyan());
                }
            }
        }

        Commands::Catalogue { folder, file } => {
            let path = file.unwrap_or_else(|| folder.join(CATALOGUE_FILE));
            let catalogue = Catalogue::load(&path)?;

            if catalogue.is_empty() {
                println!("{} {}", "No catalogue entries in".yellow(), path.display());
            } else {
                println!("{} report(s) in {}:\n", catalogue.len(), path.display());
                for entry in &catalogue.reports {
                    let marker = if entry.path(&folder).exists() {
                        "✓".green()
                    } else {
                        "✗".red()
                    };
                    println!(
                        "  {} {:<20} {:<6} {} {}",
                        marker,
                        entry.institution,
                        entry.year,
                        entry.title,
                        format!("({})", entry.file).dimmed()
                    );
                }
            }

            let missing = catalogue.uncatalogued(&folder)?;
            if !missing.is_empty() {
                println!("\n{} uncatalogued file(s):", missing.len().to_string().yellow());
                for path in missing {
                    println!("  {}", path.display());
                }
            }
        }

        Commands::Ingest {
            folder,
            file,
            query,
            institution,
            year,
            theme,
            k,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let catalogue_path = file.unwrap_or_else(|| folder.join(CATALOGUE_FILE));
            let catalogue = Catalogue::load(&catalogue_path)?;
            if catalogue.is_empty() {
                bail!("No catalogue entries in {}", catalogue_path.display());
            }

            let ingestor = Ingestor::new(ReportChunker::from_config(&config)?);
            let index = InMemoryIndex::new();
            let mut progress = IngestProgress::new(catalogue.len());
            let run = ingestor
                .ingest_catalogue(&index, &folder, &catalogue, &mut progress)
                .await?;

            println!("\nIngestion complete!");
            println!("  Reports ingested: {}", run.ingested.to_string().green());
            println!("  Chunks created: {}", run.chunks);
            println!("  Missing files: {}", run.missing);
            println!("  Already ingested: {}", run.duplicate);
            println!("  Empty after filtering: {}", run.empty);
            println!("  Failed: {}", run.failed);

            let reports = summarize_reports(&index.all_metadata().await?);
            if !reports.is_empty() {
                println!("\n{:<22} {:<8} {:<8} Titre", "Institution", "Année", "Chunks");
                println!("{}", "-".repeat(80));
                for r in &reports {
                    println!("{:<22} {:<8} {:<8} {}", r.institution, r.year, r.chunks, r.title);
                }
            }

            if let Some(query) = query {
                let filter = SearchFilter {
                    institution,
                    year,
                    theme,
                };
                let limit = k.unwrap_or(config.retrieval.top_k);
                let results = index.search(&query, limit, &filter).await?;

                println!("\nSearching for: {}\n", query.bold());
                if results.is_empty() {
                    println!("No results found.");
                }
                for (i, result) in results.iter().enumerate() {
                    println!("{}. [Score: {:.3}]", i + 1, result.score);
                    println!("   Source: {}", rapports::prompts::source_line(&result.chunk));
                    let preview: String = result.chunk.text.chars().take(200).collect();
                    println!("   Preview: {}...\n", preview.replace('\n', " "));
                }
            }
        }

        Commands::Config { init } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::path()?,
            };
            if init {
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                Config::default().save_to(&path)?;
                println!("{} Wrote {}", "✓".green(), path.display());
            } else {
                let config = load_config(Some(path.as_path()))?;
                println!("{}", format!("# {}", path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

/// Explicit file if given, else ~/.rapports/config.toml, else defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => Config::load_from(path),
        Some(_) => Ok(Config::default()),
        None => Ok(Config::load()?.unwrap_or_default()),
    }
}

/// Report descriptor from the folder's catalogue, overridden by flags.
fn resolve_report(
    file: &Path,
    institution: Option<String>,
    year: Option<i64>,
    title: Option<String>,
    theme: Option<String>,
) -> Result<ReportInfo> {
    let folder = file.parent().unwrap_or_else(|| Path::new("."));
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let catalogued = Catalogue::load(&folder.join(CATALOGUE_FILE))?
        .reports
        .into_iter()
        .find(|entry| entry.file == name);

    let mut report = match catalogued {
        Some(entry) => entry.report_info(folder),
        None => ReportInfo {
            institution: String::new(),
            year: 0,
            title: file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            theme: String::new(),
            source: file.to_string_lossy().into_owned(),
        },
    };
    if let Some(institution) = institution {
        report.institution = institution;
    }
    if let Some(year) = year {
        report.year = year;
    }
    if let Some(title) = title {
        report.title = title;
    }
    if let Some(theme) = theme {
        report.theme = theme;
    }
    if report.year <= 0 {
        bail!("{} is not catalogued; pass --year", file.display());
    }
    Ok(report)
}

fn print_chunks(report: &ReportInfo, strategy: Strategy, chunks: &[Chunk]) {
    let stats = ChunkStats::of(chunks);
    let institution = Institution::parse(&report.institution);
    println!(
        "{} {} ({}) · strategy {}\n",
        institution.to_string().bold(),
        report.title,
        report.year,
        strategy.name().cyan()
    );

    if chunks.is_empty() {
        println!("{}", "No chunks. Try --strategy recursive.".yellow());
        return;
    }

    for chunk in chunks {
        let section = if chunk.section().is_empty() {
            "(no section)".dimmed().to_string()
        } else {
            chunk.section().to_string()
        };
        println!(
            "  {:>4}  {:>3}  {:>5} chars  {}",
            chunk.chunk_index().unwrap_or(-1),
            chunk.section_index().unwrap_or(-1),
            chunk.text.chars().count(),
            section
        );
    }

    println!(
        "\n  {} chunks · average {} chars · {} with a section title",
        stats.chunks.to_string().green(),
        stats.average_length,
        stats.with_section
    );
}
