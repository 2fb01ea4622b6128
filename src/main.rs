use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod description;
mod error;
mod form;
mod pager;
mod record;
mod sink;
mod transport;
mod types;

use config::{Config, ConfigValues};
use controller::PaginationController;
use sink::{open_sink, OutputFormat};
use transport::HttpTransport;

#[derive(Parser)]
#[command(name = "deed-scraper")]
#[command(about = "Registry of deeds search results scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search and append every result row to the output
    Scrape {
        /// CONL file with search_url, start_date, end_date, document_type
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Search page URL
        #[arg(long)]
        url: Option<String>,
        /// First recording date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Last recording date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Document type label as shown in the search form (e.g. "DEED")
        #[arg(long)]
        doc_type: Option<String>,
        /// Output file (defaults to results.jsonl / results.csv / results.db)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Page to start writing from, after an interrupted run
        #[arg(long, default_value_t = 1)]
        resume_page: u32,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Remove default output files
    Clean,
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "deed_scraper=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scrape(
    config_path: Option<&Path>,
    overrides: ConfigValues,
    output: Option<PathBuf>,
    format: OutputFormat,
    resume_page: u32,
    quiet: bool,
) -> Result<()> {
    let config = Config::load(config_path, overrides)?;
    let output = output.unwrap_or_else(|| PathBuf::from(format.default_path()));

    if !quiet {
        println!(
            "Searching {} from {} to {} ({})",
            config.criteria.document_type,
            config.criteria.start_date,
            config.criteria.end_date,
            config.search_url
        );
    }

    let mut sink = open_sink(format, &output)?;
    let mut transport = HttpTransport::new()?;

    let summary = PaginationController::new(&config.search_url, &config.criteria)
        .resume_from(resume_page)
        .run(&mut transport, &mut sink)
        .with_context(|| format!("Scrape aborted; rows written so far remain in {}", output.display()))?;

    if !quiet {
        println!(
            "Done! Wrote {} records from {} pages ({} submissions) to {}",
            summary.records_written,
            summary.pages_visited,
            summary.submissions,
            output.display()
        );
    }
    Ok(())
}

fn run_clean() -> Result<()> {
    println!("Cleaning output files...");

    for format in [OutputFormat::Json, OutputFormat::Csv, OutputFormat::Sqlite] {
        let path = Path::new(format.default_path());
        if path.exists() {
            fs::remove_file(path)?;
            println!("  Removed {}", path.display());
        }
    }

    println!("Clean complete!");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            config,
            url,
            start,
            end,
            doc_type,
            output,
            format,
            resume_page,
            quiet,
        } => {
            init_tracing(quiet);
            let overrides = ConfigValues {
                search_url: url,
                start_date: start,
                end_date: end,
                document_type: doc_type,
            };
            run_scrape(config.as_deref(), overrides, output, format, resume_page, quiet)
        }
        Commands::Clean => run_clean(),
    }
}
