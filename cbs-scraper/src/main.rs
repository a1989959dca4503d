//! cbs-scraper - central-bank speech discovery and classification
//!
//! Subcommands:
//! - `scrape`: probe a date range and download new speeches
//! - `recategorize`: re-file speeches stored under `unknown`
//! - `clear-cache`: forget which dates were already checked
//! - `institutions`: list the canonical institution names

use anyhow::{Context, Result};
use cbs_common::config::{load_toml_config, resolve_config_path};
use cbs_scraper::config::ScraperConfig;
use cbs_scraper::services::date_cache::DateCache;
use cbs_scraper::services::discovery_prober::ProberOptions;
use cbs_scraper::services::scrape_controller::resolve_range;
use cbs_scraper::services::{
    DiscoveryProber, DocumentStore, InstitutionDirectory, InstitutionResolver, Reconciler,
    ReqwestTransport, ScrapeController, SpeechEndpoints, Transport,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cbs-scraper
#[derive(Parser, Debug)]
#[command(name = "cbs-scraper")]
#[command(about = "Discover, classify and reconcile central-bank speeches")]
#[command(version)]
struct Args {
    /// Base folder for documents and text artifacts
    #[arg(short, long, global = true, env = "CBS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, global = true, env = "CBS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe a date range and download new speeches
    Scrape {
        /// First date (YYYY-MM-DD), defaults to 7 days ago
        #[arg(short, long)]
        start_date: Option<NaiveDate>,

        /// Last date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        end_date: Option<NaiveDate>,

        /// Only keep speeches from this institution (repeatable)
        #[arg(short, long = "institution")]
        institutions: Vec<String>,

        /// Ignore the date cache and re-download existing speeches
        #[arg(short, long)]
        force: bool,

        /// Stop after this many downloads
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Re-file speeches stored under `unknown`
    Recategorize,

    /// Delete the date cache
    ClearCache,

    /// List canonical institution names
    Institutions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let config = ScraperConfig::resolve(args.data_dir.as_deref(), &toml_config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cbs-scraper v{}", env!("CARGO_PKG_VERSION"));
    info!("Data folder: {}", config.data_dir.display());

    match args.command {
        Command::Scrape {
            start_date,
            end_date,
            institutions,
            force,
            limit,
        } => {
            let today = chrono::Local::now().date_naive();
            let (start, end) = resolve_range(start_date, end_date, today)?;

            let options = ProberOptions {
                institutions: (!institutions.is_empty()).then_some(institutions),
                force,
                limit,
                request_delay: config.request_delay,
            };
            let prober = DiscoveryProber::new(
                transport(&config)?,
                SpeechEndpoints::new(&config.base_url),
                DocumentStore::from_config(&config),
                InstitutionResolver::default(),
                options,
            );

            let result = ScrapeController::new(prober).run(start, end, today).await?;
            for (code, message) in &result.errors {
                info!("Failed {}: {}", code, message);
            }
        }

        Command::Recategorize => {
            let reconciler = Reconciler::new(
                DocumentStore::from_config(&config),
                InstitutionResolver::default(),
                transport(&config)?,
                SpeechEndpoints::new(&config.base_url),
            );
            let summary = reconciler.reconcile().await?;
            info!(
                "Re-categorized {} speech(es); {} still unknown",
                summary.moved, summary.remaining
            );
        }

        Command::ClearCache => {
            if DateCache::clear(&config.documents_root())? {
                info!("Date cache cleared");
            } else {
                info!("No date cache to clear");
            }
        }

        Command::Institutions => {
            for name in InstitutionDirectory::new().canonical_names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn transport(config: &ScraperConfig) -> Result<Arc<dyn Transport>> {
    let transport =
        ReqwestTransport::from_config(config).context("Failed to build HTTP client")?;
    Ok(Arc::new(transport))
}
