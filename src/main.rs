use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use address_enricher::app::ports::{AddressLookupPort, StoragePort};
use address_enricher::app::EnrichUseCase;
use address_enricher::config::Config;
use address_enricher::infra::{storage_for_environment, ArcGisAddressLookup, InMemoryStorage, UspsCarrierRouteLookup};
use address_enricher::observability;
use address_enricher::{Address, AddressRecord, SessionContext};

#[derive(Parser)]
#[command(name = "address_enricher")]
#[command(about = "Validate postal addresses and annotate them with carrier routes")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file. Built-in defaults are used when it is absent.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch through validation, carrier routing and the report
    Enrich {
        /// JSON file holding an array of address records
        #[arg(long)]
        input: PathBuf,
        /// Session id used to name the report. Generated when omitted.
        #[arg(long)]
        session: Option<String>,
        /// Max in-flight lookups per stage, at least 1 (overrides config)
        #[arg(long)]
        concurrency: Option<NonZeroUsize>,
        /// Keep the report in memory instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Query the address lookup for one free-form line and print the candidates
    Lookup {
        #[arg(long)]
        address: String,
    },
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Ok(Config::load_from(path)?)
    } else {
        info!("No config at {}, using defaults", path.display());
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

fn read_batch(path: &Path) -> Result<Vec<Address>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading input file {}", path.display()))?;
    let records: Vec<AddressRecord> =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            record
                .into_address()
                .with_context(|| format!("input record {} is not a valid address", i))
        })
        .collect()
}

async fn run_enrich(
    mut config: Config,
    input: &Path,
    session: Option<String>,
    concurrency: Option<NonZeroUsize>,
    dry_run: bool,
) -> Result<()> {
    if let Some(limit) = concurrency {
        config.lookup.concurrency = limit;
    }

    let session_id = session.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let ctx = SessionContext::new(session_id)?;
    let batch = read_batch(input)?;
    info!(session = %ctx.session_id(), addresses = batch.len(), "Loaded batch");

    let storage: Arc<dyn StoragePort> = if dry_run {
        Arc::new(InMemoryStorage::new())
    } else {
        storage_for_environment(config.storage.environment, &config.storage)?
    };

    let use_case = EnrichUseCase::new(
        config.clone(),
        Arc::new(ArcGisAddressLookup::new(&config.lookup)?),
        Arc::new(UspsCarrierRouteLookup::new(&config.lookup)?),
        storage,
    );

    let report = use_case.enrich(batch, &ctx).await?;

    println!("\n📊 Enrichment results for session {}:", report.session_id);
    println!("   Addresses: {}", report.total);
    println!("   Corrected: {}", report.corrected);
    println!("   Routed: {}", report.routed);
    if dry_run {
        println!("   Report (dry run, not written): {}", report.report_path);
    } else {
        println!("   Report: {}", report.report_path);
    }
    Ok(())
}

async fn run_lookup(config: &Config, address: &str) -> Result<()> {
    let lookup = ArcGisAddressLookup::new(&config.lookup)?;
    let candidates = lookup.find_candidates(address).await?;
    if candidates.is_empty() {
        println!("No candidates for '{}'", address);
    }
    for (i, candidate) in candidates.iter().enumerate() {
        println!("{:>2}. {:?}", i + 1, candidate.attributes);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _guard = observability::init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    observability::metrics::init(config.metrics_port);

    let result = match cli.command {
        Commands::Enrich {
            input,
            session,
            concurrency,
            dry_run,
        } => run_enrich(config, &input, session, concurrency, dry_run).await,
        Commands::Lookup { address } => run_lookup(&config, &address).await,
    };

    if let Err(e) = &result {
        error!("Run failed: {:#}", e);
    }
    result
}
