use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use keepa_deals::api::KeepaClient;
use keepa_deals::config::{self, Config};
use keepa_deals::logging;
use keepa_deals::workers::{DealExportWorker, DealSource};

#[derive(Parser)]
#[command(name = "keepa_deals")]
#[command(about = "Export Keepa deals and product stats to CSV")]
struct Cli {
    /// Deal search page to fetch
    #[arg(short, long, default_value_t = 0)]
    page: u32,

    /// Maximum number of deals to process
    #[arg(short = 'n', long)]
    max_deals: Option<usize>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Statistics window in days
    #[arg(long)]
    stats_days: Option<u32>,

    /// Export these ASINs instead of searching deals
    #[arg(long = "asin", value_name = "ASIN")]
    asins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let _log_guard = logging::init(&config::log_file_from_env())?;

    info!("Starting keepa_deals");

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(max_deals) = cli.max_deals {
        config.max_deals = max_deals;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(days) = cli.stats_days {
        config.product_query.stats_days = days;
    }
    info!("Configuration loaded ({} columns)", config.headers.len());

    let client = KeepaClient::new(
        &config.api_url,
        &config.api_key,
        config.http_timeout,
        config.retry.clone(),
    )?;

    let worker = DealExportWorker::new(client, &config, Utc::now());

    let source = if cli.asins.is_empty() {
        DealSource::DealPage(cli.page)
    } else {
        DealSource::Asins(cli.asins)
    };

    let summary = worker.run(source).await?;
    info!(
        "Done: {} candidates, {} rows written to {}",
        summary.candidates,
        summary.rows,
        summary.output_path.display()
    );

    Ok(())
}
