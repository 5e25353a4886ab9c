use std::env;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::info;

use keepa_deals::api::{validate_asin, KeepaClient};
use keepa_deals::config::{self, Config};
use keepa_deals::extract::Extractor;
use keepa_deals::logging;

/// Print every configured column for one ASIN
#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init(&config::log_file_from_env())?;

    let args: Vec<String> = env::args().collect();
    let asin = match args.get(1) {
        Some(asin) => asin.trim().to_string(),
        None => bail!("Usage: inspect_product <ASIN> [STATS_DAYS]"),
    };
    validate_asin(&asin)?;

    let mut config = Config::from_env()?;
    if let Some(days) = args.get(2) {
        config.product_query.stats_days =
            days.parse().context("STATS_DAYS must be a valid number")?;
    }

    let client = KeepaClient::new(
        &config.api_url,
        &config.api_key,
        config.http_timeout,
        config.retry.clone(),
    )?;

    info!(
        "Inspecting {} (stats window {} days)",
        asin, config.product_query.stats_days
    );
    let product = client.try_fetch_product(&asin, &config.product_query).await?;

    let extractor = Extractor::new(
        &config.headers,
        &config.field_mappings,
        config.timezone,
        Utc::now(),
    );
    for name in extractor.unknown_columns() {
        println!("(no rule) {}", name);
    }

    let row = extractor.extract_row(&product, None);
    let width = config.headers.iter().map(|h| h.len()).max().unwrap_or(0);
    for header in &config.headers {
        println!("{:width$}  {}", header, row.get(header), width = width);
    }

    Ok(())
}
