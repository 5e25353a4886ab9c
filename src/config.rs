use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::{DealSelection, ProductQuery, RetryConfig};
use crate::extract::flatten_mappings;

const DEFAULT_API_URL: &str = "https://api.keepa.com";
const DEFAULT_DEAL_FILTERS: &str = "deal_filters.json";
const DEFAULT_FIELD_MAPPING: &str = "field_mapping.json";
pub const DEFAULT_LOG_FILE: &str = "debug_log.txt";
const DEFAULT_TIMEZONE: &str = "America/Toronto";

/// Application configuration loaded from environment variables and the
/// JSON files they point at
#[derive(Debug, Clone)]
pub struct Config {
    /// Keepa API base URL
    pub api_url: String,

    pub api_key: String,

    /// Output columns, in order
    pub headers: Vec<String>,

    pub deal_selection: DealSelection,

    /// Extra `(column, stats path)` rules from `field_mapping.json`
    pub field_mappings: Vec<(String, String)>,

    pub output_path: PathBuf,

    pub product_query: ProductQuery,

    /// Deals kept from the fetched page
    pub max_deals: usize,

    /// Pause between product requests
    pub request_delay: Duration,

    pub http_timeout: Duration,

    pub retry: RetryConfig,

    /// Zone used for rendered dates
    pub timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct ApiKeyFile {
    #[serde(default)]
    api_key: String,
}

impl Config {
    /// Load configuration from `.env`, the process environment and config files
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let api_key = match lookup("KEEPA_API_KEY").filter(|k| !k.trim().is_empty()) {
            Some(key) => key,
            None => load_api_key(Path::new(&var("KEEPA_CONFIG_PATH", "config.json")))?,
        };

        let headers = load_headers(Path::new(&var("KEEPA_HEADERS_PATH", "headers.json")))?;

        let deal_selection = match optional_path(&lookup, "KEEPA_DEAL_FILTERS_PATH", DEFAULT_DEAL_FILTERS)? {
            Some(path) => load_deal_selection(&path)?,
            None => DealSelection::default(),
        };

        let field_mappings = match optional_path(&lookup, "KEEPA_FIELD_MAPPING_PATH", DEFAULT_FIELD_MAPPING)? {
            Some(path) => load_field_mappings(&path)?,
            None => Vec::new(),
        };

        let zone = var("KEEPA_TIMEZONE", DEFAULT_TIMEZONE);
        let timezone: Tz = zone
            .trim()
            .parse()
            .map_err(|e| anyhow!("KEEPA_TIMEZONE {:?} is not a known time zone: {}", zone, e))?;

        Ok(Config {
            api_url: var("KEEPA_API_URL", DEFAULT_API_URL),
            api_key,
            headers,
            deal_selection,
            field_mappings,
            output_path: PathBuf::from(var("KEEPA_OUTPUT_PATH", "Keepa_Deals_Export.csv")),
            product_query: ProductQuery {
                stats_days: parse_var(&lookup, "KEEPA_STATS_DAYS", "365")?,
                offers: parse_var(&lookup, "KEEPA_OFFERS", "20")?,
                history: parse_var(&lookup, "KEEPA_HISTORY", "true")?,
            },
            max_deals: parse_var(&lookup, "KEEPA_MAX_DEALS", "5")?,
            request_delay: Duration::from_millis(parse_var(&lookup, "KEEPA_REQUEST_DELAY_MS", "1000")?),
            http_timeout: Duration::from_secs(parse_var(&lookup, "KEEPA_HTTP_TIMEOUT_SECS", "30")?),
            retry: RetryConfig {
                max_attempts: parse_var(&lookup, "KEEPA_MAX_ATTEMPTS", "3")?,
                backoff: Duration::from_millis(parse_var(&lookup, "KEEPA_RETRY_BACKOFF_MS", "2000")?),
                rate_limit_backoff: Duration::from_millis(parse_var(
                    &lookup,
                    "KEEPA_RATE_LIMIT_BACKOFF_MS",
                    "5000",
                )?),
                min_tokens: parse_var(&lookup, "KEEPA_MIN_TOKENS", "100")?,
            },
            timezone,
        })
    }
}

/// Log file location. Logging starts before the rest of the config is loaded,
/// so this is the only place `KEEPA_LOG_FILE` is read.
pub fn log_file_from_env() -> PathBuf {
    dotenvy::dotenv().ok();
    PathBuf::from(env::var("KEEPA_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()))
}

fn parse_var<F, T>(lookup: &F, name: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .with_context(|| format!("{} must be a valid {}", name, std::any::type_name::<T>()))
}

/// An explicitly configured path must exist; the default is only used when present
fn optional_path<F>(lookup: &F, name: &str, default: &str) -> Result<Option<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).filter(|p| !p.trim().is_empty()) {
        Some(path) => {
            let path = PathBuf::from(path);
            if !path.exists() {
                bail!("{} points at missing file {}", name, path.display());
            }
            Ok(Some(path))
        }
        None => {
            let path = PathBuf::from(default);
            Ok(path.exists().then_some(path))
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_api_key(path: &Path) -> Result<String> {
    let file: ApiKeyFile = read_json(path)?;
    let key = file.api_key.trim().to_string();
    if key.is_empty() {
        bail!("No api_key in {}", path.display());
    }
    Ok(key)
}

pub fn load_headers(path: &Path) -> Result<Vec<String>> {
    let headers: Vec<String> = read_json(path)?;
    if headers.is_empty() {
        bail!("Column list in {} is empty", path.display());
    }
    info!("Loaded {} columns from {}", headers.len(), path.display());
    Ok(headers)
}

pub fn load_deal_selection(path: &Path) -> Result<DealSelection> {
    let selection = read_json(path)?;
    info!("Loaded deal filters from {}", path.display());
    Ok(selection)
}

pub fn load_field_mappings(path: &Path) -> Result<Vec<(String, String)>> {
    let value: serde_json::Value = read_json(path)?;
    let mut mappings = Vec::new();
    flatten_mappings(&value, &mut mappings);
    if mappings.is_empty() {
        warn!("No column mappings found in {}", path.display());
    }
    Ok(mappings)
}
