use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::{DealSelection, KeepaClient, ProductQuery};
use crate::config::Config;
use crate::export::CsvExporter;
use crate::extract::Extractor;
use crate::models::{Deal, OutputRow};

/// Where the ASINs of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealSource {
    /// One page of the deal search
    DealPage(u32),
    /// Explicit ASINs, no deal lookup
    Asins(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub candidates: usize,
    pub rows: usize,
    /// Rows built from the placeholder product
    pub placeholders: usize,
    pub output_path: PathBuf,
}

/// Worker that runs one deal → product → CSV batch
pub struct DealExportWorker {
    client: KeepaClient,
    extractor: Extractor,
    exporter: CsvExporter,
    selection: DealSelection,
    query: ProductQuery,
    max_deals: usize,
    request_delay: Duration,
    output_path: PathBuf,
}

impl DealExportWorker {
    /// Create a new export worker; `now` anchors every time-window column
    pub fn new(client: KeepaClient, config: &Config, now: DateTime<Utc>) -> Self {
        let extractor = Extractor::new(
            &config.headers,
            &config.field_mappings,
            config.timezone,
            now,
        );

        Self {
            client,
            extractor,
            exporter: CsvExporter::new(config.headers.clone()),
            selection: config.deal_selection.clone(),
            query: config.product_query,
            max_deals: config.max_deals,
            request_delay: config.request_delay,
            output_path: config.output_path.clone(),
        }
    }

    /// Run the batch and write the CSV
    pub async fn run(&self, source: DealSource) -> Result<ExportSummary> {
        info!("Export started ({:?})", source);

        let candidates = self.candidates(source).await;
        if candidates.is_empty() {
            warn!("No deals fetched, writing diagnostic row only");
        }

        let (rows, placeholders) = self.collect_rows(&candidates).await;
        self.exporter.write_file(&self.output_path, &rows)?;

        let summary = ExportSummary {
            candidates: candidates.len(),
            rows: rows.len(),
            placeholders,
            output_path: self.output_path.clone(),
        };
        info!(
            "Export complete: {} rows ({} placeholders) -> {}",
            summary.rows,
            summary.placeholders,
            summary.output_path.display()
        );
        Ok(summary)
    }

    async fn candidates(&self, source: DealSource) -> Vec<(String, Option<Deal>)> {
        match source {
            DealSource::DealPage(page) => self
                .client
                .fetch_deals(&self.selection, page, self.max_deals)
                .await
                .into_iter()
                .map(|deal| (deal.asin.clone(), Some(deal)))
                .collect(),
            DealSource::Asins(asins) => asins
                .into_iter()
                .map(|asin| (asin.trim().to_string(), None))
                .collect(),
        }
    }

    /// Fetch and extract each candidate in order, pausing between requests
    pub async fn collect_rows(&self, candidates: &[(String, Option<Deal>)]) -> (Vec<OutputRow>, usize) {
        let mut rows = Vec::with_capacity(candidates.len());
        let mut placeholders = 0;

        for (i, (asin, deal)) in candidates.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }

            info!("Processing ASIN {} ({}/{})", asin, i + 1, candidates.len());
            let product = self.client.fetch_product(asin, &self.query).await;
            if product.is_placeholder {
                placeholders += 1;
            }

            rows.push(self.extractor.extract_row(&product, deal.as_ref()));
        }

        (rows, placeholders)
    }
}
