use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::models::{OutputRow, MISSING};

/// First cell of the row written when there were no deals
pub const NO_DEALS_MESSAGE: &str = "No deals fetched";

/// Writes extracted rows under a fixed header
pub struct CsvExporter {
    headers: Vec<String>,
}

impl CsvExporter {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers }
    }

    /// Write the header and every row in order.
    ///
    /// With no rows a single diagnostic row is written, so the file always
    /// has a data line as wide as the header.
    pub fn write_to<W: Write>(&self, writer: W, rows: &[OutputRow]) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        csv.write_record(&self.headers)
            .context("Failed to write CSV header")?;

        if rows.is_empty() {
            csv.write_record(self.diagnostic_row())
                .context("Failed to write CSV diagnostic row")?;
        }

        for row in rows {
            csv.write_record(row.ordered(&self.headers))
                .context("Failed to write CSV row")?;
        }

        csv.flush().context("Failed to flush CSV output")?;
        Ok(())
    }

    /// Replace `path` with a fresh export
    pub fn write_file(&self, path: &Path, rows: &[OutputRow]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
        }

        let result = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))
            .and_then(|file| self.write_to(file, rows));

        match &result {
            Ok(()) => info!(
                "Wrote {} rows to {}",
                rows.len().max(1),
                path.display()
            ),
            Err(e) => error!("CSV export to {} failed: {:#}", path.display(), e),
        }
        result
    }

    fn diagnostic_row(&self) -> Vec<&str> {
        (0..self.headers.len())
            .map(|i| if i == 0 { NO_DEALS_MESSAGE } else { MISSING })
            .collect()
    }
}
