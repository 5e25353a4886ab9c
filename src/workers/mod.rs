pub mod deal_export;

pub use deal_export::{DealExportWorker, DealSource, ExportSummary};
