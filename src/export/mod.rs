pub mod csv_export;

pub use csv_export::{CsvExporter, NO_DEALS_MESSAGE};
