pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod models;
pub mod workers;
