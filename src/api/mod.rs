pub mod deals;
pub mod keepa;
pub mod products;
pub mod retry;

pub use deals::DealSelection;
pub use keepa::KeepaClient;
pub use products::{validate_asin, ProductQuery};
pub use retry::RetryConfig;
