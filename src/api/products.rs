use tracing::{debug, info, warn};

use crate::api::keepa::KeepaClient;
use crate::error::{KeepaError, Result};
use crate::extract::format::is_valid_asin;
use crate::models::{Product, ProductResponse};

/// Optional parts of a `/product` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuery {
    /// Window for the `stats` object, in days
    pub stats_days: u32,
    /// Number of live offers to include
    pub offers: u32,
    pub history: bool,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            stats_days: 365,
            offers: 20,
            history: true,
        }
    }
}

pub fn validate_asin(asin: &str) -> Result<()> {
    if is_valid_asin(asin) {
        Ok(())
    } else {
        Err(KeepaError::InvalidAsin(asin.to_string()))
    }
}

impl KeepaClient {
    /// Fetch a single product with stats, offers and history.
    pub async fn try_fetch_product(&self, asin: &str, query: &ProductQuery) -> Result<Product> {
        validate_asin(asin)?;

        let params = [
            ("domain", "1".to_string()),
            ("asin", asin.to_string()),
            ("stats", query.stats_days.to_string()),
            ("offers", query.offers.to_string()),
            ("rating", "1".to_string()),
            ("stock", "1".to_string()),
            ("buyBox", "1".to_string()),
            ("history", if query.history { "1" } else { "0" }.to_string()),
        ];

        let response: ProductResponse = self.get_json("product", &params).await?;
        debug!(
            "Product {}: tokens_left={:?}, refill_in={:?}",
            asin, response.tokens_left, response.refill_in
        );

        let product = response
            .products
            .into_iter()
            .next()
            .ok_or_else(|| KeepaError::IncompleteProduct {
                asin: asin.to_string(),
                reason: "no products in response".to_string(),
            })?;

        if !product.has_complete_stats() {
            let len = product.stats().map(|s| s.current.len()).unwrap_or(0);
            return Err(KeepaError::IncompleteProduct {
                asin: asin.to_string(),
                reason: format!("stats.current has {} entries", len),
            });
        }

        Ok(product)
    }

    /// Fetch a product, substituting the placeholder on any failure
    pub async fn fetch_product(&self, asin: &str, query: &ProductQuery) -> Product {
        match self.try_fetch_product(asin, query).await {
            Ok(product) => {
                info!("Fetched product {}", asin);
                product
            }
            Err(e) => {
                warn!("Using placeholder for ASIN {}: {}", asin, e);
                Product::placeholder(asin)
            }
        }
    }
}
