use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::api::keepa::KeepaClient;
use crate::models::{Deal, DealResponse};

/// Keepa Books root category
const BOOKS: i64 = 283155;

/// Deal query sent as the `selection` parameter.
///
/// Every field has a default, so a `deal_filters.json` override only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealSelection {
    pub page: u32,
    pub domain_id: String,
    pub include_categories: Vec<i64>,
    pub exclude_categories: Vec<i64>,
    pub price_types: Vec<u32>,
    pub delta_range: Vec<i64>,
    pub delta_percent_range: Vec<i64>,
    pub sales_rank_range: Vec<i64>,
    pub current_range: Vec<i64>,
    pub min_rating: i64,
    pub is_lowest: bool,
    pub is_lowest90: bool,
    pub is_lowest_offer: bool,
    pub is_out_of_stock: bool,
    pub title_search: String,
    pub is_range_enabled: bool,
    pub is_filter_enabled: bool,
    pub has_reviews: bool,
    pub filter_erotic: bool,
    pub single_variation: bool,
    pub is_prime_exclusive: bool,
    pub must_have_amazon_offer: bool,
    pub must_not_have_amazon_offer: bool,
    pub sort_type: i64,
    pub date_range: String,
    pub warehouse_conditions: Vec<i64>,
}

impl Default for DealSelection {
    fn default() -> Self {
        Self {
            page: 0,
            domain_id: "1".to_string(),
            include_categories: vec![BOOKS],
            exclude_categories: Vec::new(),
            // Used
            price_types: vec![2],
            delta_range: vec![1950, 9900],
            delta_percent_range: vec![50, i32::MAX as i64],
            sales_rank_range: vec![50000, 1500000],
            current_range: vec![2000, 30100],
            min_rating: 10,
            is_lowest: false,
            is_lowest90: false,
            is_lowest_offer: false,
            is_out_of_stock: false,
            title_search: String::new(),
            is_range_enabled: true,
            is_filter_enabled: true,
            has_reviews: false,
            filter_erotic: false,
            single_variation: true,
            is_prime_exclusive: false,
            must_have_amazon_offer: false,
            must_not_have_amazon_offer: false,
            sort_type: 4,
            date_range: "3".to_string(),
            warehouse_conditions: vec![2, 3, 4, 5],
        }
    }
}

impl KeepaClient {
    /// Fetch one page of deals, at most `max_deals` of them.
    ///
    /// Failures are logged and yield an empty list; the caller treats that
    /// as "no candidates".
    pub async fn fetch_deals(
        &self,
        selection: &DealSelection,
        page: u32,
        max_deals: usize,
    ) -> Vec<Deal> {
        let selection = DealSelection {
            page,
            ..selection.clone()
        };

        let json = match serde_json::to_string(&selection) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to encode deal selection: {}", e);
                return Vec::new();
            }
        };
        debug!("Deal selection: {}", json);

        match self
            .get_json::<DealResponse>("deal", &[("selection", json)])
            .await
        {
            Ok(response) => {
                let mut deals = response.into_deals();
                let total = deals.len();
                deals.truncate(max_deals);
                info!("Fetched {} deals on page {} (keeping {})", total, page, deals.len());
                deals
            }
            Err(e) => {
                error!("Failed to fetch deals for page {}: {}", page, e);
                Vec::new()
            }
        }
    }
}
