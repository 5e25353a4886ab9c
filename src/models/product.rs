use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::lenient::lenient;

/// Number of entries in the placeholder `stats.current` array.
pub const PLACEHOLDER_CURRENT_LEN: usize = 30;

/// A product with fewer `stats.current` entries than this is treated as
/// incomplete (index 18, the Buy Box price, must be addressable).
pub const MIN_CURRENT_LEN: usize = 19;

/// Product record from the Keepa `/product` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "lenient")]
    pub asin: String,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    /// Catalog type string, e.g. "ABIS_BOOK"
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub product_type: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub stats: Option<Stats>,

    /// Price history per price type, flattened (time, value[, shipping]) rows
    #[serde(default, deserialize_with = "lenient")]
    pub csv: Vec<Option<Vec<i64>>>,

    /// `None` when the response carried no offer list at all
    #[serde(default, deserialize_with = "lenient")]
    pub offers: Option<Vec<Offer>>,

    #[serde(default, deserialize_with = "lenient")]
    pub category_tree: Vec<CategoryNode>,

    #[serde(default, deserialize_with = "lenient")]
    pub root_category: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub sales_rank_reference: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub manufacturer: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub brand: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub product_group: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub item_type_keyword: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub binding: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub edition: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub number_of_items: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub number_of_pages: Option<i64>,

    /// YYYYMMDD, YYYYMM or YYYY as an integer
    #[serde(default, deserialize_with = "lenient")]
    pub publication_date: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub release_date: Option<i64>,

    /// `[name, role]` pairs
    #[serde(default, deserialize_with = "lenient")]
    pub contributors: Vec<Vec<String>>,

    /// `[language, kind...]` entries
    #[serde(default, deserialize_with = "lenient")]
    pub languages: Vec<Vec<String>>,

    #[serde(default, deserialize_with = "lenient")]
    pub package_quantity: Option<i64>,

    /// Grams
    #[serde(default, deserialize_with = "lenient")]
    pub package_weight: Option<i64>,

    /// Millimetres
    #[serde(default, deserialize_with = "lenient")]
    pub package_height: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub package_length: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub package_width: Option<i64>,

    /// Keepa minutes
    #[serde(default, deserialize_with = "lenient")]
    pub tracking_since: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub listed_since: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub last_update: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub last_price_change: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub frequently_bought_together: Vec<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub variations: Vec<Variation>,

    /// Set on the stand-in for a product that could not be fetched
    #[serde(skip)]
    pub is_placeholder: bool,
}

impl Product {
    /// Stand-in for a product that could not be fetched.
    ///
    /// Every stats lookup on it resolves to the `-1` sentinel, so a failed
    /// ASIN still yields a full row of placeholders.
    pub fn placeholder(asin: &str) -> Self {
        Self {
            asin: asin.to_string(),
            is_placeholder: true,
            stats: Some(Stats {
                current: vec![Some(-1); PLACEHOLDER_CURRENT_LEN],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// Whether the stats block is present and long enough to index
    pub fn has_complete_stats(&self) -> bool {
        self.stats
            .as_ref()
            .map(|s| s.current.len() >= MIN_CURRENT_LEN)
            .unwrap_or(false)
    }

    /// Raw history row for a price type, if Keepa sent one
    pub fn history(&self, price_type: usize) -> Option<&[i64]> {
        self.csv
            .get(price_type)
            .and_then(|h| h.as_deref())
            .filter(|h| !h.is_empty())
    }
}

/// Named aggregation window inside `stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsPeriod {
    Current,
    /// Average over the requested stats window
    Avg,
    Avg30,
    Avg90,
    Avg180,
    Avg365,
    OutOfStock30,
    OutOfStock90,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::Current => "current",
            StatsPeriod::Avg => "avg",
            StatsPeriod::Avg30 => "avg30",
            StatsPeriod::Avg90 => "avg90",
            StatsPeriod::Avg180 => "avg180",
            StatsPeriod::Avg365 => "avg365",
            StatsPeriod::OutOfStock30 => "outOfStockPercentage30",
            StatsPeriod::OutOfStock90 => "outOfStockPercentage90",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "current" => Some(StatsPeriod::Current),
            "avg" => Some(StatsPeriod::Avg),
            "avg30" => Some(StatsPeriod::Avg30),
            "avg90" => Some(StatsPeriod::Avg90),
            "avg180" => Some(StatsPeriod::Avg180),
            "avg365" => Some(StatsPeriod::Avg365),
            "outOfStockPercentage30" | "outOfStock30" => Some(StatsPeriod::OutOfStock30),
            "outOfStockPercentage90" | "outOfStock90" => Some(StatsPeriod::OutOfStock90),
            _ => None,
        }
    }

    pub fn is_out_of_stock(&self) -> bool {
        matches!(self, StatsPeriod::OutOfStock30 | StatsPeriod::OutOfStock90)
    }
}

/// Extreme in `stats.min` / `stats.max`: which array to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
    MinInInterval,
    MaxInInterval,
}

/// The `stats` object of a product (requested with `stats=<days>`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default, deserialize_with = "lenient")]
    pub current: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub avg: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub avg30: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub avg90: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub avg180: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub avg365: Vec<Option<i64>>,

    /// `[keepa_minutes, value]` per price type
    #[serde(default, deserialize_with = "lenient")]
    pub min: Vec<Option<Vec<i64>>>,

    #[serde(default, deserialize_with = "lenient")]
    pub max: Vec<Option<Vec<i64>>>,

    #[serde(default, alias = "min365", deserialize_with = "lenient")]
    pub min_in_interval: Vec<Option<Vec<i64>>>,

    #[serde(default, alias = "max365", deserialize_with = "lenient")]
    pub max_in_interval: Vec<Option<Vec<i64>>>,

    #[serde(default, deserialize_with = "lenient")]
    pub out_of_stock_percentage30: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub out_of_stock_percentage90: Vec<Option<i64>>,

    #[serde(default, deserialize_with = "lenient")]
    pub sales_rank_drops30: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub sales_rank_drops90: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub sales_rank_drops180: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub sales_rank_drops365: Option<i64>,
}

impl Stats {
    pub fn period(&self, period: StatsPeriod) -> &[Option<i64>] {
        match period {
            StatsPeriod::Current => &self.current,
            StatsPeriod::Avg => &self.avg,
            StatsPeriod::Avg30 => &self.avg30,
            StatsPeriod::Avg90 => &self.avg90,
            StatsPeriod::Avg180 => &self.avg180,
            StatsPeriod::Avg365 => &self.avg365,
            StatsPeriod::OutOfStock30 => &self.out_of_stock_percentage30,
            StatsPeriod::OutOfStock90 => &self.out_of_stock_percentage90,
        }
    }

    /// Raw value at `stats.<period>[index]`, sentinels included
    pub fn value(&self, period: StatsPeriod, index: usize) -> Option<i64> {
        self.period(period).get(index).copied().flatten()
    }

    /// Value half of a `[time, value]` extreme entry
    pub fn extreme(&self, which: Extreme, index: usize) -> Option<i64> {
        let entries = match which {
            Extreme::Min => &self.min,
            Extreme::Max => &self.max,
            Extreme::MinInInterval => &self.min_in_interval,
            Extreme::MaxInInterval => &self.max_in_interval,
        };
        entries
            .get(index)
            .and_then(|e| e.as_ref())
            .and_then(|pair| pair.get(1).copied())
    }

    pub fn sales_rank_drops(&self, days: u32) -> Option<i64> {
        match days {
            30 => self.sales_rank_drops30,
            90 => self.sales_rank_drops90,
            180 => self.sales_rank_drops180,
            365 => self.sales_rank_drops365,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(default, deserialize_with = "lenient")]
    pub cat_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default, deserialize_with = "lenient")]
    pub asin: String,
    #[serde(default, deserialize_with = "lenient")]
    pub attributes: Vec<VariationAttribute>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariationAttribute {
    #[serde(default, deserialize_with = "lenient")]
    pub dimension: String,
    #[serde(default, deserialize_with = "lenient")]
    pub value: String,
}

/// A live marketplace offer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default, deserialize_with = "lenient")]
    pub condition: OfferCondition,

    #[serde(rename = "isFBA", default, deserialize_with = "lenient")]
    pub is_fba: bool,

    #[serde(default, deserialize_with = "lenient")]
    pub is_amazon: bool,

    #[serde(default, deserialize_with = "lenient")]
    pub is_buy_box: bool,

    #[serde(default, deserialize_with = "lenient")]
    pub stock: Option<i64>,

    /// `[keepa_minutes, stock, ...]` history
    #[serde(rename = "stockCSV", default, deserialize_with = "lenient")]
    pub stock_csv: Vec<i64>,
}

impl Offer {
    /// Latest known stock: the explicit field, else the last `stockCSV` value
    pub fn stock_level(&self) -> Option<i64> {
        self.stock.or_else(|| {
            if self.stock_csv.len() >= 2 {
                self.stock_csv.last().copied()
            } else {
                None
            }
        })
    }
}

/// Offer condition; Keepa sends an integer code, older dumps a label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OfferCondition {
    #[default]
    Unknown,
    New,
    UsedLikeNew,
    UsedVeryGood,
    UsedGood,
    UsedAcceptable,
    Other,
}

impl OfferCondition {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => OfferCondition::New,
            2 => OfferCondition::UsedLikeNew,
            3 => OfferCondition::UsedVeryGood,
            4 => OfferCondition::UsedGood,
            5 => OfferCondition::UsedAcceptable,
            0 => OfferCondition::Unknown,
            _ => OfferCondition::Other,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "new" => OfferCondition::New,
            "used - like new" | "used, like new" | "used_like_new" => OfferCondition::UsedLikeNew,
            "used - very good" | "used, very good" | "used_very_good" => {
                OfferCondition::UsedVeryGood
            }
            "used - good" | "used, good" | "used_good" => OfferCondition::UsedGood,
            "used - acceptable" | "used, acceptable" | "used_acceptable" => {
                OfferCondition::UsedAcceptable
            }
            "" => OfferCondition::Unknown,
            _ => OfferCondition::Other,
        }
    }

    pub fn is_used(&self) -> bool {
        matches!(
            self,
            OfferCondition::UsedLikeNew
                | OfferCondition::UsedVeryGood
                | OfferCondition::UsedGood
                | OfferCondition::UsedAcceptable
        )
    }
}

impl<'de> Deserialize<'de> for OfferCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().map(Self::from_code).unwrap_or_default(),
            Value::String(s) => Self::from_label(&s),
            _ => OfferCondition::Unknown,
        })
    }
}

/// Envelope of the `/product` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub products: Vec<Product>,

    #[serde(default, deserialize_with = "lenient")]
    pub tokens_left: Option<i64>,

    /// Milliseconds until the token bucket refills
    #[serde(default, deserialize_with = "lenient")]
    pub refill_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_shape() {
        let product = Product::placeholder("0306406152");
        let stats = product.stats().unwrap();
        assert_eq!(product.asin, "0306406152");
        assert_eq!(stats.current.len(), PLACEHOLDER_CURRENT_LEN);
        assert!(stats.current.iter().all(|v| *v == Some(-1)));
        assert!(product.has_complete_stats());
        assert!(product.is_placeholder);
    }

    #[test]
    fn test_decode_tolerates_nulls_and_bad_fields() {
        let json = r#"{
            "asin": "0306406152",
            "title": "A Book",
            "csv": [null, [100, 2500, 200, 2400], null],
            "offers": null,
            "categoryTree": "not a list",
            "packageWeight": 454,
            "stats": {
                "current": [1000, 1200, 1500, 50000, null],
                "min": [null, [100, 2300]],
                "min365": [null, [200, 2350]],
                "salesRankDrops30": 4
            }
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        let stats = product.stats().unwrap();

        assert_eq!(product.title.as_deref(), Some("A Book"));
        assert!(product.offers.is_none());
        assert!(product.category_tree.is_empty());
        assert_eq!(product.package_weight, Some(454));
        assert_eq!(stats.value(StatsPeriod::Current, 2), Some(1500));
        assert_eq!(stats.value(StatsPeriod::Current, 4), None);
        assert_eq!(stats.value(StatsPeriod::Current, 40), None);
        assert_eq!(stats.extreme(Extreme::Min, 1), Some(2300));
        assert_eq!(stats.extreme(Extreme::MinInInterval, 1), Some(2350));
        assert_eq!(stats.sales_rank_drops(30), Some(4));
        assert_eq!(product.history(1), Some(&[100, 2500, 200, 2400][..]));
        assert_eq!(product.history(0), None);
        assert!(!product.has_complete_stats());
    }

    #[test]
    fn test_offer_condition_codes_and_labels() {
        let offers: Vec<Offer> = serde_json::from_str(
            r#"[
                {"condition": 4, "isFBA": true, "stock": 2},
                {"condition": "Used - Like New", "stockCSV": [100, 3, 200, 5]},
                {"condition": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(offers[0].condition, OfferCondition::UsedGood);
        assert!(offers[0].is_fba);
        assert_eq!(offers[0].stock_level(), Some(2));
        assert_eq!(offers[1].condition, OfferCondition::UsedLikeNew);
        assert_eq!(offers[1].stock_level(), Some(5));
        assert_eq!(offers[2].condition, OfferCondition::Unknown);
        assert_eq!(offers[2].stock_level(), None);
    }

    #[test]
    fn test_stats_period_names_round_trip() {
        for period in [
            StatsPeriod::Current,
            StatsPeriod::Avg,
            StatsPeriod::Avg30,
            StatsPeriod::Avg90,
            StatsPeriod::Avg180,
            StatsPeriod::Avg365,
            StatsPeriod::OutOfStock30,
            StatsPeriod::OutOfStock90,
        ] {
            assert_eq!(StatsPeriod::from_name(period.as_str()), Some(period));
        }
        assert_eq!(StatsPeriod::from_name("avg60"), None);
    }
}
