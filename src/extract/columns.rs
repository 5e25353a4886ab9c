//! Declarative column table.
//!
//! Every output column name resolves to one [`Column`]; the extractor only
//! ever interprets these values, never the names themselves.

use std::collections::HashMap;
use std::fmt;

use crate::models::{Offer, OfferCondition, StatsPeriod};

/// How a series value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Cents,
    Rank,
    Count,
    /// Stars ×10
    Rating,
}

/// Which live offers count toward a series' stock column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferFilter {
    New,
    NewFba,
    NewFbm,
    Amazon,
    BuyBox,
    BuyBoxUsed,
    AnyUsed,
    Condition(OfferCondition),
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        let condition = offer.condition;
        match self {
            OfferFilter::New => condition == OfferCondition::New,
            OfferFilter::NewFba => condition == OfferCondition::New && offer.is_fba,
            OfferFilter::NewFbm => condition == OfferCondition::New && !offer.is_fba,
            OfferFilter::Amazon => offer.is_amazon,
            OfferFilter::BuyBox => offer.is_buy_box && !condition.is_used(),
            OfferFilter::BuyBoxUsed => offer.is_buy_box && condition.is_used(),
            OfferFilter::AnyUsed => condition.is_used(),
            OfferFilter::Condition(c) => condition == *c,
        }
    }
}

/// One Keepa price type as it appears in column names
#[derive(Debug, PartialEq, Eq)]
pub struct Series {
    pub label: &'static str,
    /// Index into `stats.*` and `csv`
    pub index: usize,
    pub unit: Unit,
    /// History rows are (time, price, shipping) triples
    pub shipping: bool,
    pub stock: Option<OfferFilter>,
}

impl Series {
    pub fn stride(&self) -> usize {
        if self.shipping {
            3
        } else {
            2
        }
    }
}

pub const AMAZON: usize = 0;
pub const NEW: usize = 1;
pub const USED: usize = 2;
pub const SALES_RANK: usize = 3;
pub const LIST_PRICE: usize = 4;
pub const NEW_FBM: usize = 7;
pub const NEW_FBA: usize = 10;
pub const COUNT_NEW: usize = 11;
pub const COUNT_USED: usize = 12;
pub const RATING: usize = 16;
pub const COUNT_REVIEWS: usize = 17;
pub const BUY_BOX: usize = 18;
pub const USED_LIKE_NEW: usize = 19;
pub const USED_VERY_GOOD: usize = 20;
pub const USED_GOOD: usize = 21;
pub const USED_ACCEPTABLE: usize = 22;
pub const BUY_BOX_USED: usize = 32;

const fn price_series(
    label: &'static str,
    index: usize,
    shipping: bool,
    stock: Option<OfferFilter>,
) -> Series {
    Series {
        label,
        index,
        unit: Unit::Cents,
        shipping,
        stock,
    }
}

/// Price series that get the full twelve-column block, in header order
pub static PRICE_SERIES: [Series; 12] = [
    price_series("Buy Box", BUY_BOX, true, Some(OfferFilter::BuyBox)),
    price_series("Amazon", AMAZON, false, Some(OfferFilter::Amazon)),
    price_series("New", NEW, false, Some(OfferFilter::New)),
    price_series("New, 3rd Party FBA", NEW_FBA, false, Some(OfferFilter::NewFba)),
    price_series("New, 3rd Party FBM", NEW_FBM, true, Some(OfferFilter::NewFbm)),
    price_series("Buy Box Used", BUY_BOX_USED, true, Some(OfferFilter::BuyBoxUsed)),
    price_series("Used", USED, false, Some(OfferFilter::AnyUsed)),
    price_series(
        "Used, like new",
        USED_LIKE_NEW,
        true,
        Some(OfferFilter::Condition(OfferCondition::UsedLikeNew)),
    ),
    price_series(
        "Used, very good",
        USED_VERY_GOOD,
        true,
        Some(OfferFilter::Condition(OfferCondition::UsedVeryGood)),
    ),
    price_series(
        "Used, good",
        USED_GOOD,
        true,
        Some(OfferFilter::Condition(OfferCondition::UsedGood)),
    ),
    price_series(
        "Used, acceptable",
        USED_ACCEPTABLE,
        true,
        Some(OfferFilter::Condition(OfferCondition::UsedAcceptable)),
    ),
    price_series("List Price", LIST_PRICE, false, None),
];

pub static SALES_RANK_SERIES: Series = Series {
    label: "Sales Rank",
    index: SALES_RANK,
    unit: Unit::Rank,
    shipping: false,
    stock: None,
};

pub static OFFER_COUNT_SERIES: [Series; 2] = [
    Series {
        label: "New Offer Count",
        index: COUNT_NEW,
        unit: Unit::Count,
        shipping: false,
        stock: None,
    },
    Series {
        label: "Used Offer Count",
        index: COUNT_USED,
        unit: Unit::Count,
        shipping: false,
        stock: None,
    },
];

/// Checked in this order when naming the source of the current used price
pub const USED_SOURCES: [usize; 5] = [
    BUY_BOX_USED,
    USED_LIKE_NEW,
    USED_VERY_GOOD,
    USED_GOOD,
    USED_ACCEPTABLE,
];

pub fn series_by_index(index: usize) -> Option<&'static Series> {
    PRICE_SERIES
        .iter()
        .chain(std::iter::once(&SALES_RANK_SERIES))
        .chain(OFFER_COUNT_SERIES.iter())
        .find(|s| s.index == index)
}

/// Rendering unit for a raw stats index
pub fn unit_for_index(index: usize) -> Unit {
    match index {
        RATING => Unit::Rating,
        COUNT_REVIEWS => Unit::Count,
        _ => series_by_index(index).map(|s| s.unit).unwrap_or(Unit::Cents),
    }
}

/// What a series column reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Current,
    Average(StatsPeriod),
    /// Derived from history, Keepa has no 60-day array
    Average60,
    Lowest,
    Highest,
    Lowest365,
    Highest365,
    OutOfStock90,
    Stock,
    Drops(u32),
}

impl Metric {
    fn suffix(&self) -> String {
        match self {
            Metric::Current => "Current".to_string(),
            Metric::Average(StatsPeriod::Avg30) => "30 days avg.".to_string(),
            Metric::Average60 => "60 days avg.".to_string(),
            Metric::Average(StatsPeriod::Avg90) => "90 days avg.".to_string(),
            Metric::Average(StatsPeriod::Avg180) => "180 days avg.".to_string(),
            Metric::Average(StatsPeriod::Avg365) => "365 days avg.".to_string(),
            Metric::Average(other) => format!("{} avg.", other.as_str()),
            Metric::Lowest => "Lowest".to_string(),
            Metric::Highest => "Highest".to_string(),
            Metric::Lowest365 => "Lowest 365 days".to_string(),
            Metric::Highest365 => "Highest 365 days".to_string(),
            Metric::OutOfStock90 => "90 days OOS".to_string(),
            Metric::Stock => "Stock".to_string(),
            Metric::Drops(days) => format!("Drops last {} days", days),
        }
    }
}

const AVERAGES: [Metric; 5] = [
    Metric::Average(StatsPeriod::Avg30),
    Metric::Average60,
    Metric::Average(StatsPeriod::Avg90),
    Metric::Average(StatsPeriod::Avg180),
    Metric::Average(StatsPeriod::Avg365),
];

const EXTREMES: [Metric; 4] = [
    Metric::Lowest,
    Metric::Lowest365,
    Metric::Highest,
    Metric::Highest365,
];

/// Non-series columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PercentDown90,
    AvgPrice90,
    PercentDown365,
    AvgPrice365,
    PriceNow,
    PriceNowSource,
    DealFound,
    AmzLink,
    KeepaLink,
    Title,
    LastUpdate,
    LastPriceChange,
    SalesRankReference,
    ReviewsRating,
    ReviewCount,
    FbaFee,
    ReferralFee,
    TrackingSince,
    CategoriesRoot,
    CategoriesSub,
    CategoriesTree,
    Asin,
    FreqBoughtTogether,
    Type,
    Manufacturer,
    Brand,
    ProductGroup,
    VariationAttributes,
    ItemType,
    Author,
    Contributors,
    Binding,
    NumberOfItems,
    NumberOfPages,
    PublicationDate,
    Languages,
    PackageQuantity,
    PackageWeight,
    PackageHeight,
    PackageLength,
    PackageWidth,
    ListedSince,
    Edition,
    ReleaseDate,
    Format,
}

const FIELDS: [(&str, Field); 45] = [
    ("Percent Down 90", Field::PercentDown90),
    ("Avg. Price 90", Field::AvgPrice90),
    ("Percent Down 365", Field::PercentDown365),
    ("Avg. Price 365", Field::AvgPrice365),
    ("Price Now", Field::PriceNow),
    ("Price Now Source", Field::PriceNowSource),
    ("Deal found", Field::DealFound),
    ("AMZ link", Field::AmzLink),
    ("Keepa Link", Field::KeepaLink),
    ("Title", Field::Title),
    ("last update", Field::LastUpdate),
    ("last price change", Field::LastPriceChange),
    ("Sales Rank - Reference", Field::SalesRankReference),
    ("Reviews - Rating", Field::ReviewsRating),
    ("Reviews - Review Count", Field::ReviewCount),
    ("FBA Pick&Pack Fee", Field::FbaFee),
    ("Referral Fee %", Field::ReferralFee),
    ("Tracking since", Field::TrackingSince),
    ("Categories - Root", Field::CategoriesRoot),
    ("Categories - Sub", Field::CategoriesSub),
    ("Categories - Tree", Field::CategoriesTree),
    ("ASIN", Field::Asin),
    ("Freq. Bought Together", Field::FreqBoughtTogether),
    ("Type", Field::Type),
    ("Manufacturer", Field::Manufacturer),
    ("Brand", Field::Brand),
    ("Product Group", Field::ProductGroup),
    ("Variation Attributes", Field::VariationAttributes),
    ("Item Type", Field::ItemType),
    ("Author", Field::Author),
    ("Contributors", Field::Contributors),
    ("Binding", Field::Binding),
    ("Number of Items", Field::NumberOfItems),
    ("Number of Pages", Field::NumberOfPages),
    ("Publication Date", Field::PublicationDate),
    ("Languages", Field::Languages),
    ("Package - Quantity", Field::PackageQuantity),
    ("Package Weight", Field::PackageWeight),
    ("Package Height", Field::PackageHeight),
    ("Package Length", Field::PackageLength),
    ("Package Width", Field::PackageWidth),
    ("Listed since", Field::ListedSince),
    ("Edition", Field::Edition),
    ("Release Date", Field::ReleaseDate),
    ("Format", Field::Format),
];

/// A `stats.<period>[<index>]` path from `field_mapping.json`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatPath {
    pub period: StatsPeriod,
    pub index: usize,
}

impl StatPath {
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.trim().strip_prefix("stats.")?;
        let (period, index) = rest.strip_suffix(']')?.split_once('[')?;
        Some(StatPath {
            period: StatsPeriod::from_name(period)?,
            index: index.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for StatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stats.{}[{}]", self.period.as_str(), self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Series {
        series: &'static Series,
        metric: Metric,
    },
    Mapped(StatPath),
    Field(Field),
}

fn insert_series(table: &mut HashMap<String, Column>, series: &'static Series, metrics: &[Metric]) {
    for metric in metrics {
        table.insert(
            format!("{} - {}", series.label, metric.suffix()),
            Column::Series {
                series,
                metric: *metric,
            },
        );
    }
}

/// Every built-in column keyed by its header name
pub fn builtin_columns() -> HashMap<String, Column> {
    let mut table = HashMap::new();

    for (name, field) in FIELDS {
        table.insert(name.to_string(), Column::Field(field));
    }

    let mut price_metrics = vec![Metric::Current];
    price_metrics.extend(AVERAGES);
    price_metrics.extend(EXTREMES);
    price_metrics.push(Metric::OutOfStock90);
    price_metrics.push(Metric::Stock);
    for series in PRICE_SERIES.iter() {
        insert_series(&mut table, series, &price_metrics);
    }

    let mut rank_metrics = vec![Metric::Current];
    rank_metrics.extend(AVERAGES);
    rank_metrics.extend(EXTREMES);
    rank_metrics.extend([30, 60, 90, 180, 365].map(Metric::Drops));
    insert_series(&mut table, &SALES_RANK_SERIES, &rank_metrics);

    let mut count_metrics = vec![Metric::Current];
    count_metrics.extend(AVERAGES);
    for series in OFFER_COUNT_SERIES.iter() {
        insert_series(&mut table, series, &count_metrics);
    }

    table
}

/// Flatten `field_mapping.json`: `{"Col": "stats.x[i]"}` or nested groups
pub fn flatten_mappings(value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    if let serde_json::Value::Object(map) = value {
        for (key, v) in map {
            match v {
                serde_json::Value::String(path) => out.push((key.clone(), path.clone())),
                serde_json::Value::Object(_) => flatten_mappings(v, out),
                _ => {}
            }
        }
    }
}
