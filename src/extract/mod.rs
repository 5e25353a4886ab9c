//! Product and deal JSON to formatted CSV cells.

pub mod columns;
pub mod fees;
pub mod format;
pub mod history;
pub mod keepa_time;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::models::{Deal, Extreme, OutputRow, Product, StatsPeriod};

use columns::{Column, Field, Metric, Series, StatPath, Unit};
use history::Bound;

pub use columns::{builtin_columns, flatten_mappings};

/// Maps one product (and the deal that surfaced it) to a row of cells.
///
/// Holds its own clock so a fixed product always yields the same row.
pub struct Extractor {
    columns: Vec<(String, Option<Column>)>,
    timezone: Tz,
    now: DateTime<Utc>,
}

impl Extractor {
    /// Resolve the configured column names once.
    ///
    /// `mappings` are `(column, stats path)` pairs; they take precedence over
    /// the built-in table. Names that resolve to nothing are warned about
    /// here and render `-`.
    pub fn new(
        headers: &[String],
        mappings: &[(String, String)],
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Self {
        let builtin = builtin_columns();

        let columns = headers
            .iter()
            .map(|name| {
                let mapped = mappings
                    .iter()
                    .find(|(column, _)| column == name)
                    .and_then(|(_, path)| {
                        let parsed = StatPath::parse(path);
                        if parsed.is_none() {
                            warn!("Column {:?}: unrecognised stats path {:?}", name, path);
                        }
                        parsed
                    })
                    .map(Column::Mapped);

                let column = mapped.or_else(|| builtin.get(name).copied());
                if column.is_none() {
                    warn!("Unknown column {:?}, it will always be '-'", name);
                }
                (name.clone(), column)
            })
            .collect();

        Self {
            columns,
            timezone,
            now,
        }
    }

    /// Names with no extraction rule
    pub fn unknown_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, c)| c.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn extract_row(&self, product: &Product, deal: Option<&Deal>) -> OutputRow {
        let mut row = OutputRow::new();

        for (name, column) in &self.columns {
            let value = match column {
                Some(column) => self.extract(column, product, deal),
                None => format::dash(),
            };
            debug!("{} {} = {}", product.asin, name, value);
            row.insert(name.clone(), value);
        }

        row
    }

    fn extract(&self, column: &Column, product: &Product, deal: Option<&Deal>) -> String {
        match column {
            Column::Series { series, metric } => self.series_cell(product, series, *metric),
            Column::Mapped(path) => self.mapped_cell(product, path),
            Column::Field(field) => self.field_cell(product, deal, *field),
        }
    }

    fn minutes_ago(&self, days: i64) -> i64 {
        keepa_time::from_utc(self.now - Duration::days(days))
    }

    fn render(unit: Unit, value: Option<i64>) -> String {
        match unit {
            Unit::Cents => format::price(value),
            Unit::Rank | Unit::Count => format::count(value),
            Unit::Rating => format::rating(value),
        }
    }

    fn stat(product: &Product, period: StatsPeriod, index: usize) -> Option<i64> {
        product.stats().and_then(|s| s.value(period, index))
    }

    fn series_cell(&self, product: &Product, series: &Series, metric: Metric) -> String {
        let index = series.index;
        let history = product
            .history(index)
            .map(|raw| history::points(raw, series.stride()));

        match metric {
            Metric::Current => Self::render(series.unit, Self::stat(product, StatsPeriod::Current, index)),
            Metric::Average(period) => Self::render(series.unit, Self::stat(product, period, index)),
            Metric::Average60 => {
                let now = keepa_time::from_utc(self.now);
                let value = history
                    .and_then(|pts| history::weighted_average(&pts, self.minutes_ago(60), now));
                Self::render(series.unit, value)
            }
            Metric::Lowest | Metric::Highest | Metric::Lowest365 | Metric::Highest365 => {
                let (bound, since, fallback) = match metric {
                    Metric::Lowest => (Bound::Lowest, None, Extreme::Min),
                    Metric::Highest => (Bound::Highest, None, Extreme::Max),
                    Metric::Lowest365 => (
                        Bound::Lowest,
                        Some(self.minutes_ago(365)),
                        Extreme::MinInInterval,
                    ),
                    _ => (
                        Bound::Highest,
                        Some(self.minutes_ago(365)),
                        Extreme::MaxInInterval,
                    ),
                };
                let value = match history {
                    Some(pts) => history::extreme(&pts, bound, since),
                    None => product.stats().and_then(|s| s.extreme(fallback, index)),
                };
                Self::render(series.unit, value)
            }
            Metric::OutOfStock90 => {
                format::percent(Self::stat(product, StatsPeriod::OutOfStock90, index))
            }
            Metric::Stock => self.stock_cell(product, series),
            Metric::Drops(60) => match history {
                Some(pts) => history::count_drops(&pts, self.minutes_ago(60)).to_string(),
                None => format::dash(),
            },
            Metric::Drops(days) => {
                format::drops(product.stats().and_then(|s| s.sales_rank_drops(days)))
            }
        }
    }

    /// Offers in stock for the series; `0` only when Keepa sent an offer list
    fn stock_cell(&self, product: &Product, series: &Series) -> String {
        let (filter, offers) = match (series.stock, product.offers.as_ref()) {
            (Some(filter), Some(offers)) => (filter, offers),
            _ => return format::dash(),
        };

        offers
            .iter()
            .filter(|o| filter.matches(o))
            .filter(|o| o.stock_level().unwrap_or(0) > 0)
            .count()
            .to_string()
    }

    fn mapped_cell(&self, product: &Product, path: &StatPath) -> String {
        let value = Self::stat(product, path.period, path.index);
        if path.period.is_out_of_stock() {
            format::percent(value)
        } else {
            Self::render(columns::unit_for_index(path.index), value)
        }
    }

    fn field_cell(&self, product: &Product, deal: Option<&Deal>, field: Field) -> String {
        let asin = product.asin.as_str();
        let valid_asin = format::is_valid_asin(asin);
        let current_used = Self::stat(product, StatsPeriod::Current, columns::USED);

        match field {
            Field::PriceNow => format::price(current_used),
            Field::PriceNowSource => match current_used {
                Some(price) if price > 0 => columns::USED_SOURCES
                    .iter()
                    .find(|i| Self::stat(product, StatsPeriod::Current, **i) == Some(price))
                    .and_then(|i| columns::series_by_index(*i))
                    .map(|s| s.label)
                    .unwrap_or("Used")
                    .to_string(),
                _ => format::dash(),
            },
            Field::AvgPrice90 => {
                format::price(Self::stat(product, StatsPeriod::Avg90, columns::USED))
            }
            Field::AvgPrice365 => {
                format::price(Self::stat(product, StatsPeriod::Avg365, columns::USED))
            }
            Field::PercentDown90 => Self::percent_down(product, StatsPeriod::Avg90),
            Field::PercentDown365 => Self::percent_down(product, StatsPeriod::Avg365),
            Field::DealFound => self.datetime(deal.and_then(|d| d.creation_date)),
            Field::LastUpdate => self.datetime(
                deal.and_then(|d| d.last_update)
                    .filter(|m| *m > 0)
                    .or(product.last_update),
            ),
            Field::LastPriceChange => self.datetime(
                deal.and_then(|d| d.current_since(columns::USED))
                    .filter(|m| *m > 0)
                    .or(product.last_price_change),
            ),
            Field::AmzLink if valid_asin => format!("https://www.amazon.com/dp/{}", asin),
            Field::KeepaLink if valid_asin => format!("https://keepa.com/#!product/1-{}", asin),
            Field::AmzLink | Field::KeepaLink => format::dash(),
            Field::Asin => format::asin_cell(asin),
            Field::Title => format::text(
                product
                    .title
                    .as_deref()
                    .or_else(|| deal.and_then(|d| d.title.as_deref())),
            ),
            Field::SalesRankReference => match product.sales_rank_reference {
                Some(id) if id > 0 => format!("https://www.amazon.com/b/?node={}", id),
                _ => format::dash(),
            },
            Field::ReviewsRating => {
                format::rating(Self::stat(product, StatsPeriod::Current, columns::RATING))
            }
            Field::ReviewCount => {
                format::count(Self::stat(product, StatsPeriod::Current, columns::COUNT_REVIEWS))
            }
            Field::FbaFee => fees::fba_fee(product)
                .map(|fee| format::dollars(fee.total()))
                .unwrap_or_else(format::dash),
            Field::ReferralFee => {
                if valid_asin && !product.is_placeholder {
                    fees::referral_fee(product).to_string()
                } else {
                    format::dash()
                }
            }
            Field::TrackingSince => self.date(product.tracking_since),
            Field::ListedSince => self.date(product.listed_since),
            Field::CategoriesRoot => {
                format::text(product.category_tree.first().map(|c| c.name.as_str()))
            }
            Field::CategoriesSub => join_or_dash(
                product.category_tree.iter().skip(1).map(|c| c.name.clone()),
                ", ",
            ),
            Field::CategoriesTree => {
                join_or_dash(product.category_tree.iter().map(|c| c.name.clone()), " > ")
            }
            Field::FreqBoughtTogether => join_or_dash(
                product
                    .frequently_bought_together
                    .iter()
                    .map(|a| format!("https://keepa.com/#!product/1-{}", a)),
                ", ",
            ),
            Field::Type => match (product.kind.as_deref(), product.product_type) {
                (Some(kind), _) if !kind.is_empty() => kind.to_string(),
                (_, Some(code)) => product_type_name(code).to_string(),
                _ => format::dash(),
            },
            Field::VariationAttributes => join_or_dash(
                product
                    .variations
                    .iter()
                    .filter(|v| v.asin == product.asin)
                    .flat_map(|v| v.attributes.iter())
                    .map(|a| format!("{}: {}", a.dimension, a.value)),
                ", ",
            ),
            Field::Contributors => join_or_dash(
                product.contributors.iter().filter_map(|c| match c.as_slice() {
                    [name, role, ..] => Some(format!("{} ({})", name, role)),
                    [name] => Some(name.clone()),
                    [] => None,
                }),
                ", ",
            ),
            Field::Languages => join_or_dash(
                product.languages.iter().filter_map(|l| match l.split_first() {
                    Some((lang, kinds)) if !kinds.is_empty() => {
                        Some(format!("{} ({})", lang, kinds.join(", ")))
                    }
                    Some((lang, _)) => Some(lang.clone()),
                    None => None,
                }),
                ", ",
            ),
            Field::Manufacturer => format::text(product.manufacturer.as_deref()),
            Field::Brand => format::text(product.brand.as_deref()),
            Field::ProductGroup => format::text(product.product_group.as_deref()),
            Field::ItemType => format::text(product.item_type_keyword.as_deref()),
            Field::Author => format::text(product.author.as_deref()),
            Field::Binding => format::text(product.binding.as_deref()),
            Field::Edition => format::text(product.edition.as_deref()),
            Field::Format => format::text(product.format.as_deref()),
            Field::NumberOfItems => format::positive_int(product.number_of_items),
            Field::NumberOfPages => format::positive_int(product.number_of_pages),
            Field::PackageQuantity => format::positive_int(product.package_quantity),
            Field::PublicationDate => format::catalog_date(product.publication_date),
            Field::ReleaseDate => format::catalog_date(product.release_date),
            Field::PackageWeight => format::weight_kg(product.package_weight),
            Field::PackageHeight => format::dimension_cm(product.package_height),
            Field::PackageLength => format::dimension_cm(product.package_length),
            Field::PackageWidth => format::dimension_cm(product.package_width),
        }
    }

    fn percent_down(product: &Product, period: StatsPeriod) -> String {
        let avg = Self::stat(product, period, columns::USED);
        let current = Self::stat(product, StatsPeriod::Current, columns::USED);
        match (avg, current) {
            (Some(avg), Some(current)) if avg > 0 && current > 0 => {
                format::percent_f64((avg - current) as f64 / avg as f64 * 100.0)
            }
            _ => format::dash(),
        }
    }

    fn date(&self, minutes: Option<i64>) -> String {
        minutes
            .and_then(|m| keepa_time::format_date(m, self.timezone))
            .unwrap_or_else(format::dash)
    }

    fn datetime(&self, minutes: Option<i64>) -> String {
        minutes
            .and_then(|m| keepa_time::format_datetime(m, self.timezone))
            .unwrap_or_else(format::dash)
    }
}

fn join_or_dash(parts: impl Iterator<Item = String>, sep: &str) -> String {
    let parts: Vec<String> = parts.filter(|p| !p.trim().is_empty()).collect();
    if parts.is_empty() {
        format::dash()
    } else {
        parts.join(sep)
    }
}

/// Keepa `productType` codes
fn product_type_name(code: i64) -> &'static str {
    match code {
        0 => "STANDARD",
        1 => "DOWNLOADABLE",
        2 => "EBOOK",
        3 => "INACCESSIBLE",
        4 => "INVALID",
        5 => "VARIATION_PARENT",
        _ => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryNode, Offer, OfferCondition, Stats};

    fn utc() -> Tz {
        Tz::UTC
    }

    fn fixed_now() -> DateTime<Utc> {
        // Keepa minute 7,000,000
        keepa_time::to_utc(7_000_000).unwrap()
    }

    fn extractor(headers: &[&str]) -> Extractor {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        Extractor::new(&headers, &[], utc(), fixed_now())
    }

    fn book() -> Product {
        let mut current = vec![Some(-1); 33];
        current[columns::AMAZON] = Some(1000);
        current[columns::NEW] = Some(1200);
        current[columns::USED] = Some(1500);
        current[columns::SALES_RANK] = Some(50000);
        current[columns::RATING] = Some(45);
        current[columns::COUNT_REVIEWS] = Some(1234);
        current[columns::USED_GOOD] = Some(1500);

        let mut avg90 = vec![None; 33];
        avg90[columns::USED] = Some(3000);

        let mut csv = vec![None; 33];
        // Used: 2000 until 30 days ago, 1500 since
        let now = 7_000_000;
        let day = 24 * 60;
        csv[columns::USED] = Some(vec![now - 400 * day, 900, now - 90 * day, 2000, now - 30 * day, 1500]);
        csv[columns::SALES_RANK] = Some(vec![
            now - 100 * day, 90000,
            now - 70 * day, 70000,
            now - 40 * day, 80000,
            now - 10 * day, 60000,
        ]);

        Product {
            asin: "0306406152".to_string(),
            title: Some("A Book".to_string()),
            kind: Some("ABIS_BOOK".to_string()),
            binding: Some("Paperback".to_string()),
            stats: Some(Stats {
                current,
                avg90,
                min: vec![None, None, Some(vec![1, 800])],
                sales_rank_drops30: Some(0),
                ..Default::default()
            }),
            csv,
            offers: Some(vec![
                Offer {
                    condition: OfferCondition::UsedGood,
                    stock: Some(2),
                    ..Default::default()
                },
                Offer {
                    condition: OfferCondition::UsedLikeNew,
                    stock: Some(0),
                    ..Default::default()
                },
            ]),
            category_tree: vec![
                CategoryNode { cat_id: Some(283155), name: "Books".to_string() },
                CategoryNode { cat_id: Some(1), name: "Science".to_string() },
                CategoryNode { cat_id: Some(2), name: "Physics".to_string() },
            ],
            tracking_since: Some(1440),
            contributors: vec![vec!["Jane Doe".to_string(), "author".to_string()]],
            publication_date: Some(20190315),
            package_weight: Some(400),
            ..Default::default()
        }
    }

    #[test]
    fn test_used_current_from_index_two() {
        let row = extractor(&["Used - Current"]).extract_row(&book(), None);
        assert_eq!(row.get("Used - Current"), "$15.00");
    }

    #[test]
    fn test_sentinels_render_dash() {
        let ex = extractor(&["Buy Box - Current", "List Price - 90 days avg.", "Price Now"]);
        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Buy Box - Current"), "-");
        assert_eq!(row.get("List Price - 90 days avg."), "-");
        assert_eq!(row.get("Price Now"), "$15.00");
    }

    #[test]
    fn test_placeholder_row_is_all_dashes_except_identity() {
        let headers: Vec<&str> = vec![
            "Used - Current",
            "Sales Rank - Current",
            "Used - Lowest",
            "Used - Stock",
            "Percent Down 90",
            "Title",
            "Referral Fee %",
            "FBA Pick&Pack Fee",
            "ASIN",
        ];
        let row = extractor(&headers).extract_row(&Product::placeholder("0306406152"), None);
        for h in &headers[..headers.len() - 1] {
            assert_eq!(row.get(h), "-", "{}", h);
        }
        assert_eq!(row.get("ASIN"), "=\"0306406152\"");
    }

    #[test]
    fn test_rank_rating_and_counts() {
        let ex = extractor(&[
            "Sales Rank - Current",
            "Reviews - Rating",
            "Reviews - Review Count",
            "Sales Rank - Drops last 30 days",
            "Sales Rank - Drops last 60 days",
            "Sales Rank - Drops last 90 days",
        ]);
        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Sales Rank - Current"), "50,000");
        assert_eq!(row.get("Reviews - Rating"), "4.5");
        assert_eq!(row.get("Reviews - Review Count"), "1,234");
        assert_eq!(row.get("Sales Rank - Drops last 30 days"), "0");
        // 80000 -> 60000 ten days ago; the 90000 -> 70000 drop is older than 60 days
        assert_eq!(row.get("Sales Rank - Drops last 60 days"), "1");
        assert_eq!(row.get("Sales Rank - Drops last 90 days"), "-");
    }

    #[test]
    fn test_history_derived_columns() {
        let ex = extractor(&[
            "Used - 60 days avg.",
            "Used - Lowest",
            "Used - Lowest 365 days",
            "Used - Highest 365 days",
            "Amazon - Lowest",
        ]);
        let row = ex.extract_row(&book(), None);
        // 30 days at 2000, 30 days at 1500
        assert_eq!(row.get("Used - 60 days avg."), "$17.50");
        assert_eq!(row.get("Used - Lowest"), "$9.00");
        assert_eq!(row.get("Used - Lowest 365 days"), "$15.00");
        assert_eq!(row.get("Used - Highest 365 days"), "$20.00");
        // No Amazon history and no stats.min entry
        assert_eq!(row.get("Amazon - Lowest"), "-");
    }

    #[test]
    fn test_lowest_falls_back_to_stats_min() {
        let mut product = book();
        product.csv.clear();
        let row = extractor(&["Used - Lowest"]).extract_row(&product, None);
        assert_eq!(row.get("Used - Lowest"), "$8.00");
    }

    #[test]
    fn test_derived_price_columns() {
        let ex = extractor(&["Percent Down 90", "Avg. Price 90", "Price Now Source", "Percent Down 365"]);
        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Percent Down 90"), "50%");
        assert_eq!(row.get("Avg. Price 90"), "$30.00");
        assert_eq!(row.get("Price Now Source"), "Used, good");
        assert_eq!(row.get("Percent Down 365"), "-");
    }

    #[test]
    fn test_stock_counts() {
        let ex = extractor(&["Used - Stock", "Used, like new - Stock", "List Price - Stock"]);
        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Used - Stock"), "1");
        assert_eq!(row.get("Used, like new - Stock"), "0");
        assert_eq!(row.get("List Price - Stock"), "-");

        let mut no_offers = book();
        no_offers.offers = None;
        let row = ex.extract_row(&no_offers, None);
        assert_eq!(row.get("Used - Stock"), "-");
    }

    #[test]
    fn test_deal_timestamps_with_fallback() {
        let ex = extractor(&["Deal found", "last update", "last price change", "Tracking since"]);
        let deal = Deal {
            asin: "0306406152".to_string(),
            creation_date: Some(60),
            last_update: Some(-1),
            current_since: vec![None, None, Some(120)],
            ..Default::default()
        };
        let mut product = book();
        product.last_update = Some(180);

        let row = ex.extract_row(&product, Some(&deal));
        assert_eq!(row.get("Deal found"), "2011-01-01 01:00:00");
        assert_eq!(row.get("last update"), "2011-01-01 03:00:00");
        assert_eq!(row.get("last price change"), "2011-01-01 02:00:00");
        assert_eq!(row.get("Tracking since"), "2011-01-02");

        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Deal found"), "-");
        assert_eq!(row.get("last update"), "-");
    }

    #[test]
    fn test_catalog_fields() {
        let ex = extractor(&[
            "Categories - Root",
            "Categories - Sub",
            "Categories - Tree",
            "Contributors",
            "Publication Date",
            "Package Weight",
            "FBA Pick&Pack Fee",
            "Referral Fee %",
            "AMZ link",
            "Type",
            "Brand",
        ]);
        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Categories - Root"), "Books");
        assert_eq!(row.get("Categories - Sub"), "Science, Physics");
        assert_eq!(row.get("Categories - Tree"), "Books > Science > Physics");
        assert_eq!(row.get("Contributors"), "Jane Doe (author)");
        assert_eq!(row.get("Publication Date"), "2019-03-15");
        assert_eq!(row.get("Package Weight"), "0.40 kg");
        assert_eq!(row.get("FBA Pick&Pack Fee"), "$3.53");
        assert_eq!(row.get("Referral Fee %"), "15.00%");
        assert_eq!(row.get("AMZ link"), "https://www.amazon.com/dp/0306406152");
        assert_eq!(row.get("Type"), "ABIS_BOOK");
        assert_eq!(row.get("Brand"), "-");
    }

    #[test]
    fn test_mappings_override_and_unknown_columns() {
        let headers = vec![
            "Used - Current".to_string(),
            "My Rank".to_string(),
            "Mystery".to_string(),
        ];
        let mappings = vec![
            ("Used - Current".to_string(), "stats.current[1]".to_string()),
            ("My Rank".to_string(), "stats.current[3]".to_string()),
        ];
        let ex = Extractor::new(&headers, &mappings, utc(), fixed_now());
        assert_eq!(ex.unknown_columns(), vec!["Mystery"]);

        let row = ex.extract_row(&book(), None);
        assert_eq!(row.get("Used - Current"), "$12.00");
        assert_eq!(row.get("My Rank"), "50,000");
        assert_eq!(row.get("Mystery"), "-");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let ex = extractor(&["Used - 60 days avg.", "Sales Rank - Drops last 60 days", "Title"]);
        let product = book();
        assert_eq!(ex.extract_row(&product, None), ex.extract_row(&product, None));
    }
}
