//! Amazon fee estimates (2025 US rates).

use tracing::{debug, warn};

use crate::models::Product;

const GRAMS_PER_LB: f64 = 453.592_37;
const MM_PER_INCH: f64 = 25.4;
const DIM_WEIGHT_DIVISOR: f64 = 139.0;
const MEDIA_CLOSING_FEE: f64 = 1.80;
const MEDIA_BINDINGS: [&str; 3] = ["Audio CD", "DVD", "Vinyl"];

/// Keepa root category for Books
pub const BOOKS_ROOT_CATEGORY: i64 = 283155;

pub const REFERRAL_FEE: &str = "15.00%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    SmallStandard,
    SmallStandardHeavy,
    LargeStandard,
    LargeStandardHeavy,
    Oversize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FbaFee {
    pub tier: SizeTier,
    pub base: f64,
    pub closing: f64,
}

impl FbaFee {
    pub fn total(&self) -> f64 {
        self.base + self.closing
    }
}

fn is_media(binding: Option<&str>) -> bool {
    binding.map(|b| MEDIA_BINDINGS.contains(&b)).unwrap_or(false)
}

/// Pick & pack fee, `None` when the package weight is unknown
pub fn fba_fee(product: &Product) -> Option<FbaFee> {
    let weight_g = product.package_weight.filter(|w| *w > 0)?;
    let weight_lb = weight_g as f64 / GRAMS_PER_LB;

    let mut dims_in: Vec<f64> = [
        product.package_height,
        product.package_length,
        product.package_width,
    ]
    .iter()
    .map(|d| d.unwrap_or(0).max(0) as f64 / MM_PER_INCH)
    .collect();
    dims_in.sort_by(|a, b| a.total_cmp(b));

    let dim_weight_lb = dims_in.iter().product::<f64>() / DIM_WEIGHT_DIVISOR;
    let effective_lb = weight_lb.max(dim_weight_lb);

    let (shortest, median, longest) = (dims_in[0], dims_in[1], dims_in[2]);
    let standard = longest <= 18.0 && median <= 14.0 && shortest <= 8.0 && effective_lb <= 20.0;

    let (tier, base) = if !standard {
        (SizeTier::Oversize, 10.53)
    } else if effective_lb <= 0.25 {
        (SizeTier::SmallStandard, 3.15)
    } else if effective_lb <= 1.0 {
        (SizeTier::SmallStandardHeavy, 3.53)
    } else if effective_lb <= 3.0 {
        (SizeTier::LargeStandard, 6.21)
    } else {
        (
            SizeTier::LargeStandardHeavy,
            7.45 + (effective_lb - 3.0) * 0.15,
        )
    };

    let closing = if is_media(product.binding.as_deref()) {
        MEDIA_CLOSING_FEE
    } else {
        0.0
    };

    debug!(
        asin = %product.asin,
        weight_lb,
        dim_weight_lb,
        ?tier,
        base,
        closing,
        "FBA fee"
    );

    Some(FbaFee {
        tier,
        base,
        closing,
    })
}

pub fn is_book(product: &Product) -> bool {
    product.kind.as_deref() == Some("ABIS_BOOK")
        || product.root_category == Some(BOOKS_ROOT_CATEGORY)
}

/// Flat book referral rate; anything else is flagged for review
pub fn referral_fee(product: &Product) -> &'static str {
    if !is_book(product) || is_media(product.binding.as_deref()) {
        warn!(
            "ASIN {}: non-book binding ({}), verify referral category",
            product.asin,
            product.binding.as_deref().unwrap_or("-")
        );
    }
    REFERRAL_FEE
}
