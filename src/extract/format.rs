//! Cell formatters. Each returns `-` for anything it cannot render.

use crate::models::MISSING;

pub fn dash() -> String {
    MISSING.to_string()
}

/// Cents to `$X.XX`; non-positive values are sentinels
pub fn price(cents: Option<i64>) -> String {
    match cents {
        Some(v) if v > 0 => format!("${:.2}", v as f64 / 100.0),
        _ => dash(),
    }
}

pub fn dollars(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Rank or count with thousands separators
pub fn count(value: Option<i64>) -> String {
    match value {
        Some(v) if v > 0 => thousands(v),
        _ => dash(),
    }
}

/// Drop counters, where zero is a real answer
pub fn drops(value: Option<i64>) -> String {
    match value {
        Some(v) if v >= 0 => v.to_string(),
        _ => dash(),
    }
}

pub fn percent(value: Option<i64>) -> String {
    match value {
        Some(v) if v >= 0 => format!("{}%", v),
        _ => dash(),
    }
}

pub fn percent_f64(value: f64) -> String {
    if value.is_finite() {
        format!("{}%", value.round() as i64)
    } else {
        dash()
    }
}

/// Keepa stores ratings ×10 (45 means 4.5 stars)
pub fn rating(value: Option<i64>) -> String {
    match value {
        Some(v) if v > 0 => format!("{:.1}", v as f64 / 10.0),
        _ => dash(),
    }
}

/// Integer with comma separators
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|c| std::str::from_utf8(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Grams to `X.XX kg`
pub fn weight_kg(grams: Option<i64>) -> String {
    match grams {
        Some(g) if g > 0 => format!("{:.2} kg", g as f64 / 1000.0),
        _ => dash(),
    }
}

/// Millimetres to `X.X cm`
pub fn dimension_cm(mm: Option<i64>) -> String {
    match mm {
        Some(v) if v > 0 => format!("{:.1} cm", v as f64 / 10.0),
        _ => dash(),
    }
}

pub fn positive_int(value: Option<i64>) -> String {
    match value {
        Some(v) if v > 0 => v.to_string(),
        _ => dash(),
    }
}

pub fn text(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => dash(),
    }
}

/// Spreadsheet-safe ASIN cell (keeps leading zeros)
pub fn asin_cell(asin: &str) -> String {
    if is_valid_asin(asin) {
        format!("=\"{}\"", asin)
    } else {
        dash()
    }
}

pub fn is_valid_asin(asin: &str) -> bool {
    asin.len() == 10 && asin.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Keepa catalog dates are integers: YYYYMMDD, YYYYMM or YYYY
pub fn catalog_date(value: Option<i64>) -> String {
    let v = match value {
        Some(v) if v > 0 => v,
        _ => return dash(),
    };
    let s = v.to_string();
    match s.len() {
        8 => format!("{}-{}-{}", &s[0..4], &s[4..6], &s[6..8]),
        6 => format!("{}-{}", &s[0..4], &s[4..6]),
        4 => s,
        _ => dash(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price() {
        assert_eq!(price(Some(1500)), "$15.00");
        assert_eq!(price(Some(1)), "$0.01");
        assert_eq!(price(Some(123456)), "$1234.56");
        assert_eq!(price(Some(0)), "-");
        assert_eq!(price(Some(-1)), "-");
        assert_eq!(price(None), "-");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(50000), "50,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-1234), "-1,234");
    }

    #[test]
    fn test_count_and_drops() {
        assert_eq!(count(Some(1500000)), "1,500,000");
        assert_eq!(count(Some(0)), "-");
        assert_eq!(drops(Some(0)), "0");
        assert_eq!(drops(Some(-1)), "-");
    }

    #[test]
    fn test_percent_and_rating() {
        assert_eq!(percent(Some(42)), "42%");
        assert_eq!(percent(Some(-1)), "-");
        assert_eq!(percent_f64(33.4), "33%");
        assert_eq!(percent_f64(f64::NAN), "-");
        assert_eq!(rating(Some(45)), "4.5");
        assert_eq!(rating(Some(-1)), "-");
    }

    #[test]
    fn test_package_units() {
        assert_eq!(weight_kg(Some(454)), "0.45 kg");
        assert_eq!(weight_kg(Some(0)), "-");
        assert_eq!(dimension_cm(Some(229)), "22.9 cm");
        assert_eq!(dimension_cm(None), "-");
    }

    #[test]
    fn test_asin_cell() {
        assert_eq!(asin_cell("0306406152"), "=\"0306406152\"");
        assert_eq!(asin_cell("B00-BAD"), "-");
        assert_eq!(asin_cell(""), "-");
        assert!(!is_valid_asin("030640615X1"));
    }

    #[test]
    fn test_catalog_date() {
        assert_eq!(catalog_date(Some(20190315)), "2019-03-15");
        assert_eq!(catalog_date(Some(201903)), "2019-03");
        assert_eq!(catalog_date(Some(2019)), "2019");
        assert_eq!(catalog_date(Some(-1)), "-");
        assert_eq!(catalog_date(Some(123)), "-");
    }
}
