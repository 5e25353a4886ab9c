use serde::{Deserialize, Serialize};

use crate::models::lenient::lenient;

/// A candidate deal from the Keepa `/deal` endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    #[serde(default, deserialize_with = "lenient")]
    pub asin: String,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    /// Keepa minutes when the deal was first seen
    #[serde(default, deserialize_with = "lenient")]
    pub creation_date: Option<i64>,

    /// Keepa minutes of the last deal refresh
    #[serde(default, deserialize_with = "lenient")]
    pub last_update: Option<i64>,

    /// Current price per price type
    #[serde(default, deserialize_with = "lenient")]
    pub current: Vec<Option<i64>>,

    /// Keepa minutes since each `current` value has held
    #[serde(default, deserialize_with = "lenient")]
    pub current_since: Vec<Option<i64>>,
}

impl Deal {
    pub fn current_since(&self, price_type: usize) -> Option<i64> {
        self.current_since.get(price_type).copied().flatten()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DealsPage {
    #[serde(default, deserialize_with = "lenient")]
    pub dr: Vec<Deal>,
}

/// Envelope of the `/deal` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub deals: Option<DealsPage>,

    #[serde(default, deserialize_with = "lenient")]
    pub tokens_left: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub refill_in: Option<i64>,
}

impl DealResponse {
    pub fn into_deals(self) -> Vec<Deal> {
        self.deals.map(|page| page.dr).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deal_response() {
        let json = r#"{
            "deals": {"dr": [
                {"asin": "0306406152", "title": "Deal", "rootCat": 283155, "creationDate": 7000000,
                 "lastUpdate": 7000100, "current": [-1, 2000, 1500],
                 "currentSince": [null, 6999000, 6999500]},
                {"asin": "B000000001", "current": null}
            ]},
            "tokensLeft": 250
        }"#;

        let response: DealResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tokens_left, Some(250));

        let deals = response.into_deals();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].creation_date, Some(7000000));
        assert_eq!(deals[0].current_since(2), Some(6999500));
        assert_eq!(deals[0].current_since(0), None);
        assert!(deals[1].current.is_empty());
    }

    #[test]
    fn test_missing_deals_block_is_empty() {
        let response: DealResponse = serde_json::from_str(r#"{"deals": null}"#).unwrap();
        assert!(response.into_deals().is_empty());
    }
}
