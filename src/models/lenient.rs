//! Field-level tolerant decoding for Keepa payloads.
//!
//! Keepa returns `null` for many arrays and occasionally changes the shape
//! of rarely used fields. A field decoded with [`lenient`] falls back to
//! its `Default` instead of failing the whole product.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient")]
        values: Vec<Option<i64>>,
        #[serde(default, deserialize_with = "lenient")]
        name: Option<String>,
    }

    #[test]
    fn test_null_becomes_default() {
        let sample: Sample = serde_json::from_str(r#"{"values": null, "name": null}"#).unwrap();
        assert!(sample.values.is_empty());
        assert!(sample.name.is_none());
    }

    #[test]
    fn test_wrong_type_becomes_default() {
        let sample: Sample =
            serde_json::from_str(r#"{"values": "oops", "name": 42}"#).unwrap();
        assert!(sample.values.is_empty());
        assert!(sample.name.is_none());
    }

    #[test]
    fn test_valid_values_pass_through() {
        let sample: Sample =
            serde_json::from_str(r#"{"values": [1, null, -1], "name": "x"}"#).unwrap();
        assert_eq!(sample.values, vec![Some(1), None, Some(-1)]);
        assert_eq!(sample.name.as_deref(), Some("x"));
    }
}
