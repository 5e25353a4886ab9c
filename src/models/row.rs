use std::collections::HashMap;

/// Rendered value for a missing, sentinel or unparseable field
pub const MISSING: &str = "-";

/// One extracted product, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRow {
    values: HashMap<String, String>,
}

impl OutputRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    /// Value for a column, `-` when the column was never filled
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or(MISSING)
    }

    /// Values in the given column order
    pub fn ordered<'a>(&'a self, columns: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
        columns.iter().map(move |c| self.get(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_columns_are_dashes() {
        let mut row = OutputRow::new();
        row.insert("Title", "A Book");

        let columns = vec!["Title".to_string(), "Brand".to_string()];
        let values: Vec<&str> = row.ordered(&columns).collect();
        assert_eq!(values, vec!["A Book", "-"]);
    }
}
