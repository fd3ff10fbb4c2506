//! Column lookup by normalized name.

use std::collections::HashMap;

use crate::error::{CsvxError, Result};

/// Normalizes a column name for loose comparison: trimmed, lower-cased, and
/// with spaces folded into underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Finds the index of each requested name in `row`.
///
/// Cells are trimmed and compared case-insensitively with space and
/// underscore treated as equal. The first matching cell wins. Every name
/// that matches nothing is reported in a single
/// [`CsvxError::MissingColumns`].
pub fn find_columns<S, N>(row: &[S], names: &[N]) -> Result<HashMap<String, usize>>
where
    S: AsRef<str>,
    N: AsRef<str>,
{
    let normalized: Vec<String> = row
        .iter()
        .map(|cell| normalize_column_name(cell.as_ref()))
        .collect();

    let mut found = HashMap::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        let name = name.as_ref();
        let wanted = normalize_column_name(name);
        match normalized.iter().position(|cell| *cell == wanted) {
            Some(index) => {
                found.insert(name.to_string(), index);
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(CsvxError::MissingColumns { names: missing });
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name(" Customer Name "), "customer_name");
        assert_eq!(normalize_column_name("ORDER_ID"), "order_id");
    }

    #[test]
    fn test_find_columns_normalized() {
        let row = ["Order Id", " Customer Name "];
        let found = find_columns(&row, &["order_id", "customer_name"]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["order_id"], 0);
        assert_eq!(found["customer_name"], 1);
    }

    #[test]
    fn test_find_columns_keeps_requested_spelling() {
        let row = ["order_id"];
        let found = find_columns(&row, &["Order ID"]).unwrap();
        assert_eq!(found.get("Order ID"), Some(&0));
    }

    #[test]
    fn test_find_columns_first_match_wins() {
        let row = ["id", "ID", "Id"];
        let found = find_columns(&row, &["id"]).unwrap();
        assert_eq!(found["id"], 0);
    }

    #[test]
    fn test_find_columns_reports_all_missing() {
        let row = ["Order Id", "Customer Name"];
        let err = find_columns(&row, &["total", "order_id", "tax"]).unwrap_err();
        match err {
            CsvxError::MissingColumns { names } => assert_eq!(names, vec!["total", "tax"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_columns_empty_request() {
        let row = ["a"];
        let found = find_columns::<_, &str>(&row, &[]).unwrap();
        assert!(found.is_empty());
    }
}
