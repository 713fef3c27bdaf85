use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// Rows drained from a cursor, with their shared column names.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create an empty result set for the given columns.
    #[must_use]
    pub fn with_capacity(column_names: Arc<Vec<String>>, capacity: usize) -> ResultSet {
        let column_index = Arc::new(index_columns(&column_names));
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names,
            column_index,
        }
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        self.results.push(CustomDbRow {
            column_names: Arc::clone(&self.column_names),
            rows: row_values,
            column_index_cache: Arc::clone(&self.column_index),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_lookup() {
        let mut rs = ResultSet::with_capacity(Arc::new(vec!["id".into(), "Name".into()]), 2);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("b".into())]);

        assert_eq!(rs.len(), 2);
        assert!(Arc::ptr_eq(&rs.results[0].column_names, &rs.results[1].column_names));
        assert_eq!(rs.results[1].get("Name"), Some(&RowValues::Text("b".into())));
        assert_eq!(rs.results[1].get("name"), Some(&RowValues::Text("b".into())));
        assert_eq!(rs.results[0].get_by_index(0), Some(&RowValues::Int(1)));
        assert!(rs.results[0].get("missing").is_none());
    }
}
