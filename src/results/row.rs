use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// A row materialized from a cursor.
///
/// Column names and the name → index map are shared with every other row of the
/// same [`ResultSet`](super::ResultSet).
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl CustomDbRow {
    /// Create a standalone row, building its own column index.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        // case-insensitive fallback; drivers differ on identifier case
        self.column_names
            .iter()
            .position(|col| col.eq_ignore_ascii_case(column_name))
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }
}

/// First occurrence wins for duplicate column names.
pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    let mut map = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        map.entry(name.clone()).or_insert(i);
    }
    map
}
