//! Helper utilities for testing code built on the adapters.

mod scripted;

use std::sync::Arc;

pub use scripted::{Call, Fault, ScriptedConnectivity, ScriptedResult};

use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: Vec<String>, values: Vec<RowValues>) -> CustomDbRow {
    CustomDbRow::new(Arc::new(column_names), values)
}

/// Text values for a single-column row.
#[must_use]
pub fn text_row(value: &str) -> Vec<RowValues> {
    vec![RowValues::Text(value.to_string())]
}
