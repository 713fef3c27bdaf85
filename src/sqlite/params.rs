use rusqlite::types::Value;

use crate::types::{RowValues, SqlType, parse_timestamp};

/// Convert a single `RowValues` to a rusqlite `Value` for binding.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

pub(crate) fn to_sqlite_values(args: &[RowValues]) -> Vec<Value> {
    args.iter().map(row_value_to_sqlite_value).collect()
}

/// Convert a fetched `SQLite` value, using the column's declared type to recover
/// booleans, timestamps and JSON that `SQLite` stores as integers or text.
///
/// Text that does not parse as the declared type is returned as text.
#[must_use]
pub fn sqlite_value_to_row_value(value: Value, declared: &SqlType) -> RowValues {
    match (value, declared) {
        (Value::Null, _) => RowValues::Null,
        (Value::Integer(i), SqlType::Boolean) => RowValues::Bool(i != 0),
        (Value::Integer(i), _) => RowValues::Int(i),
        (Value::Real(f), _) => RowValues::Float(f),
        (Value::Text(s), SqlType::Timestamp) => match parse_timestamp(&s) {
            Some(ts) => RowValues::Timestamp(ts),
            None => RowValues::Text(s),
        },
        (Value::Text(s), SqlType::Json) => match serde_json::from_str(&s) {
            Ok(json) => RowValues::JSON(json),
            Err(_) => RowValues::Text(s),
        },
        (Value::Text(s), _) => RowValues::Text(s),
        (Value::Blob(b), _) => RowValues::Blob(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn declared_types_recover_rich_values() {
        assert_eq!(
            sqlite_value_to_row_value(Value::Integer(1), &SqlType::Boolean),
            RowValues::Bool(true)
        );
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let stored = row_value_to_sqlite_value(&RowValues::Timestamp(ts));
        assert_eq!(
            sqlite_value_to_row_value(stored, &SqlType::Timestamp),
            RowValues::Timestamp(ts)
        );
        assert_eq!(
            sqlite_value_to_row_value(Value::Text(r#"{"a":1}"#.into()), &SqlType::Json),
            RowValues::JSON(json!({"a": 1}))
        );
    }

    #[test]
    fn unparseable_text_stays_text() {
        assert_eq!(
            sqlite_value_to_row_value(Value::Text("soon".into()), &SqlType::Timestamp),
            RowValues::Text("soon".into())
        );
        assert_eq!(
            sqlite_value_to_row_value(Value::Integer(7), &SqlType::Unknown),
            RowValues::Int(7)
        );
    }
}
