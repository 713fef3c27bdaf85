use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be bound as statement parameters or fetched into a row buffer.
///
/// The same enum is used in both directions so callers never touch driver types:
/// ```rust
/// use odbc_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    #[default]
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            return parse_timestamp(s);
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Parse the timestamp renderings drivers commonly hand back as text.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// SQL data type of a result column, as reported by field metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
    Timestamp,
    Json,
    /// The driver reported a type this layer has no mapping for.
    Other(String),
    /// The driver did not report a type (expressions, untyped columns).
    Unknown,
}

impl SqlType {
    /// Map a declared column type name onto a `SqlType`.
    ///
    /// Follows the usual affinity rules: anything containing `INT` is an integer,
    /// `CHAR`/`CLOB`/`TEXT` are text, and so on. Names that match nothing are kept
    /// verbatim in [`SqlType::Other`].
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return SqlType::Unknown;
        }
        if upper.starts_with("BOOL") || upper == "BIT" {
            SqlType::Boolean
        } else if upper.contains("INT") {
            SqlType::Integer
        } else if upper.contains("JSON") {
            SqlType::Json
        } else if upper.contains("DATE") || upper.contains("TIME") {
            SqlType::Timestamp
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            SqlType::Text
        } else if upper.contains("BLOB") || upper.contains("BINARY") {
            SqlType::Blob
        } else if upper.contains("REAL")
            || upper.contains("FLOA")
            || upper.contains("DOUB")
            || upper.contains("NUMERIC")
            || upper.contains("DECIMAL")
        {
            SqlType::Real
        } else {
            SqlType::Other(name.trim().to_string())
        }
    }
}

/// Description of one result column, as returned by the field-metadata primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    pub sql_type: SqlType,
}

impl FieldMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}
