//! Synchronous adapters that expose a generic database API
//! (open / prepare / begin / exec / query / scan) on top of a handle-based,
//! ODBC-style connectivity library.
//!
//! The connectivity library is anything implementing [`Connectivity`]; an
//! embedded `SQLite` implementation ships behind the `sqlite` feature. Drivers
//! are registered by name in a [`DriverRegistry`] and opened with a
//! `KEY=value;` descriptor that is passed through untouched.
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), odbc_middleware::OdbcMiddlewareError> {
//! use odbc_middleware::prelude::*;
//! use odbc_middleware::sqlite::SqliteConnectivity;
//!
//! let driver = OdbcDriver::new(SqliteConnectivity::new());
//! let conn = driver.open("Database=:memory:")?;
//! conn.prepare("CREATE TABLE t (name TEXT)")?.exec(&[])?;
//!
//! let mut insert = conn.prepare("INSERT INTO t (name) VALUES (?)")?;
//! assert_eq!(insert.num_input(), Some(1));
//! insert.exec(&[RowValues::Text("a".into())])?;
//!
//! let mut select = conn.prepare("SELECT name FROM t")?;
//! let mut rows = select.query(&[])?;
//! assert_eq!(rows.columns(), vec!["name".to_string()]);
//! let mut buf = vec![RowValues::Null; 1];
//! assert_eq!(rows.next(&mut buf)?, Fetch::Row);
//! assert_eq!(rows.next(&mut buf)?, Fetch::Exhausted);
//! rows.close()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

pub mod config;
pub mod connectivity;
pub mod driver;
pub mod error;
pub mod placeholders;
pub mod prelude;
pub mod registry;
pub mod results;
pub mod tx_outcome;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Descriptor, DescriptorBuilder};
pub use connectivity::{ConnectionHandle, Connectivity, StatementHandle};
pub use driver::{
    CommitFailed, Connection, Driver, ExecResult, Fetch, OdbcDriver, Rows, Statement, Transaction,
};
pub use error::{DriverError, OdbcMiddlewareError};
pub use registry::{DRIVER_NAME, DriverRegistry};
pub use results::{CustomDbRow, ResultSet};
pub use tx_outcome::{TxOutcome, TxState};
pub use types::{FieldMetadata, RowValues, SqlType};
