//! Convenient imports for common functionality.
//!
//! Re-exports the types most callers need to open a connection, run statements
//! and read results.

pub use crate::config::{Descriptor, DescriptorBuilder};
pub use crate::connectivity::Connectivity;
pub use crate::driver::{
    CommitFailed, Connection, Driver, ExecResult, Fetch, OdbcDriver, Rows, Statement, Transaction,
};
pub use crate::error::{DriverError, OdbcMiddlewareError};
pub use crate::registry::{DRIVER_NAME, DriverRegistry};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::tx_outcome::{TxOutcome, TxState};
pub use crate::types::{FieldMetadata, RowValues, SqlType};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnectivity;
