// Driver module - the adapter layer between the generic API and the connectivity primitives
//
// - connection: Connection adapter (open, prepare, begin, close)
// - transaction: Transaction adapter (commit, rollback)
// - statement: Statement adapter (exec, query, num_input, close)
// - rows: Result cursor (columns, next, close)
// - result: affected-row summary of exec

pub mod connection;
pub mod result;
pub mod rows;
pub mod statement;
pub mod transaction;

use std::fmt;

pub use connection::Connection;
pub use result::ExecResult;
pub use rows::{Fetch, Rows};
pub use statement::Statement;
pub use transaction::{CommitFailed, Transaction};

use crate::connectivity::Connectivity;
use crate::error::OdbcMiddlewareError;

/// Factory the registry stores under a name: descriptor in, connection out.
pub trait Driver: Send + Sync {
    /// Open a connection for `descriptor`.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::ConnectError` if the data source cannot be reached.
    fn open(&self, descriptor: &str) -> Result<Connection, OdbcMiddlewareError>;
}

/// The adapter family's driver: opens [`Connection`]s through a connectivity library.
pub struct OdbcDriver<C> {
    connectivity: C,
    restore_autocommit: bool,
}

impl<C> fmt::Debug for OdbcDriver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcDriver")
            .field("connectivity", &std::any::type_name::<C>())
            .field("restore_autocommit", &self.restore_autocommit)
            .finish()
    }
}

impl<C: Connectivity> OdbcDriver<C> {
    #[must_use]
    pub fn new(connectivity: C) -> Self {
        Self {
            connectivity,
            restore_autocommit: false,
        }
    }

    /// Turn autocommit back on after each commit/rollback on connections this driver
    /// opens. Off by default: autocommit is left as the connectivity library leaves it.
    #[must_use]
    pub fn with_restore_autocommit(mut self, restore: bool) -> Self {
        self.restore_autocommit = restore;
        self
    }

    #[must_use]
    pub fn connectivity(&self) -> &C {
        &self.connectivity
    }
}

impl<C: Connectivity> Driver for OdbcDriver<C> {
    fn open(&self, descriptor: &str) -> Result<Connection, OdbcMiddlewareError> {
        Connection::open(&self.connectivity, descriptor)
            .map(|conn| conn.with_restore_autocommit(self.restore_autocommit))
    }
}
