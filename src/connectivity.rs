//! The connectivity-primitive boundary.
//!
//! These traits describe the handle-based library the adapters drive: one
//! connection handle per [`Connection`](crate::Connection), one statement
//! handle per [`Statement`](crate::Statement). Every call is synchronous and
//! the adapters never issue two calls on the same handle concurrently, so
//! implementations need no internal locking.

use crate::error::DriverError;
use crate::types::{FieldMetadata, RowValues};

/// Entry point of a connectivity library: turns a descriptor into a connection handle.
pub trait Connectivity: Send + Sync {
    /// Connect using a `KEY=value;` descriptor. The descriptor is handed over untouched.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the data source cannot be reached.
    fn connect(&self, descriptor: &str) -> Result<Box<dyn ConnectionHandle>, DriverError>;
}

/// An open connection handle.
pub trait ConnectionHandle {
    /// Prepare `sql`, returning a statement handle that borrows this connection.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the text does not prepare.
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn StatementHandle + 'c>, DriverError>;

    /// Switch autocommit mode. Turning it off starts an implicit transaction.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the mode cannot be changed.
    fn set_autocommit(&self, enabled: bool) -> Result<(), DriverError>;

    /// # Errors
    /// Returns the library's diagnostic when the commit fails.
    fn commit(&self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns the library's diagnostic when the rollback fails.
    fn rollback(&self) -> Result<(), DriverError>;

    /// Release the handle.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the disconnect fails.
    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// A prepared statement handle.
pub trait StatementHandle {
    /// Bind `args` positionally and execute. A new execute discards any pending result set.
    ///
    /// # Errors
    /// Returns the library's diagnostic when binding or execution fails, including
    /// when `args.len()` differs from the statement's parameter count.
    fn execute(&mut self, args: &[RowValues]) -> Result<(), DriverError>;

    /// Rows affected by the last execute.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the count is unavailable.
    fn rows_affected(&self) -> Result<i64, DriverError>;

    /// Number of positional parameter markers in the prepared text.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the count is unavailable.
    fn num_params(&self) -> Result<usize, DriverError>;

    /// Number of columns in the current result set.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the count is unavailable.
    fn num_fields(&self) -> Result<usize, DriverError>;

    /// Metadata of the column at `index`, counting from 1.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the index is out of range or the
    /// lookup fails.
    fn field_metadata(&self, index: usize) -> Result<FieldMetadata, DriverError>;

    /// Fetch the next row into `dest`. Returns `true` at end of data, in which case
    /// `dest` is left untouched.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the fetch fails.
    fn fetch_one(&mut self, dest: &mut [RowValues]) -> Result<bool, DriverError>;

    /// Release the handle.
    ///
    /// # Errors
    /// Returns the library's diagnostic when the release fails.
    fn close(self: Box<Self>) -> Result<(), DriverError>;
}
