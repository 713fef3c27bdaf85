use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::connectivity::StatementHandle;
use crate::error::OdbcMiddlewareError;
use crate::types::{FieldMetadata, RowValues};

use super::result::ExecResult;
use super::rows::Rows;

/// Statement adapter owning one prepared-statement handle.
///
/// A statement can be executed any number of times; every call rebinds all
/// parameters. [`query`](Statement::query) hands out a [`Rows`] cursor that
/// mutably borrows the statement, so a new execution cannot start while a cursor
/// is alive and the previous cursor is gone by the time it does.
pub struct Statement<'c> {
    handle: Option<Box<dyn StatementHandle + 'c>>,
    sql: Arc<str>,
}

impl fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("handle", &self.handle.as_ref().map(|_| "<StatementHandle>"))
            .field("sql", &self.sql)
            .finish()
    }
}

impl<'c> Statement<'c> {
    pub(crate) fn new(handle: Box<dyn StatementHandle + 'c>, sql: &str) -> Self {
        Self {
            handle: Some(handle),
            sql: Arc::from(sql),
        }
    }

    pub(crate) fn handle(&self) -> Result<&(dyn StatementHandle + 'c), OdbcMiddlewareError> {
        self.handle
            .as_deref()
            .ok_or(OdbcMiddlewareError::StatementClosed)
    }

    pub(crate) fn handle_mut(
        &mut self,
    ) -> Result<&mut (dyn StatementHandle + 'c), OdbcMiddlewareError> {
        self.handle
            .as_deref_mut()
            .ok_or(OdbcMiddlewareError::StatementClosed)
    }

    /// Bind `args` positionally, execute, and report the affected-row count.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::ExecError` if binding, execution or the
    /// rows-affected lookup fails, and `StatementClosed` after [`close`](Statement::close).
    pub fn exec(&mut self, args: &[RowValues]) -> Result<ExecResult, OdbcMiddlewareError> {
        let handle = self.handle_mut()?;
        handle
            .execute(args)
            .map_err(OdbcMiddlewareError::ExecError)?;
        let rows_affected = handle
            .rows_affected()
            .map_err(OdbcMiddlewareError::ExecError)?;
        debug!(sql = %self.sql, rows_affected, "statement executed");
        Ok(ExecResult::new(rows_affected))
    }

    /// Bind `args` positionally, execute, and return a cursor over the result set.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::QueryError` if binding or execution fails, and
    /// `StatementClosed` after [`close`](Statement::close).
    pub fn query(&mut self, args: &[RowValues]) -> Result<Rows<'_, 'c>, OdbcMiddlewareError> {
        self.handle_mut()?
            .execute(args)
            .map_err(OdbcMiddlewareError::QueryError)?;
        debug!(sql = %self.sql, "query executed");
        Ok(Rows::new(self))
    }

    /// Number of positional parameters the statement expects.
    ///
    /// `None` when the statement is closed or the driver cannot report the count.
    #[must_use]
    pub fn num_input(&self) -> Option<usize> {
        let handle = self.handle.as_deref()?;
        match handle.num_params() {
            Ok(count) => Some(count),
            Err(err) => {
                debug!(error = %err, "parameter count unavailable");
                None
            }
        }
    }

    /// Metadata of every result column, in order.
    pub(crate) fn field_metadata(&self) -> Result<Vec<FieldMetadata>, OdbcMiddlewareError> {
        let handle = self.handle()?;
        let count = handle
            .num_fields()
            .map_err(OdbcMiddlewareError::MetadataUnavailable)?;
        (1..=count)
            .map(|idx| {
                handle
                    .field_metadata(idx)
                    .map_err(OdbcMiddlewareError::MetadataUnavailable)
            })
            .collect()
    }

    /// The SQL text this statement was prepared from.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Release the statement handle.
    ///
    /// Always succeeds. A failure of the release primitive is logged; closing twice
    /// is a no-op.
    ///
    /// # Errors
    /// None today; the `Result` keeps the generic close contract.
    pub fn close(&mut self) -> Result<(), OdbcMiddlewareError> {
        if let Some(handle) = self.handle.take() {
            debug!(sql = %self.sql, "closing statement");
            if let Err(err) = handle.close() {
                warn!(sql = %self.sql, error = %err, "statement close reported an error");
            }
        }
        Ok(())
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
