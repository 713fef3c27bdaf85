use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::OdbcMiddlewareError;
use crate::results::ResultSet;
use crate::types::{FieldMetadata, RowValues};

use super::statement::Statement;

/// Outcome of a single [`Rows::next`] call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// A row was written into the buffer.
    Row,
    /// No more rows; the buffer was not touched.
    Exhausted,
}

impl Fetch {
    #[must_use]
    pub fn is_exhausted(self) -> bool {
        matches!(self, Fetch::Exhausted)
    }
}

/// Cursor over the most recent execution of a [`Statement`].
///
/// Holds a mutable borrow of its statement: metadata and fetches go through the
/// statement's handle, and only one cursor can exist per statement.
/// [`close`](Rows::close) closes the statement as well. Dropping the cursor instead
/// leaves the statement open for another execution.
///
/// ```rust
/// # use odbc_middleware::prelude::*;
/// # fn demo(conn: &Connection) -> Result<(), OdbcMiddlewareError> {
/// let mut stmt = conn.prepare("select name from t")?;
/// let mut rows = stmt.query(&[])?;
/// let mut buf = vec![RowValues::Null; rows.columns().len()];
/// while rows.next(&mut buf)? == Fetch::Row {
///     println!("{:?}", buf[0]);
/// }
/// rows.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Rows<'s, 'c> {
    stmt: &'s mut Statement<'c>,
    exhausted: bool,
    width: Option<usize>,
    fetched: usize,
}

impl<'s, 'c> Rows<'s, 'c> {
    pub(crate) fn new(stmt: &'s mut Statement<'c>) -> Self {
        Self {
            stmt,
            exhausted: false,
            width: None,
            fetched: 0,
        }
    }

    /// Column names, or an empty list if any metadata lookup fails.
    ///
    /// An empty result is ambiguous (no columns, or metadata unavailable); use
    /// [`try_columns`](Rows::try_columns) when the difference matters.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        match self.try_columns() {
            Ok(columns) => columns,
            Err(err) => {
                debug!(error = %err, "column metadata unavailable; reporting no columns");
                Vec::new()
            }
        }
    }

    /// Column names in result order.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::MetadataUnavailable` if the field count or any
    /// field lookup fails.
    pub fn try_columns(&self) -> Result<Vec<String>, OdbcMiddlewareError> {
        Ok(self
            .column_metadata()?
            .into_iter()
            .map(|field| field.name)
            .collect())
    }

    /// Full metadata (name and SQL type) of every column.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::MetadataUnavailable` if any lookup fails.
    pub fn column_metadata(&self) -> Result<Vec<FieldMetadata>, OdbcMiddlewareError> {
        self.stmt.field_metadata()
    }

    /// Fetch one row into `dest`, which must have one slot per column.
    ///
    /// Returns [`Fetch::Exhausted`] once the result set runs out. The cursor is fused
    /// from then on: further calls return `Exhausted` without reaching the driver.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::FetchError` if the fetch primitive fails.
    pub fn next(&mut self, dest: &mut [RowValues]) -> Result<Fetch, OdbcMiddlewareError> {
        if self.exhausted {
            return Ok(Fetch::Exhausted);
        }
        let end_of_data = self
            .stmt
            .handle_mut()?
            .fetch_one(dest)
            .map_err(OdbcMiddlewareError::FetchError)?;
        if end_of_data {
            self.exhausted = true;
            trace!(rows = self.fetched, "cursor exhausted");
            Ok(Fetch::Exhausted)
        } else {
            self.fetched += 1;
            Ok(Fetch::Row)
        }
    }

    /// Fetch one row into a freshly allocated buffer sized to the column count.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::MetadataUnavailable` if the column count cannot be
    /// read, or `OdbcMiddlewareError::FetchError` if the fetch fails.
    pub fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, OdbcMiddlewareError> {
        if self.exhausted {
            return Ok(None);
        }
        let width = match self.width {
            Some(width) => width,
            None => {
                let width = self
                    .stmt
                    .handle()?
                    .num_fields()
                    .map_err(OdbcMiddlewareError::MetadataUnavailable)?;
                self.width = Some(width);
                width
            }
        };
        let mut buf = vec![RowValues::Null; width];
        match self.next(&mut buf)? {
            Fetch::Row => Ok(Some(buf)),
            Fetch::Exhausted => Ok(None),
        }
    }

    /// Drain the remaining rows into a [`ResultSet`].
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::MetadataUnavailable` if the column names cannot be
    /// read, or `OdbcMiddlewareError::FetchError` if a fetch fails.
    pub fn collect_result_set(&mut self) -> Result<ResultSet, OdbcMiddlewareError> {
        let columns = self.try_columns()?;
        self.width = Some(columns.len());
        let mut result_set = ResultSet::with_capacity(Arc::new(columns), 16);
        while let Some(row) = self.next_row()? {
            result_set.add_row_values(row);
        }
        Ok(result_set)
    }

    /// Rows fetched through this cursor so far.
    #[must_use]
    pub fn rows_fetched(&self) -> usize {
        self.fetched
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Close the cursor together with the statement it reads from.
    ///
    /// # Errors
    /// Never fails today; see [`Statement::close`].
    pub fn close(self) -> Result<(), OdbcMiddlewareError> {
        self.stmt.close()
    }
}
