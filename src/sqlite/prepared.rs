use std::collections::VecDeque;

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::connectivity::StatementHandle;
use crate::error::DriverError;
use crate::types::{FieldMetadata, RowValues, SqlType};

use super::params::{sqlite_value_to_row_value, to_sqlite_values};

/// Statement handle over a `rusqlite::Statement`.
///
/// `SQLite` cursors borrow the statement, so a result set is read to completion
/// during `execute` and handed out row by row from `fetch_one`. Statements that
/// produce a result set report `-1` rows affected.
#[derive(Debug)]
pub struct SqlitePreparedStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    declared: Vec<SqlType>,
    pending: VecDeque<Vec<Value>>,
    rows_affected: Option<i64>,
}

impl<'c> SqlitePreparedStatement<'c> {
    #[must_use]
    pub fn new(stmt: rusqlite::Statement<'c>) -> Self {
        let declared = stmt
            .columns()
            .iter()
            .map(|col| col.decl_type().map_or(SqlType::Unknown, SqlType::from_type_name))
            .collect();
        Self {
            stmt,
            declared,
            pending: VecDeque::new(),
            rows_affected: None,
        }
    }
}

fn invalid_index(index: usize) -> DriverError {
    DriverError::new(format!("invalid descriptor index {index}")).with_sqlstate("07009")
}

impl StatementHandle for SqlitePreparedStatement<'_> {
    fn execute(&mut self, args: &[RowValues]) -> Result<(), DriverError> {
        self.pending.clear();
        self.rows_affected = None;
        let values = to_sqlite_values(args);
        let width = self.stmt.column_count();
        if width == 0 {
            let changed = self.stmt.execute(params_from_iter(values.iter()))?;
            self.rows_affected = Some(i64::try_from(changed).unwrap_or(i64::MAX));
            return Ok(());
        }
        let mut rows = self.stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let mut row_values = Vec::with_capacity(width);
            for idx in 0..width {
                row_values.push(row.get::<_, Value>(idx)?);
            }
            self.pending.push_back(row_values);
        }
        self.rows_affected = Some(-1);
        Ok(())
    }

    fn rows_affected(&self) -> Result<i64, DriverError> {
        self.rows_affected
            .ok_or_else(|| DriverError::new("function sequence error").with_sqlstate("HY010"))
    }

    fn num_params(&self) -> Result<usize, DriverError> {
        Ok(self.stmt.parameter_count())
    }

    fn num_fields(&self) -> Result<usize, DriverError> {
        Ok(self.stmt.column_count())
    }

    fn field_metadata(&self, index: usize) -> Result<FieldMetadata, DriverError> {
        let offset = index.checked_sub(1).ok_or_else(|| invalid_index(index))?;
        let name = self
            .stmt
            .column_name(offset)
            .map_err(|_| invalid_index(index))?;
        let sql_type = self.declared.get(offset).cloned().unwrap_or(SqlType::Unknown);
        Ok(FieldMetadata::new(name, sql_type))
    }

    fn fetch_one(&mut self, dest: &mut [RowValues]) -> Result<bool, DriverError> {
        let Some(row) = self.pending.pop_front() else {
            return Ok(true);
        };
        if dest.len() != row.len() {
            let err = DriverError::new(format!(
                "row buffer has {} slots, result has {} columns",
                dest.len(),
                row.len()
            ))
            .with_sqlstate("07009");
            self.pending.push_front(row);
            return Err(err);
        }
        for ((slot, value), declared) in dest.iter_mut().zip(row).zip(&self.declared) {
            *slot = sqlite_value_to_row_value(value, declared);
        }
        Ok(false)
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.stmt.finalize().map_err(DriverError::from)
    }
}
