use std::cell::Cell;

use tracing::debug;

use crate::config::redact;
use crate::connectivity::{ConnectionHandle, Connectivity, StatementHandle};
use crate::error::DriverError;

use super::config::SqliteOptions;
use super::prepared::SqlitePreparedStatement;

/// Connectivity library backed by an embedded `SQLite` engine.
///
/// Descriptors name the database with `Database=` (see [`SqliteOptions`]).
/// Transactions follow the handle protocol: with autocommit off the connection is
/// always inside a transaction, and commit or rollback immediately opens the next
/// one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnectivity;

impl SqliteConnectivity {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connectivity for SqliteConnectivity {
    fn connect(&self, descriptor: &str) -> Result<Box<dyn ConnectionHandle>, DriverError> {
        let opts = SqliteOptions::from_descriptor(descriptor)?;
        let conn = rusqlite::Connection::open_with_flags(&opts.database, opts.open_flags())?;
        if let Some(timeout) = opts.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        debug!(descriptor = %redact(descriptor), "sqlite connection established");
        Ok(Box::new(SqliteConnectionHandle::new(conn)))
    }
}

/// Connection handle over a single `rusqlite::Connection`.
#[derive(Debug)]
pub struct SqliteConnectionHandle {
    conn: rusqlite::Connection,
    manual_commit: Cell<bool>,
}

impl SqliteConnectionHandle {
    /// Wrap an open connection; it starts in autocommit mode.
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn,
            manual_commit: Cell::new(false),
        }
    }

    fn end_and_restart(&self, verb: &str) -> Result<(), DriverError> {
        if !self.manual_commit.get() {
            // autocommit: every statement already ended its own transaction
            return Ok(());
        }
        if !self.conn.is_autocommit() {
            self.conn.execute_batch(verb)?;
        }
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }
}

impl ConnectionHandle for SqliteConnectionHandle {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn StatementHandle + 'c>, DriverError> {
        let stmt = self.conn.prepare(sql)?;
        Ok(Box::new(SqlitePreparedStatement::new(stmt)))
    }

    fn set_autocommit(&self, enabled: bool) -> Result<(), DriverError> {
        if enabled {
            // switching autocommit on commits whatever is pending
            if !self.conn.is_autocommit() {
                self.conn.execute_batch("COMMIT")?;
            }
        } else if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        self.manual_commit.set(!enabled);
        Ok(())
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.end_and_restart("COMMIT")
    }

    fn rollback(&self) -> Result<(), DriverError> {
        self.end_and_restart("ROLLBACK")
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn.close().map_err(|(_, err)| DriverError::from(err))
    }
}
