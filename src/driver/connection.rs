use std::cell::Cell;
use std::fmt;

use tracing::{debug, warn};

use crate::config::redact;
use crate::connectivity::{ConnectionHandle, Connectivity};
use crate::error::OdbcMiddlewareError;
use crate::tx_outcome::{TxOutcome, TxState};

use super::statement::Statement;
use super::transaction::Transaction;

/// Connection adapter owning exactly one connectivity handle.
///
/// Statements and transactions borrow the connection, so none of them can outlive
/// it and [`close`](Connection::close) is only callable once they are gone. The
/// handle is not safe for concurrent use; neither is this type.
pub struct Connection {
    handle: Option<Box<dyn ConnectionHandle>>,
    tx_state: Cell<TxState>,
    autocommit: Cell<bool>,
    restore_autocommit: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("handle", &self.handle.as_ref().map(|_| "<ConnectionHandle>"))
            .field("tx_state", &self.tx_state.get())
            .field("autocommit", &self.autocommit.get())
            .field("restore_autocommit", &self.restore_autocommit)
            .finish()
    }
}

impl Connection {
    /// Connect through `connectivity`, handing it the descriptor untouched.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::ConnectError` carrying the primitive failure.
    pub fn open(
        connectivity: &dyn Connectivity,
        descriptor: &str,
    ) -> Result<Self, OdbcMiddlewareError> {
        debug!(descriptor = %redact(descriptor), "opening connection");
        let handle = connectivity
            .connect(descriptor)
            .map_err(OdbcMiddlewareError::ConnectError)?;
        Ok(Self::from_handle(handle))
    }

    /// Wrap an already established handle. The connection starts in autocommit mode.
    #[must_use]
    pub fn from_handle(handle: Box<dyn ConnectionHandle>) -> Self {
        Self {
            handle: Some(handle),
            tx_state: Cell::new(TxState::NoTransaction),
            autocommit: Cell::new(true),
            restore_autocommit: false,
        }
    }

    /// Turn autocommit back on after every commit or rollback.
    #[must_use]
    pub fn with_restore_autocommit(mut self, restore: bool) -> Self {
        self.restore_autocommit = restore;
        self
    }

    fn handle(&self) -> Result<&dyn ConnectionHandle, OdbcMiddlewareError> {
        self.handle
            .as_deref()
            .ok_or(OdbcMiddlewareError::ConnectionClosed)
    }

    /// Prepare `sql` on this connection.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::PrepareError` if the primitive rejects the text,
    /// or `ConnectionClosed` after [`close`](Connection::close).
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>, OdbcMiddlewareError> {
        let handle = self.handle()?;
        debug!(sql, "preparing statement");
        let stmt = handle
            .prepare(sql)
            .map_err(OdbcMiddlewareError::PrepareError)?;
        Ok(Statement::new(stmt, sql))
    }

    /// Start a transaction by switching autocommit off.
    ///
    /// No BEGIN is issued; the protocol treats "autocommit off" as "inside a
    /// transaction". Nesting is not supported: calling `begin` while a transaction is
    /// open is rejected.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::TransactionAlreadyOpen` for a nested begin and
    /// `OdbcMiddlewareError::TransactionError` if the autocommit switch fails.
    pub fn begin(&self) -> Result<Transaction<'_>, OdbcMiddlewareError> {
        if self.tx_state.get().is_open() {
            return Err(OdbcMiddlewareError::TransactionAlreadyOpen);
        }
        self.handle()?
            .set_autocommit(false)
            .map_err(OdbcMiddlewareError::TransactionError)?;
        self.autocommit.set(false);
        self.tx_state.set(TxState::Open);
        debug!("transaction started");
        Ok(Transaction::new(self))
    }

    pub(crate) fn commit_handle(&self) -> Result<(), OdbcMiddlewareError> {
        self.handle()?
            .commit()
            .map_err(OdbcMiddlewareError::CommitError)
    }

    pub(crate) fn rollback_handle(&self) -> Result<(), OdbcMiddlewareError> {
        self.handle()?
            .rollback()
            .map_err(OdbcMiddlewareError::RollbackError)
    }

    /// Record the end of the open transaction and apply the autocommit policy.
    ///
    /// The transaction has already ended on the handle, so a failed autocommit
    /// switch is logged and shows up as `autocommit() == false` in the outcome.
    pub(crate) fn end_transaction(&self, state: TxState) -> TxOutcome {
        self.tx_state.set(state);
        if self.restore_autocommit && !self.autocommit.get() {
            match self.handle().and_then(|handle| {
                handle
                    .set_autocommit(true)
                    .map_err(OdbcMiddlewareError::TransactionError)
            }) {
                Ok(()) => self.autocommit.set(true),
                Err(err) => warn!(error = %err, "failed to restore autocommit"),
            }
        }
        debug!(?state, autocommit = self.autocommit.get(), "transaction ended");
        TxOutcome::new(state, self.autocommit.get())
    }

    /// Forget the open transaction after its rollback failed. Autocommit stays off.
    pub(crate) fn abandon_transaction(&self) {
        self.tx_state.set(TxState::NoTransaction);
    }

    /// Current transaction state.
    #[must_use]
    pub fn transaction_state(&self) -> TxState {
        self.tx_state.get()
    }

    /// Autocommit mode as last set through this connection.
    #[must_use]
    pub fn autocommit(&self) -> bool {
        self.autocommit.get()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Release the connection handle. Closing an already closed connection is a no-op.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::ConnectError` if the disconnect primitive fails;
    /// the handle is considered released either way.
    pub fn close(&mut self) -> Result<(), OdbcMiddlewareError> {
        match self.handle.take() {
            Some(handle) => {
                debug!("closing connection");
                handle.close().map_err(OdbcMiddlewareError::ConnectError)
            }
            None => Ok(()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close connection on drop");
        }
    }
}
