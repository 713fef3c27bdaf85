use thiserror::Error;
use tracing::warn;

use crate::error::OdbcMiddlewareError;
use crate::tx_outcome::{TxOutcome, TxState};

use super::connection::Connection;

/// An open transaction scope on a [`Connection`].
///
/// Carries no state of its own beyond whether it has been finished; commit and
/// rollback go straight to the connection's handle. Both consume the transaction.
/// Dropping an unfinished transaction rolls it back.
#[derive(Debug)]
pub struct Transaction<'c> {
    conn: &'c Connection,
    finished: bool,
}

impl<'c> Transaction<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            finished: false,
        }
    }

    /// The connection this transaction runs on, for preparing statements inside it.
    #[must_use]
    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Commit the transaction.
    ///
    /// When the driver's autocommit restoration is on and switching autocommit back
    /// fails, the commit still stands; the outcome then reports `autocommit() == false`.
    ///
    /// # Errors
    /// Returns [`CommitFailed`] if the commit primitive fails. The transaction is
    /// handed back still open, with its work pending on the connection, so the caller
    /// can retry the commit or roll back.
    pub fn commit(mut self) -> Result<TxOutcome, CommitFailed<'c>> {
        if let Err(error) = self.conn.commit_handle() {
            warn!(error = %error, "commit failed; transaction left open");
            return Err(CommitFailed {
                transaction: self,
                error,
            });
        }
        self.finished = true;
        Ok(self.conn.end_transaction(TxState::Committed))
    }

    /// Roll the transaction back.
    ///
    /// # Errors
    /// Returns `OdbcMiddlewareError::RollbackError` if the rollback primitive fails.
    /// The transaction scope ends regardless and the connection reports
    /// `TxState::NoTransaction`.
    pub fn rollback(mut self) -> Result<TxOutcome, OdbcMiddlewareError> {
        self.finished = true;
        if let Err(err) = self.conn.rollback_handle() {
            self.conn.abandon_transaction();
            return Err(err);
        }
        Ok(self.conn.end_transaction(TxState::RolledBack))
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("transaction dropped while open; rolling back");
        match self.conn.rollback_handle() {
            Ok(()) => {
                self.conn.end_transaction(TxState::RolledBack);
            }
            Err(err) => {
                warn!(error = %err, "rollback on drop failed");
                self.conn.abandon_transaction();
            }
        }
    }
}

/// A commit that did not go through, carrying the still open transaction.
///
/// Nothing has been rolled back. Retry with
/// `failed.into_transaction().commit()`, or end the scope with
/// `into_transaction().rollback()`. Converting into [`OdbcMiddlewareError`]
/// (for example with `?`) drops the transaction, which rolls it back.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CommitFailed<'c> {
    transaction: Transaction<'c>,
    #[source]
    error: OdbcMiddlewareError,
}

impl<'c> CommitFailed<'c> {
    /// The `CommitError` reported by the driver.
    #[must_use]
    pub fn error(&self) -> &OdbcMiddlewareError {
        &self.error
    }

    /// Take back the open transaction, discarding the error.
    #[must_use]
    pub fn into_transaction(self) -> Transaction<'c> {
        self.transaction
    }

    #[must_use]
    pub fn into_parts(self) -> (Transaction<'c>, OdbcMiddlewareError) {
        (self.transaction, self.error)
    }
}

impl From<CommitFailed<'_>> for OdbcMiddlewareError {
    fn from(failed: CommitFailed<'_>) -> Self {
        failed.error
    }
}
