/// Transaction state of a connection.
///
/// A connection starts in `NoTransaction`, moves to `Open` on
/// [`Connection::begin`](crate::Connection::begin) and to `Committed` or `RolledBack`
/// when the transaction ends. A later `begin` opens it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    NoTransaction,
    Open,
    Committed,
    RolledBack,
}

impl TxState {
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, TxState::Open)
    }
}

/// Outcome returned by committing or rolling back a transaction.
///
/// Autocommit is left as the connectivity library leaves it unless the driver was
/// configured to restore it, so the outcome reports which mode the connection is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    state: TxState,
    autocommit: bool,
}

impl TxOutcome {
    pub(crate) fn new(state: TxState, autocommit: bool) -> Self {
        Self { state, autocommit }
    }

    /// `Committed` or `RolledBack`.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state == TxState::Committed
    }

    /// Whether the connection is back in autocommit mode.
    #[must_use]
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }
}
