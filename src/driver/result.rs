use crate::error::OdbcMiddlewareError;

/// Summary of one [`Statement::exec`](crate::Statement::exec) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: i64,
}

impl ExecResult {
    pub(crate) fn new(rows_affected: i64) -> Self {
        Self { rows_affected }
    }

    /// Rows affected, as reported by the driver. Drivers report `-1` when the count
    /// is unknown.
    #[must_use]
    pub fn rows_affected(&self) -> i64 {
        self.rows_affected
    }

    /// The protocol has no way to retrieve generated keys.
    ///
    /// # Errors
    /// Always returns `OdbcMiddlewareError::Unsupported`.
    pub fn last_insert_id(&self) -> Result<i64, OdbcMiddlewareError> {
        Err(OdbcMiddlewareError::Unsupported(
            "last insert id is not supported by this driver".into(),
        ))
    }
}
