use thiserror::Error;

/// Failure reported by a connectivity primitive.
///
/// Carries the driver's diagnostic record as-is; the adapter layer never
/// interprets it, it only records which adapter call the failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}{}", sqlstate_prefix(.sqlstate), native_suffix(.native_code))]
pub struct DriverError {
    message: String,
    sqlstate: Option<String>,
    native_code: Option<i32>,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sqlstate: None,
            native_code: None,
        }
    }

    /// Attach a five-character SQLSTATE code.
    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    /// Attach the backend's native error number.
    #[must_use]
    pub fn with_native_code(mut self, code: i32) -> Self {
        self.native_code = Some(code);
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        self.sqlstate.as_deref()
    }

    #[must_use]
    pub fn native_code(&self) -> Option<i32> {
        self.native_code
    }
}

fn sqlstate_prefix(sqlstate: &Option<String>) -> String {
    sqlstate
        .as_deref()
        .map_or_else(String::new, |state| format!("[{state}] "))
}

fn native_suffix(native_code: &Option<i32>) -> String {
    native_code.map_or_else(String::new, |code| format!(" (native error {code})"))
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _) => {
                DriverError::new(err.to_string()).with_native_code(code.extended_code)
            }
            // COUNT field incorrect or syntax error
            rusqlite::Error::InvalidParameterCount(_, _) => {
                DriverError::new(err.to_string()).with_sqlstate("07002")
            }
            _ => DriverError::new(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum OdbcMiddlewareError {
    #[error("Connect error: {0}")]
    ConnectError(#[source] DriverError),

    #[error("Prepare error: {0}")]
    PrepareError(#[source] DriverError),

    #[error("Transaction error: {0}")]
    TransactionError(#[source] DriverError),

    #[error("Commit error: {0}")]
    CommitError(#[source] DriverError),

    #[error("Rollback error: {0}")]
    RollbackError(#[source] DriverError),

    #[error("SQL execution error: {0}")]
    ExecError(#[source] DriverError),

    #[error("Query error: {0}")]
    QueryError(#[source] DriverError),

    #[error("Fetch error: {0}")]
    FetchError(#[source] DriverError),

    #[error("Column metadata unavailable: {0}")]
    MetadataUnavailable(#[source] DriverError),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Statement is closed")]
    StatementClosed,

    #[error("A transaction is already open on this connection")]
    TransactionAlreadyOpen,

    #[error("No driver registered under name: {0}")]
    UnknownDriver(String),

    #[error("A driver is already registered under name: {0}")]
    DuplicateDriver(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl OdbcMiddlewareError {
    /// The primitive failure behind this error, if the error came from the driver.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::ConnectError(e)
            | Self::PrepareError(e)
            | Self::TransactionError(e)
            | Self::CommitError(e)
            | Self::RollbackError(e)
            | Self::ExecError(e)
            | Self::QueryError(e)
            | Self::FetchError(e)
            | Self::MetadataUnavailable(e) => Some(e),
            _ => None,
        }
    }
}
