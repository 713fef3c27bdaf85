use std::time::Duration;

use rusqlite::OpenFlags;

use crate::config::Descriptor;
use crate::error::DriverError;

/// Access mode requested with the `Mode` descriptor attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteMode {
    ReadOnly,
    ReadWrite,
    #[default]
    ReadWriteCreate,
}

/// Connection attributes understood by [`SqliteConnectivity`](super::SqliteConnectivity).
///
/// | key        | meaning                                   |
/// |------------|-------------------------------------------|
/// | `Database` | file path, URI, or `:memory:` (required)  |
/// | `Mode`     | `ro`, `rw` or `rwc` (default `rwc`)       |
/// | `Timeout`  | busy timeout in milliseconds              |
///
/// Other keys (`DSN`, `UID`, `PWD`, ...) are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub database: String,
    pub mode: SqliteMode,
    pub busy_timeout: Option<Duration>,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            mode: SqliteMode::default(),
            busy_timeout: None,
        }
    }

    /// Read the attributes out of a descriptor string.
    ///
    /// # Errors
    /// Returns a `DriverError` with SQLSTATE `08001` when the descriptor does not parse,
    /// lacks `Database`, or carries an invalid `Mode` or `Timeout`.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, DriverError> {
        let unable = |msg: String| DriverError::new(msg).with_sqlstate("08001");
        let parsed: Descriptor = descriptor.parse().map_err(|e| unable(format!("{e}")))?;
        let database = parsed
            .get("Database")
            .ok_or_else(|| unable("descriptor has no Database attribute".into()))?;
        let mut opts = SqliteOptions::new(database);
        if let Some(mode) = parsed.get("Mode") {
            opts.mode = match mode.to_ascii_lowercase().as_str() {
                "ro" => SqliteMode::ReadOnly,
                "rw" => SqliteMode::ReadWrite,
                "rwc" => SqliteMode::ReadWriteCreate,
                other => return Err(unable(format!("unknown Mode: {other}"))),
            };
        }
        if let Some(timeout) = parsed.get("Timeout") {
            let millis: u64 = timeout.parse().map_err(|_| {
                unable(format!("Timeout is not a number of milliseconds: {timeout}"))
            })?;
            opts.busy_timeout = Some(Duration::from_millis(millis));
        }
        Ok(opts)
    }

    /// Render these options as a descriptor string.
    #[must_use]
    pub fn to_descriptor(&self) -> String {
        let mut builder = Descriptor::builder().database(self.database.clone());
        builder = match self.mode {
            SqliteMode::ReadOnly => builder.attribute("Mode", "ro"),
            SqliteMode::ReadWrite => builder.attribute("Mode", "rw"),
            SqliteMode::ReadWriteCreate => builder,
        };
        if let Some(timeout) = self.busy_timeout {
            builder = builder.attribute("Timeout", timeout.as_millis().to_string());
        }
        builder.build()
    }

    pub(crate) fn open_flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self.mode {
            SqliteMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
            SqliteMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            SqliteMode::ReadWriteCreate => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(database),
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: SqliteMode) -> Self {
        self.opts.mode = mode;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Render the descriptor string to hand to `open`.
    #[must_use]
    pub fn descriptor(self) -> String {
        self.opts.to_descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_attributes_from_descriptor() {
        let opts =
            SqliteOptions::from_descriptor("DSN=local;Database=/tmp/x.db;Mode=ro;Timeout=250")
                .unwrap();
        assert_eq!(opts.database, "/tmp/x.db");
        assert_eq!(opts.mode, SqliteMode::ReadOnly);
        assert_eq!(opts.busy_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn missing_database_is_a_connect_failure() {
        let err = SqliteOptions::from_descriptor("DSN=test").unwrap_err();
        assert_eq!(err.sqlstate(), Some("08001"));
        assert!(SqliteOptions::from_descriptor("Database=a;Mode=append").is_err());
        assert!(SqliteOptions::from_descriptor("Database=a;Timeout=soon").is_err());
    }

    #[test]
    fn builder_round_trips_through_descriptor() {
        let descriptor = SqliteOptionsBuilder::new(":memory:")
            .mode(SqliteMode::ReadWrite)
            .busy_timeout(Duration::from_millis(50))
            .descriptor();
        assert_eq!(descriptor, "Database=:memory:;Mode=rw;Timeout=50");
        let opts = SqliteOptions::from_descriptor(&descriptor).unwrap();
        assert_eq!(opts.mode, SqliteMode::ReadWrite);
    }
}
