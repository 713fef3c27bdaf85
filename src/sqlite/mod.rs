// SQLite module - connectivity primitives backed by rusqlite
//
// - config: descriptor attributes understood by this connectivity
// - params: value conversion between RowValues and SQLite storage classes
// - connection: connect, autocommit/commit/rollback and close
// - prepared: prepared statement handle (execute, metadata, fetch)

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;

pub use config::{SqliteMode, SqliteOptions, SqliteOptionsBuilder};
pub use connection::{SqliteConnectionHandle, SqliteConnectivity};
pub use prepared::SqlitePreparedStatement;
