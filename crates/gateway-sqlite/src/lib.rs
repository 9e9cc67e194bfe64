//! SQLite driver for the gateway, backed by rusqlite.

mod bind;
mod conn;
mod open;

pub use conn::SqliteConnection;
pub use open::{data_source, SqliteConnector};
