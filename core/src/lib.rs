//! Core types shared across the sqlmill engine: scripts and folder kinds,
//! bookkeeping records, bound parameters and the driver contract.

pub mod connection;
pub mod error;
pub mod hash;
pub mod model;
pub mod params;

pub use connection::{Connection, Connector, DbError};
pub use error::{MigrationError, Result};
pub use hash::content_hash;
pub use model::*;
pub use params::{DbType, Parameter, Rows, Value};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
