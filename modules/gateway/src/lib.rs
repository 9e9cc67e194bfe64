//! Database gateway: one live connection per run, the administrative and
//! bookkeeping operations built on the bound dialect, and parameter binding
//! for every free-form value.

mod engine;
mod insert;
mod open;
mod query;
mod schema;
mod target;

#[cfg(test)]
mod testing;

pub use engine::Engine;
pub use open::{ConnectionScope, Gateway, GatewaySettings};
pub use target::{resolve, ConnectionTarget};
