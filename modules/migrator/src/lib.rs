//! Migration orchestrator: ensures the database and bookkeeping tables,
//! registers the version, then applies every forward folder in order.

mod options;
mod report;
mod run;

pub use options::{RecoveryMode, Repository, RestoreOptions, RunOptions};
pub use report::{Outcome, RunFailure, RunReport, ScriptOutcome, Stage};
pub use run::Migrator;
