use serde::{Deserialize, Serialize};

/// Natural key of a version row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub path: String,
    pub version: String,
}

impl Repository {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Repository { path: path.into(), version: version.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryMode {
    Simple,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    pub from_path: String,
    /// Appended to the engine's RESTORE options.
    pub custom_options: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Create the target database when missing. Ignored by file-based engines.
    pub create_database: bool,
    pub recovery_mode: Option<RecoveryMode>,
    pub restore: Option<RestoreOptions>,
    /// Wrap folder application in one transaction.
    pub with_transaction: bool,
    /// Keep going after a failed script. Has no effect inside a transaction.
    pub continue_on_error: bool,
    /// Re-run a one-time script whose content changed instead of failing.
    pub allow_changed_once_scripts: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            create_database: true,
            recovery_mode: None,
            restore: None,
            with_transaction: false,
            continue_on_error: false,
            allow_changed_once_scripts: false,
        }
    }
}
