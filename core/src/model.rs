use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::hash::content_hash;

/// One script file, read once and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
    pub content_hash: String,
}

impl Script {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let content_hash = content_hash(&text);
        Script { name: name.into(), path: path.into(), text, content_hash }
    }
}

/// When a script in a folder is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPolicy {
    /// Applied a single time; a later content change is a policy violation.
    Once,
    /// Applied when new or when its content changed since the last run.
    IfChanged,
    /// Applied on every run.
    EveryTime,
}

impl RunPolicy {
    pub fn is_once(self) -> bool {
        matches!(self, RunPolicy::Once)
    }
}

impl fmt::Display for RunPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPolicy::Once => "once",
            RunPolicy::IfChanged => "if_changed",
            RunPolicy::EveryTime => "every_time",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderKind {
    RunFirst,
    Up,
    Down,
    Functions,
    Views,
    Sprocs,
    Permissions,
    /// Operator-declared group run after the built-in folders.
    Everytime(String),
}

impl FolderKind {
    /// Built-in kinds in forward execution order. `Down` is excluded.
    pub const FORWARD: [FolderKind; 6] = [
        FolderKind::RunFirst,
        FolderKind::Up,
        FolderKind::Functions,
        FolderKind::Views,
        FolderKind::Sprocs,
        FolderKind::Permissions,
    ];

    pub fn default_policy(&self) -> RunPolicy {
        match self {
            FolderKind::RunFirst | FolderKind::Up | FolderKind::Down => RunPolicy::Once,
            _ => RunPolicy::EveryTime,
        }
    }

    /// Lower runs earlier. Everytime groups share a priority and keep the
    /// order they were declared in.
    pub fn priority(&self) -> u8 {
        match self {
            FolderKind::RunFirst => 0,
            FolderKind::Up => 1,
            FolderKind::Functions => 2,
            FolderKind::Views => 3,
            FolderKind::Sprocs => 4,
            FolderKind::Permissions => 5,
            FolderKind::Everytime(_) => 6,
            FolderKind::Down => u8::MAX,
        }
    }

    /// Down scripts are reserved for rollback tooling.
    pub fn runs_forward(&self) -> bool {
        !matches!(self, FolderKind::Down)
    }

    pub fn default_folder_name(&self) -> &str {
        match self {
            FolderKind::RunFirst => "runFirst",
            FolderKind::Up => "up",
            FolderKind::Down => "down",
            FolderKind::Functions => "functions",
            FolderKind::Views => "views",
            FolderKind::Sprocs => "sprocs",
            FolderKind::Permissions => "permissions",
            FolderKind::Everytime(name) => name,
        }
    }
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderKind::Everytime(name) => write!(f, "everytime:{name}"),
            other => f.write_str(other.default_folder_name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub version_id: i64,
    pub repository_path: String,
    pub repository_version: String,
    pub entered_by: String,
    pub entry_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRunRecord {
    pub version_id: i64,
    pub script_name: String,
    pub content_hash: String,
    pub run_once: bool,
    pub entered_by: String,
    pub entry_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRunErrorRecord {
    pub version_id: i64,
    pub script_name: String,
    pub failing_statement: String,
    pub error_message: String,
    pub entered_by: String,
    pub entry_date: String,
}

/// Names of the bookkeeping schema and tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookkeepingNames {
    pub schema: String,
    pub version_table: String,
    pub scripts_run_table: String,
    pub scripts_run_errors_table: String,
}

impl Default for BookkeepingNames {
    fn default() -> Self {
        BookkeepingNames {
            schema: "RoundhousE".to_string(),
            version_table: "Version".to_string(),
            scripts_run_table: "ScriptsRun".to_string(),
            scripts_run_errors_table: "ScriptsRunErrors".to_string(),
        }
    }
}
