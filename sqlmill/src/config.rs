use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use migrator::RecoveryMode;
use serde::Deserialize;
use sqlmill_core::RunPolicy;

pub const DEFAULT_CONFIG: &str = "sqlmill.yaml";

/// Directory names per folder kind.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct FolderNames {
    pub run_first: Option<String>,
    pub up: Option<String>,
    pub down: Option<String>,
    pub functions: Option<String>,
    pub views: Option<String>,
    pub sprocs: Option<String>,
    pub permissions: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub engine: Option<String>,
    pub server: Option<String>,
    pub database: Option<String>,
    pub connection_string: Option<String>,
    pub files: Option<PathBuf>,
    pub repository_path: Option<String>,
    pub repository_version: Option<String>,
    pub folders: Option<FolderNames>,
    /// Extra run-every-time folders, run after permissions in this order.
    pub everytime_folders: Option<Vec<String>>,
    /// Policy overrides keyed by folder kind (`up`, `views`, ...).
    pub policies: Option<BTreeMap<String, RunPolicy>>,
    pub schema: Option<String>,
    pub version_table: Option<String>,
    pub scripts_run_table: Option<String>,
    pub scripts_run_errors_table: Option<String>,
    pub command_timeout_secs: Option<u64>,
    pub restore_timeout_secs: Option<u64>,
    pub user: Option<String>,
    pub transaction: Option<bool>,
    pub continue_on_error: Option<bool>,
    pub allow_changed_once_scripts: Option<bool>,
    pub recovery_mode: Option<RecoveryMode>,
    pub create_database_script: Option<PathBuf>,
}

/// Reads `path`, or `./sqlmill.yaml` when no path is given and it exists.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_yaml::from_str(&s).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(config))
}
