use std::fmt;

use serde::Serialize;
use sqlmill_core::{FolderKind, MigrationError};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::options::Repository;

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    DatabaseEnsured,
    SchemaEnsured,
    VersionRegistered,
    RunningFolder(FolderKind),
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => f.write_str("init"),
            Stage::DatabaseEnsured => f.write_str("database ensured"),
            Stage::SchemaEnsured => f.write_str("schema ensured"),
            Stage::VersionRegistered => f.write_str("version registered"),
            Stage::RunningFolder(kind) => write!(f, "running {kind}"),
            Stage::Done => f.write_str("done"),
            Stage::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Applied,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptOutcome {
    pub folder: FolderKind,
    pub script: String,
    pub content_hash: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub repository: Repository,
    pub stage: Stage,
    /// Last stage entered before the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_during: Option<Stage>,
    pub version_id: Option<i64>,
    pub scripts: Vec<ScriptOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl RunReport {
    pub(crate) fn start(repository: Repository) -> Self {
        RunReport {
            run_id: Uuid::now_v7(),
            repository,
            stage: Stage::Init,
            failed_during: None,
            version_id: None,
            scripts: Vec::new(),
            error: None,
            started_at: now_rfc3339(),
            finished_at: None,
        }
    }

    pub(crate) fn finish(&mut self, error: Option<&MigrationError>) {
        if let Some(e) = error {
            self.failed_during = Some(std::mem::replace(&mut self.stage, Stage::Failed));
            self.error = Some(e.to_string());
        } else {
            self.stage = Stage::Done;
        }
        self.finished_at = Some(now_rfc3339());
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.scripts.iter().filter(|s| s.outcome == outcome).count()
    }

    pub fn succeeded(&self) -> bool {
        self.stage == Stage::Done
    }
}

/// A failed run: the causing error plus everything that happened before it.
#[derive(Debug, thiserror::Error)]
#[error("migration {} failed during {}", .report.run_id, .report.failed_during.as_ref().unwrap_or(&Stage::Init))]
pub struct RunFailure {
    #[source]
    pub error: MigrationError,
    pub report: Box<RunReport>,
}
