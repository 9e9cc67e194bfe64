use folders::{FolderLayout, MigrationsFolder, ScriptSource};
use gateway::Gateway;
use sqlmill_core::{MigrationError, Result, RunPolicy, Script};
use tracing::{error, info, warn};

use crate::options::{RecoveryMode, Repository, RunOptions};
use crate::report::{Outcome, RunFailure, RunReport, ScriptOutcome, Stage};

pub struct Migrator<S> {
    gateway: Gateway,
    layout: FolderLayout,
    source: S,
    options: RunOptions,
}

enum Decision {
    Run,
    Skip,
}

impl<S: ScriptSource> Migrator<S> {
    pub fn new(gateway: Gateway, layout: FolderLayout, source: S, options: RunOptions) -> Self {
        Migrator { gateway, layout, source, options }
    }

    pub fn gateway_mut(&mut self) -> &mut Gateway {
        &mut self.gateway
    }

    pub fn into_gateway(self) -> Gateway {
        self.gateway
    }

    /// Runs every forward folder. Partial progress stays recorded on failure,
    /// so the next run resumes after the last applied script.
    pub fn run(&mut self, repository: Repository) -> std::result::Result<RunReport, RunFailure> {
        let mut report = RunReport::start(repository);
        info!(run_id = %report.run_id, repository = %report.repository.path, version = %report.repository.version, "migration started");
        match self.execute(&mut report) {
            Ok(()) => {
                report.finish(None);
                info!(
                    run_id = %report.run_id,
                    applied = report.count(Outcome::Applied),
                    skipped = report.count(Outcome::Skipped),
                    failed = report.count(Outcome::Failed),
                    "migration finished"
                );
                Ok(report)
            }
            Err(error) => {
                report.finish(Some(&error));
                error!(run_id = %report.run_id, stage = ?report.failed_during, error = %error, "migration failed");
                Err(RunFailure { error, report: Box::new(report) })
            }
        }
    }

    /// Drops the target database when it exists.
    pub fn drop_database(&mut self) -> Result<()> {
        self.gateway.initialize_connection()?;
        let mut scope = self.gateway.scoped(false)?;
        scope.delete_database_if_it_exists()?;
        scope.close()
    }

    fn execute(&mut self, report: &mut RunReport) -> Result<()> {
        self.gateway.initialize_connection()?;
        let options = self.options.clone();
        let mut gw = self.gateway.scoped(false)?;

        if !gw.engine().is_file_based() {
            if options.create_database {
                gw.create_database_if_it_doesnt_exist()?;
            }
            if let Some(restore) = &options.restore {
                gw.restore_database(&restore.from_path, restore.custom_options.as_deref())?;
            }
            if let Some(mode) = options.recovery_mode {
                gw.set_recovery_mode(mode == RecoveryMode::Simple)?;
            }
            gw.use_target_database()?;
        }
        report.stage = Stage::DatabaseEnsured;
        info!("database ensured");

        gw.ensure_bookkeeping()?;
        report.stage = Stage::SchemaEnsured;
        info!("bookkeeping tables ensured");

        let repository = report.repository.clone();
        let version_id = match gw.get_latest_version(&repository.path)? {
            Some(latest) if latest.repository_version == repository.version => {
                info!(version_id = latest.version_id, "version already registered");
                latest.version_id
            }
            _ => gw.insert_version_and_get_version_id(&repository.path, &repository.version)?,
        };
        report.version_id = Some(version_id);
        report.stage = Stage::VersionRegistered;
        info!(version_id, version = %repository.version, "version registered");

        if options.with_transaction {
            gw.begin_transaction()?;
        }
        for folder in self.layout.forward() {
            report.stage = Stage::RunningFolder(folder.kind.clone());
            let scripts = self.source.scripts(folder)?;
            info!(folder = %folder.kind, policy = %folder.policy, scripts = scripts.len(), "running folder");
            for script in &scripts {
                let outcome = apply_script(&mut gw, &options, folder, script, version_id)?;
                report.scripts.push(outcome);
            }
        }
        gw.close()
    }
}

/// Applies one script. Returns `Err` only when the run has to stop.
fn apply_script(
    gw: &mut Gateway,
    options: &RunOptions,
    folder: &MigrationsFolder,
    script: &Script,
    version_id: i64,
) -> Result<ScriptOutcome> {
    let mut outcome = ScriptOutcome {
        folder: folder.kind.clone(),
        script: script.name.clone(),
        content_hash: script.content_hash.clone(),
        outcome: Outcome::Applied,
        error: None,
    };
    let key = recorded_name(folder, script);
    let attempt = decide(gw, options, folder, script, &key).and_then(|decision| match decision {
        Decision::Skip => Ok(false),
        Decision::Run => execute_script(gw, script, &key).map(|()| true),
    });
    match attempt {
        Ok(false) => {
            info!(folder = %folder.kind, script = %script.name, "skipped, already applied");
            outcome.outcome = Outcome::Skipped;
        }
        Ok(true) => {
            gw.insert_script_run(&key, &script.content_hash, folder.policy.is_once(), version_id)?;
            info!(folder = %folder.kind, script = %script.name, "applied");
        }
        Err(failure) => {
            let transactional = gw.in_transaction();
            if transactional {
                if let Err(e) = gw.rollback() {
                    error!(error = %e, "rollback failed");
                }
            }
            if let MigrationError::ScriptExecution { statement, source, .. } = &failure {
                if let Err(e) = gw.insert_script_run_error(&key, statement, &source.message, version_id) {
                    error!(script = %key, error = %e, "could not record the script failure");
                }
            }
            if transactional || !options.continue_on_error {
                return Err(failure);
            }
            warn!(folder = %folder.kind, script = %script.name, error = %failure, "script failed, continuing");
            outcome.outcome = Outcome::Failed;
            outcome.error = Some(failure.to_string());
        }
    }
    Ok(outcome)
}

/// Bookkeeping key of a script: its folder name plus its relative name, so
/// equal file names in different folders never share history.
fn recorded_name(folder: &MigrationsFolder, script: &Script) -> String {
    format!("{}/{}", folder.folder_name, script.name)
}

fn decide(
    gw: &mut Gateway,
    options: &RunOptions,
    folder: &MigrationsFolder,
    script: &Script,
    key: &str,
) -> Result<Decision> {
    if folder.policy == RunPolicy::EveryTime {
        return Ok(Decision::Run);
    }
    let Some(recorded) = gw.get_current_script_hash(key)? else {
        return Ok(Decision::Run);
    };
    if recorded == script.content_hash {
        return Ok(Decision::Skip);
    }
    if folder.policy == RunPolicy::IfChanged {
        return Ok(Decision::Run);
    }
    if options.allow_changed_once_scripts {
        warn!(script = %key, "one-time script changed, running it again");
        return Ok(Decision::Run);
    }
    Err(MigrationError::PolicyViolation {
        script: key.to_string(),
        recorded,
        current: script.content_hash.clone(),
    })
}

fn execute_script(gw: &mut Gateway, script: &Script, key: &str) -> Result<()> {
    for statement in gw.splitter().split(&script.text) {
        gw.run_statement(&statement, &[]).map_err(|source| MigrationError::ScriptExecution {
            script: key.to_string(),
            statement: statement.clone(),
            source,
        })?;
    }
    Ok(())
}
