//! Merges command-line flags, the config file and built-in defaults.
//! Flags win over the file; the file wins over defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use folders::FolderLayout;
use gateway::{Engine, GatewaySettings};
use migrator::{RecoveryMode, Repository, RestoreOptions, RunOptions};
use sqlmill_core::FolderKind;

use crate::config::Config;
use crate::{ConnectArgs, MigrateArgs};

pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn pick<T: Clone>(flag: &Option<T>, file: &Option<T>) -> Option<T> {
    flag.clone().or_else(|| file.clone())
}

pub fn engine(args: &ConnectArgs, config: &Config) -> Result<Engine> {
    let name = pick(&args.engine, &config.engine).unwrap_or_else(|| "sqlserver".to_string());
    Ok(name.parse::<Engine>()?)
}

pub fn gateway_settings(args: &ConnectArgs, config: &Config) -> Result<GatewaySettings> {
    let mut settings = GatewaySettings::new(engine(args, config)?);
    settings.server_name = pick(&args.server, &config.server);
    settings.database_name = pick(&args.database, &config.database);
    settings.connection_string = pick(&args.connection_string, &config.connection_string);
    if let Some(schema) = pick(&args.schema, &config.schema) {
        settings.names.schema = schema;
    }
    if let Some(table) = pick(&args.version_table, &config.version_table) {
        settings.names.version_table = table;
    }
    if let Some(table) = pick(&args.scripts_run_table, &config.scripts_run_table) {
        settings.names.scripts_run_table = table;
    }
    if let Some(table) = pick(&args.scripts_run_errors_table, &config.scripts_run_errors_table) {
        settings.names.scripts_run_errors_table = table;
    }
    if let Some(secs) = pick(&args.command_timeout_secs, &config.command_timeout_secs) {
        settings.command_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = pick(&args.restore_timeout_secs, &config.restore_timeout_secs) {
        settings.restore_timeout = Duration::from_secs(secs);
    }
    settings.user_name = pick(&args.user, &config.user).unwrap_or_else(current_user);
    Ok(settings)
}

pub fn custom_create_script(args: &MigrateArgs, config: &Config) -> Result<Option<String>> {
    match pick(&args.create_database_script, &config.create_database_script) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading create-database script {}", path.display()))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

fn kind_for(name: &str, everytime: &[String]) -> Option<FolderKind> {
    let kind = match name.to_ascii_lowercase().replace('_', "").as_str() {
        "runfirst" => FolderKind::RunFirst,
        "up" => FolderKind::Up,
        "down" => FolderKind::Down,
        "functions" => FolderKind::Functions,
        "views" => FolderKind::Views,
        "sprocs" => FolderKind::Sprocs,
        "permissions" => FolderKind::Permissions,
        _ => return everytime.iter().find(|g| g.as_str() == name).map(|g| FolderKind::Everytime(g.clone())),
    };
    Some(kind)
}

pub fn folder_layout(args: &MigrateArgs, config: &Config) -> Result<FolderLayout> {
    let mut layout = FolderLayout::standard();
    let names = config.folders.clone().unwrap_or_default();
    let overrides = [
        (FolderKind::RunFirst, pick(&args.run_first_folder, &names.run_first)),
        (FolderKind::Up, pick(&args.up_folder, &names.up)),
        (FolderKind::Down, pick(&args.down_folder, &names.down)),
        (FolderKind::Functions, pick(&args.functions_folder, &names.functions)),
        (FolderKind::Views, pick(&args.views_folder, &names.views)),
        (FolderKind::Sprocs, pick(&args.sprocs_folder, &names.sprocs)),
        (FolderKind::Permissions, pick(&args.permissions_folder, &names.permissions)),
    ];
    for (kind, name) in overrides {
        if let Some(name) = name {
            layout = layout.with_folder_name(&kind, name);
        }
    }

    let mut everytime = config.everytime_folders.clone().unwrap_or_default();
    everytime.extend(args.everytime.iter().cloned());
    for group in &everytime {
        layout = layout.with_everytime_group(group.clone());
    }

    for (name, policy) in config.policies.iter().flatten() {
        let kind = kind_for(name, &everytime).ok_or_else(|| anyhow!("unknown folder `{name}` in policies"))?;
        layout = layout.with_policy(&kind, *policy);
    }
    Ok(layout)
}

pub fn scripts_root(args: &MigrateArgs, config: &Config) -> PathBuf {
    pick(&args.files, &config.files).unwrap_or_else(|| PathBuf::from("."))
}

pub fn repository(args: &MigrateArgs, config: &Config) -> Repository {
    let root = scripts_root(args, config);
    Repository::new(
        pick(&args.repository_path, &config.repository_path).unwrap_or_else(|| root.display().to_string()),
        pick(&args.repository_version, &config.repository_version).unwrap_or_else(|| "0.0.0".to_string()),
    )
}

pub fn run_options(args: &MigrateArgs, config: &Config) -> RunOptions {
    RunOptions {
        create_database: !args.no_create,
        recovery_mode: args.recovery_mode.map(RecoveryMode::from).or(config.recovery_mode),
        restore: args.restore.clone().map(|from_path| RestoreOptions {
            from_path,
            custom_options: args.restore_options.clone(),
        }),
        with_transaction: args.transaction || config.transaction.unwrap_or(false),
        continue_on_error: args.continue_on_error || config.continue_on_error.unwrap_or(false),
        allow_changed_once_scripts: args.allow_changed_once || config.allow_changed_once_scripts.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use sqlmill_core::RunPolicy;

    use super::*;
    use crate::{Cli, Commands};

    fn migrate_args(argv: &[&str]) -> (ConnectArgs, MigrateArgs) {
        let mut full = vec!["sqlmill", "migrate"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Migrate { connect, migrate, .. } => (connect, migrate),
            _ => unreachable!(),
        }
    }

    #[test]
    fn flags_override_the_file() {
        let (connect, migrate) = migrate_args(&["--engine", "sqlite", "--database", "flag.db", "--transaction"]);
        let config = Config {
            engine: Some("oracle".into()),
            database: Some("file.db".into()),
            server: Some("from-file".into()),
            command_timeout_secs: Some(5),
            ..Config::default()
        };
        let settings = gateway_settings(&connect, &config).unwrap();
        assert_eq!(settings.engine, Engine::Sqlite);
        assert_eq!(settings.database_name.as_deref(), Some("flag.db"));
        assert_eq!(settings.server_name.as_deref(), Some("from-file"));
        assert_eq!(settings.command_timeout, Duration::from_secs(5));
        assert!(run_options(&migrate, &config).with_transaction);
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let (connect, migrate) = migrate_args(&["--database", "app"]);
        let config = Config::default();
        let settings = gateway_settings(&connect, &config).unwrap();
        assert_eq!(settings.engine, Engine::SqlServer);
        assert_eq!(settings.names.schema, "RoundhousE");
        assert_eq!(settings.restore_timeout, Duration::from_secs(900));
        let options = run_options(&migrate, &config);
        assert!(options.create_database);
        assert!(!options.continue_on_error);
        assert_eq!(repository(&migrate, &config).version, "0.0.0");
    }

    #[test]
    fn layout_takes_names_groups_and_policies() {
        let (_, migrate) = migrate_args(&["--everytime", "audit"]);
        let config = Config {
            folders: Some(crate::config::FolderNames { up: Some("migrations".into()), ..Default::default() }),
            everytime_folders: Some(vec!["seed".into()]),
            policies: Some([("views".to_string(), RunPolicy::IfChanged), ("seed".to_string(), RunPolicy::Once)].into()),
            ..Config::default()
        };
        let layout = folder_layout(&migrate, &config).unwrap();
        let forward = layout.forward();
        assert_eq!(forward[1].folder_name, "migrations");
        assert_eq!(forward[6].folder_name, "seed");
        assert_eq!(forward[6].policy, RunPolicy::Once);
        assert_eq!(forward[7].folder_name, "audit");
        assert_eq!(layout.get(&FolderKind::Views).unwrap().policy, RunPolicy::IfChanged);
    }

    #[test]
    fn table_names_and_restore_timeout_come_from_flags() {
        let (connect, _) = migrate_args(&[
            "--version-table",
            "SchemaVersion",
            "--scripts-run-table",
            "Applied",
            "--restore-timeout-secs",
            "1800",
        ]);
        let config = Config {
            version_table: Some("FileVersion".into()),
            scripts_run_errors_table: Some("Failures".into()),
            restore_timeout_secs: Some(60),
            ..Config::default()
        };
        let settings = gateway_settings(&connect, &config).unwrap();
        assert_eq!(settings.names.version_table, "SchemaVersion");
        assert_eq!(settings.names.scripts_run_table, "Applied");
        assert_eq!(settings.names.scripts_run_errors_table, "Failures");
        assert_eq!(settings.restore_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn every_folder_name_has_a_flag() {
        let (_, migrate) = migrate_args(&[
            "--run-first-folder",
            "before",
            "--down-folder",
            "rollback",
            "--functions-folder",
            "fn",
            "--views-folder",
            "vw",
            "--sprocs-folder",
            "procs",
            "--permissions-folder",
            "grants",
        ]);
        let config = Config {
            folders: Some(crate::config::FolderNames {
                run_first: Some("from-file".into()),
                up: Some("migrations".into()),
                ..Default::default()
            }),
            ..Config::default()
        };
        let layout = folder_layout(&migrate, &config).unwrap();
        let name = |kind: FolderKind| layout.get(&kind).unwrap().folder_name.clone();
        assert_eq!(name(FolderKind::RunFirst), "before");
        assert_eq!(name(FolderKind::Up), "migrations");
        assert_eq!(name(FolderKind::Down), "rollback");
        assert_eq!(name(FolderKind::Functions), "fn");
        assert_eq!(name(FolderKind::Views), "vw");
        assert_eq!(name(FolderKind::Sprocs), "procs");
        assert_eq!(name(FolderKind::Permissions), "grants");
    }

    #[test]
    fn unknown_policy_folder_is_rejected() {
        let (_, migrate) = migrate_args(&[]);
        let config = Config { policies: Some([("nope".to_string(), RunPolicy::Once)].into()), ..Config::default() };
        assert!(folder_layout(&migrate, &config).is_err());
    }
}
