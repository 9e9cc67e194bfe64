use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dialects::DialectRegistry;
use folders::DiskScripts;
use gateway::{Engine, Gateway};
use migrator::{Migrator, RecoveryMode};
use sqlmill_core::Connector;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod output;
mod settings;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json, Jsonl }

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RecoveryArg { Simple, Full }

impl From<RecoveryArg> for RecoveryMode {
    fn from(r: RecoveryArg) -> Self {
        match r {
            RecoveryArg::Simple => RecoveryMode::Simple,
            RecoveryArg::Full => RecoveryMode::Full,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sqlmill", version, about = "Versioned SQL script migrations")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./sqlmill.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log every statement sent to the database
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ConnectArgs {
    /// Engine: sqlserver, sqlserver2000, access, oracle, sqlite
    #[arg(long)]
    engine: Option<String>,
    /// Server name or data source
    #[arg(long)]
    server: Option<String>,
    /// Database name (file path for file-based engines)
    #[arg(long)]
    database: Option<String>,
    /// Full connection string; explicit --server/--database win over its tokens
    #[arg(long)]
    connection_string: Option<String>,
    /// Schema (or table-name prefix) holding the bookkeeping tables
    #[arg(long)]
    schema: Option<String>,
    /// Name of the version table
    #[arg(long)]
    version_table: Option<String>,
    /// Name of the scripts-run table
    #[arg(long)]
    scripts_run_table: Option<String>,
    /// Name of the scripts-run-errors table
    #[arg(long)]
    scripts_run_errors_table: Option<String>,
    /// Per-command timeout in seconds
    #[arg(long)]
    command_timeout_secs: Option<u64>,
    /// Timeout in seconds for a restore
    #[arg(long)]
    restore_timeout_secs: Option<u64>,
    /// Name recorded as entered_by (default: $USER / $USERNAME)
    #[arg(long)]
    user: Option<String>,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// Root directory holding the script folders
    #[arg(long)]
    files: Option<PathBuf>,
    /// Repository identifier recorded with the version
    #[arg(long)]
    repository_path: Option<String>,
    /// Version recorded for this run
    #[arg(long = "repository-version")]
    repository_version: Option<String>,
    /// Directory name of the run-first folder
    #[arg(long)]
    run_first_folder: Option<String>,
    /// Directory name of the up folder
    #[arg(long)]
    up_folder: Option<String>,
    /// Directory name of the down folder
    #[arg(long)]
    down_folder: Option<String>,
    /// Directory name of the functions folder
    #[arg(long)]
    functions_folder: Option<String>,
    /// Directory name of the views folder
    #[arg(long)]
    views_folder: Option<String>,
    /// Directory name of the stored procedures folder
    #[arg(long)]
    sprocs_folder: Option<String>,
    /// Directory name of the permissions folder
    #[arg(long)]
    permissions_folder: Option<String>,
    /// Extra run-every-time folder, repeatable
    #[arg(long)]
    everytime: Vec<String>,
    /// Wrap folder application in one transaction
    #[arg(long)]
    transaction: bool,
    /// Record failed scripts and keep going
    #[arg(long)]
    continue_on_error: bool,
    /// Re-run one-time scripts whose content changed
    #[arg(long)]
    allow_changed_once: bool,
    /// Do not create the database when missing
    #[arg(long)]
    no_create: bool,
    /// Recovery mode to set after the database is ensured
    #[arg(long, value_enum)]
    recovery_mode: Option<RecoveryArg>,
    /// Restore the database from this backup before migrating
    #[arg(long)]
    restore: Option<String>,
    /// Extra RESTORE options
    #[arg(long, requires = "restore")]
    restore_options: Option<String>,
    /// Script replacing the engine's create-database statement
    #[arg(long)]
    create_database_script: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Apply outstanding scripts
    Migrate {
        #[command(flatten)]
        connect: ConnectArgs,
        #[command(flatten)]
        migrate: MigrateArgs,
        /// Output format for the run report
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Drop the target database if it exists
    Drop {
        #[command(flatten)]
        connect: ConnectArgs,
    },
    /// List recorded script runs
    History {
        #[command(flatten)]
        connect: ConnectArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write CSV instead (to --out, or stdout)
        #[arg(long)]
        csv: bool,
        /// Output file for --csv
        #[arg(long, requires = "csv")]
        out: Option<PathBuf>,
        /// List failed statements instead of successful runs
        #[arg(long)]
        errors: bool,
    },
    /// Print the batches a script splits into
    Split {
        file: PathBuf,
        /// Engine whose separator rules apply
        #[arg(long, default_value = "sqlserver")]
        engine: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn connector(engine: Engine) -> Result<Box<dyn Connector>> {
    match engine {
        #[cfg(feature = "sqlite")]
        Engine::Sqlite => Ok(Box::new(gateway_sqlite::SqliteConnector)),
        other => Err(anyhow!("no driver for {other} is built into this binary")),
    }
}

fn open_gateway(connect: &ConnectArgs, cfg: &config::Config, registry: &DialectRegistry, create_script: Option<String>) -> Result<Gateway> {
    let mut gw_settings = settings::gateway_settings(connect, cfg)?;
    gw_settings.custom_create_database_script = create_script;
    let engine = gw_settings.engine;
    Ok(Gateway::new(gw_settings, registry, connector(engine)?)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cfg = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let registry = DialectRegistry::standard();
    match cli.command {
        Commands::Version => {
            println!("sqlmill {} (core {})", env!("CARGO_PKG_VERSION"), sqlmill_core::version());
            println!("dialects: {}", registry.names().join(", "));
        }
        Commands::Migrate { connect, migrate, format } => {
            let create_script = settings::custom_create_script(&migrate, &cfg)?;
            let gateway = open_gateway(&connect, &cfg, &registry, create_script)?;
            let layout = settings::folder_layout(&migrate, &cfg)?;
            let source = DiskScripts::new(settings::scripts_root(&migrate, &cfg));
            let repository = settings::repository(&migrate, &cfg);
            let options = settings::run_options(&migrate, &cfg);
            let mut m = Migrator::new(gateway, layout, source, options);
            match m.run(repository) {
                Ok(report) => output::print_report(&report, format)?,
                Err(failure) => {
                    output::print_report(&failure.report, format)?;
                    return Err(anyhow::Error::new(failure));
                }
            }
        }
        Commands::Drop { connect } => {
            let gateway = open_gateway(&connect, &cfg, &registry, None)?;
            let layout = folders::FolderLayout::standard();
            let mut m = Migrator::new(gateway, layout, folders::MemoryScripts::new(), Default::default());
            m.drop_database().context("dropping the database")?;
            info!("database dropped");
        }
        Commands::History { connect, format, csv, out, errors } => {
            let mut gateway = open_gateway(&connect, &cfg, &registry, None)?;
            let mut scope = gateway.scoped(false)?;
            scope.use_target_database()?;
            if errors {
                let rows = scope.script_run_errors()?;
                output::print_errors(&rows, format, csv, out.as_deref())?;
            } else {
                let rows = scope.script_runs()?;
                output::print_runs(&rows, format, csv, out.as_deref())?;
            }
            scope.close()?;
        }
        Commands::Split { file, engine, format } => {
            let engine: Engine = engine.parse()?;
            let dialect = registry
                .get(engine.dialect_name())
                .ok_or_else(|| anyhow!("no dialect registered for {engine}"))?;
            let text = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
            let batches = dialect.splitter().split(&text);
            output::print_batches(&batches, format)?;
        }
    }
    Ok(())
}
