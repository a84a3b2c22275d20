use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fn_enricher::config::FnEnricherConfig;
use fn_enricher::FnEnricher;
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "fn_enricher";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if let Some(dir) = p.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    // rwc: create the file on first start
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// fn-enricher: enriches full-name records with age, gender and nationality
#[derive(Parser)]
#[command(name = "fn-enricher-server")]
#[command(about = "Enriches full-name records from Kafka with age, gender and nationality")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of enrichment workers (overrides modules.fn_enricher.workers_count)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume and enrich records until interrupted
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let mut module_cfg: FnEnricherConfig = config.module_config(MODULE_NAME)?;
    if let Some(workers) = cli.workers {
        module_cfg.workers_count = workers;
    }

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("fn-enricher starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, module_cfg).await,
        Commands::Check => check_config(config, module_cfg),
        Commands::Migrate => migrate(config).await,
    }
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

async fn connect_database(config: &AppConfig) -> Result<DatabaseConnection> {
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("database section is required"))?;

    let mut dsn = db_config.url.trim().to_owned();
    if detect_from_dsn(db_config)? == "sqlite" {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.server.home_dir))?;
    }

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(db_config.max_conns.unwrap_or(10))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    tracing::info!("Connecting to database: {}", dsn);
    Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to database {dsn}"))
}

async fn run_server(config: AppConfig, module_cfg: FnEnricherConfig) -> Result<()> {
    let redis_url = config
        .redis
        .as_ref()
        .map(|r| r.url.clone())
        .ok_or_else(|| anyhow!("redis section is required"))?;

    let db = connect_database(&config).await?;
    FnEnricher::migrate(&db).await?;

    let module = FnEnricher::init(module_cfg, db, &redis_url).await?;
    let cancel = runtime::shutdown_token();

    module.run(cancel).await?;
    tracing::info!("fn-enricher stopped");
    Ok(())
}

fn check_config(config: AppConfig, module_cfg: FnEnricherConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(db) = config.database.as_ref() {
        detect_from_dsn(db)?;
    }
    module_cfg.validate()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn migrate(config: AppConfig) -> Result<()> {
    let db = connect_database(&config).await?;
    FnEnricher::migrate(&db).await?;
    println!("Migrations applied");
    Ok(())
}
