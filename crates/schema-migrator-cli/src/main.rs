//! schema-migrator CLI - versioned schema migrations from SQL files.

use clap::{Parser, Subcommand};
use schema_migrator::builder::MigrationContext;
use schema_migrator::core::{Processor, ProcessorOptions};
use schema_migrator::drivers::{self, ConnectionlessProcessor, DatabaseType};
use schema_migrator::migration::{self, Migration, MigrationSet};
use schema_migrator::runner::{MigrationListing, MigrationState};
use schema_migrator::{Config, MigrateError, MigrationRunner, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "schema-migrator")]
#[command(about = "Versioned database schema migrations")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override runner.migrations_dir
    #[arg(short, long)]
    migrations_dir: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Migrate {
        /// Stop after this version
        #[arg(long)]
        to: Option<i64>,

        /// Log SQL instead of executing it
        #[arg(long)]
        preview: bool,
    },

    /// Revert applied migrations
    Rollback {
        /// Number of migrations to revert
        #[arg(long, default_value = "1", conflicts_with = "to")]
        steps: usize,

        /// Revert every migration above this version (0 reverts all and drops the version table)
        #[arg(long)]
        to: Option<i64>,

        /// Log SQL instead of executing it
        #[arg(long)]
        preview: bool,
    },

    /// List applied, pending and missing migrations
    List,

    /// Print the SQL script of every migration without connecting
    Preview {
        /// Generate for another database type than the configured one
        #[arg(long)]
        database_type: Option<String>,

        /// Write the script to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate migrations and generate their SQL without executing it
    Validate {
        /// Also connect and check that no pending migration precedes the latest applied one
        #[arg(long)]
        check_order: bool,
    },

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);
    if let Some(dir) = cli.migrations_dir.clone() {
        config.runner.migrations_dir = dir;
    }

    let cancel_token = setup_signal_handler();

    match cli.command {
        Commands::Migrate { to, preview } => {
            let migrations = migration::load_dir(&config.runner.migrations_dir)?;
            let processor = connect(&config, preview || config.runner.preview).await?;
            let runner = MigrationRunner::new(processor.clone(), migrations, config.runner)
                .with_cancellation(cancel_token);

            let result = match to {
                Some(version) => runner.migrate_up_to(version).await,
                None => runner.migrate_up().await,
            };
            processor.close().await;
            print_report(&result?, cli.output_json)?;
        }

        Commands::Rollback { steps, to, preview } => {
            let migrations = migration::load_dir(&config.runner.migrations_dir)?;
            let processor = connect(&config, preview || config.runner.preview).await?;
            let runner = MigrationRunner::new(processor.clone(), migrations, config.runner)
                .with_cancellation(cancel_token);

            let result = match to {
                Some(version) => runner.rollback_to(version).await,
                None => runner.rollback(steps).await,
            };
            processor.close().await;
            print_report(&result?, cli.output_json)?;
        }

        Commands::List => {
            let migrations = migration::load_dir(&config.runner.migrations_dir)?;
            let processor = connect(&config, false).await?;
            let runner = MigrationRunner::new(processor.clone(), migrations, config.runner);
            let result = runner.list().await;
            processor.close().await;
            let listing = result?;

            if cli.output_json {
                println!("{}", listing.to_json()?);
            } else {
                print_listing(&listing);
            }
        }

        Commands::Preview {
            database_type,
            output,
        } => {
            let db_type = match database_type {
                Some(t) => DatabaseType::from_db_type(&t)?,
                None => DatabaseType::from_db_type(&config.connection.r#type)?,
            };
            let migrations = migration::load_dir(&config.runner.migrations_dir)?;
            let processor = Arc::new(ConnectionlessProcessor::new(
                db_type,
                processor_options(&config, true),
                config.runner.compatibility,
            ));
            let runner = MigrationRunner::new(processor.clone(), migrations, config.runner)
                .with_cancellation(cancel_token);
            let report = runner.migrate_up().await?;
            info!(
                "Generated {} statement(s) for {} migration(s)",
                processor.statements().len(),
                report.applied.len()
            );

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "database_type": db_type.as_str(),
                        "migrations": report.applied,
                        "statements": processor.statements(),
                    }))?
                );
            } else if let Some(path) = output {
                std::fs::write(&path, processor.script())?;
                println!("Wrote {} statement(s) to {}", processor.statements().len(), path.display());
            } else {
                print!("{}", processor.script());
            }
        }

        Commands::Validate { check_order } => {
            let migrations = migration::load_dir(&config.runner.migrations_dir)?;
            let db_type = DatabaseType::from_db_type(&config.connection.r#type)?;
            let statements = validate_offline(&migrations, db_type, &config)?;

            if check_order {
                let processor = connect(&config, false).await?;
                let runner = MigrationRunner::new(processor.clone(), migrations, config.runner);
                let result = runner.validate_version_order().await;
                processor.close().await;
                result?;
            }

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "valid": true,
                        "statements": statements,
                    }))?
                );
            } else {
                println!("Validation completed successfully ({} statement(s))", statements);
            }
        }

        Commands::HealthCheck => {
            let started = Instant::now();
            let result = match connect(&config, false).await {
                Ok(processor) => {
                    let ping = processor.execute("SELECT 1").await;
                    processor.close().await;
                    ping
                }
                Err(e) => Err(e),
            };
            let latency_ms = started.elapsed().as_millis() as u64;
            let healthy = result.is_ok();
            let error = result.as_ref().err().map(|e| e.to_string());

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "database_type": config.connection.r#type,
                        "healthy": healthy,
                        "latency_ms": latency_ms,
                        "error": error,
                    }))?
                );
            } else {
                println!("Health Check Results:");
                println!(
                    "  {} at {}: {} ({}ms)",
                    config.connection.r#type,
                    config.connection.host,
                    if healthy { "OK" } else { "FAILED" },
                    latency_ms
                );
                if let Some(ref err) = error {
                    println!("    Error: {}", err);
                }
            }

            result?;
        }
    }

    Ok(())
}

fn processor_options(config: &Config, preview: bool) -> ProcessorOptions {
    ProcessorOptions {
        preview_only: preview,
        default_schema: config.connection.schema.clone(),
    }
}

async fn connect(config: &Config, preview: bool) -> Result<Arc<dyn Processor>, MigrateError> {
    drivers::connect(
        &config.connection,
        processor_options(config, preview),
        config.runner.compatibility,
    )
    .await
}

/// Build, validate and generate every migration in both directions.
/// Returns the number of generated statements.
fn validate_offline(
    migrations: &MigrationSet,
    db_type: DatabaseType,
    config: &Config,
) -> Result<usize, MigrateError> {
    let generator = db_type.generator(config.runner.compatibility);
    let mut statements = 0;
    for m in migrations.iter() {
        let mut ctx = MigrationContext::new(db_type);
        m.up(&mut ctx)
            .map_err(|e| MigrateError::migration(m.version(), m.description(), e))?;

        let mut down = MigrationContext::new(db_type);
        if let Err(e) = m.down(&mut down) {
            warn!("{} ({}) cannot be reverted: {}", m.version(), m.description(), e);
        }

        for expression in ctx.expressions().iter().chain(down.expressions()) {
            expression
                .ensure_valid()
                .and_then(|_| generator.generate(expression))
                .map(|sql| statements += sql.len())
                .map_err(|e| MigrateError::migration(m.version(), m.description(), e))?;
        }
    }
    info!("Validated {} migration(s)", migrations.len());
    Ok(statements)
}

fn print_report(report: &RunReport, output_json: bool) -> Result<(), MigrateError> {
    if output_json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    let verb = if report.preview { "Previewed" } else { "Completed" };
    println!("\n{} {} migration(s)", verb, report.count());
    for outcome in report.applied.iter() {
        println!("  + {} {} ({}ms)", outcome.version, outcome.description, outcome.duration_ms);
    }
    for outcome in report.reverted.iter() {
        println!("  - {} {} ({}ms)", outcome.version, outcome.description, outcome.duration_ms);
    }
    println!("  Duration: {:.2}s", report.duration_seconds);
    match report.current_version {
        Some(v) => println!("  Current version: {}", v),
        None => println!("  Current version: none"),
    }
    Ok(())
}

fn print_listing(listing: &MigrationListing) {
    println!("{:<16} {:<8} {:<20} Description", "Version", "State", "Applied on");
    for entry in &listing.entries {
        let state = match entry.state {
            MigrationState::Applied => "applied",
            MigrationState::Pending => "pending",
            MigrationState::Missing => "missing",
        };
        let applied_on = entry
            .applied_on
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let breaking = if entry.breaking_change { " [breaking]" } else { "" };
        println!(
            "{:<16} {:<8} {:<20} {}{}",
            entry.version, state, applied_on, entry.description, breaking
        );
    }
    match listing.current_version {
        Some(v) => println!("\nCurrent version: {}", v),
        None => println!("\nCurrent version: none"),
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Cancel the returned token on SIGINT or SIGTERM. The runner stops before
/// the next migration; the one in flight finishes or rolls back.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            match signal(kind) {
                Ok(mut stream) => {
                    stream.recv().await;
                    eprintln!("\nReceived {}. Stopping after the current migration...", name);
                    token.cancel();
                }
                Err(e) => warn!("Failed to install {} handler: {}", name, e),
            }
        });
    }

    cancel_token
}

/// Cancel the returned token on Ctrl-C.
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\nReceived Ctrl-C. Stopping after the current migration...");
                token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl-C handler: {}", e),
        }
    });

    cancel_token
}
