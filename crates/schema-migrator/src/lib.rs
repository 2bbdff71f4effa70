//! # schema-migrator
//!
//! Versioned database schema migrations for SQL Server, PostgreSQL and
//! MySQL, with SQL generation for Oracle and SAP HANA.
//!
//! Migrations describe changes through a fluent builder:
//!
//! - **Expressions**: each schema or data change is plain data that can be
//!   validated and, where possible, reversed automatically
//! - **Generators** translate expressions into each dialect's SQL
//! - **Processors** execute that SQL, answer existence checks and own
//!   the transaction
//! - **Runner** applies pending migrations exactly once, in version
//!   order, recording each in the `VersionInfo` table
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_migrator::builder::{ColumnSyntax, MigrationContext};
//! use schema_migrator::core::ProcessorOptions;
//! use schema_migrator::migration::{Migration, MigrationSet};
//! use schema_migrator::{drivers, Config, MigrationRunner, Result};
//!
//! struct CreateUsers;
//!
//! impl Migration for CreateUsers {
//!     fn version(&self) -> i64 {
//!         20240101
//!     }
//!
//!     fn description(&self) -> &str {
//!         "create users"
//!     }
//!
//!     fn up(&self, ctx: &mut MigrationContext) -> Result<()> {
//!         ctx.create()
//!             .table("users")
//!             .with_column("id").as_int64().primary_key().identity()
//!             .with_column("email").as_string(320).not_nullable().unique();
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let processor = drivers::connect(
//!         &config.connection,
//!         ProcessorOptions::default(),
//!         config.runner.compatibility,
//!     )
//!     .await?;
//!
//!     let mut migrations = MigrationSet::new();
//!     migrations.add(CreateUsers)?;
//!
//!     let runner = MigrationRunner::new(processor, migrations, config.runner);
//!     let report = runner.migrate_up().await?;
//!     println!("Applied {} migration(s)", report.applied.len());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod expressions;
pub mod migration;
pub mod runner;
pub mod version;

// Re-exports for convenient access
pub use builder::MigrationContext;
pub use config::{Config, ConnectionConfig, RunnerConfig};
pub use drivers::DatabaseType;
pub use error::{MigrateError, Result};
pub use migration::{Migration, MigrationSet};
pub use runner::{MigrationRunner, RunReport, TransactionMode};
