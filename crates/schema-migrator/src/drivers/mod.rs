//! Database driver implementations.
//!
//! Each driver module provides a `Quoter` and a `Generator` for its
//! dialect; drivers with a client library also provide a `Processor`:
//!
//! - [`mssql`]: Microsoft SQL Server (Tiberius over bb8)
//! - [`postgres`]: PostgreSQL (tokio-postgres over deadpool)
//! - [`mysql`]: MySQL/MariaDB (mysql_async, `mysql` feature)
//! - [`oracle`], [`hana`]: generation only
//! - [`connectionless`]: records SQL for any dialect without connecting
//!
//! # Adding New Databases
//!
//! 1. Create a module under `drivers/` with a quoter and generator
//! 2. Add a `DatabaseType` variant and wire it into `generator()`
//! 3. If a Rust client exists, add a processor and wire it into [`connect`]

pub mod connectionless;
pub mod hana;
pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgres;
mod tls;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use connectionless::ConnectionlessProcessor;
pub use tls::SslMode;

use crate::config::ConnectionConfig;
use crate::core::{Processor, ProcessorOptions};
use crate::dialect::{CompatibilityMode, Generator};
use crate::error::{MigrateError, Result};

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    SqlServer,
    Postgres,
    MySql,
    Oracle,
    Hana,
}

impl DatabaseType {
    /// Parse a database type from a configuration string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database type is not recognized.
    pub fn from_db_type(db_type: &str) -> Result<Self> {
        match db_type.to_lowercase().as_str() {
            "mssql" | "sqlserver" | "sql_server" => Ok(DatabaseType::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(DatabaseType::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseType::MySql),
            "oracle" => Ok(DatabaseType::Oracle),
            "hana" | "saphana" => Ok(DatabaseType::Hana),
            other => Err(MigrateError::Config(format!(
                "Unknown database type: '{}'. Supported types: mssql, postgres, mysql, oracle, hana",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "mssql",
            DatabaseType::Postgres => "postgres",
            DatabaseType::MySql => "mysql",
            DatabaseType::Oracle => "oracle",
            DatabaseType::Hana => "hana",
        }
    }

    /// Default TCP port of the engine.
    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseType::SqlServer => 1433,
            DatabaseType::Postgres => 5432,
            DatabaseType::MySql => 3306,
            DatabaseType::Oracle => 1521,
            DatabaseType::Hana => 30015,
        }
    }

    /// True when a live processor exists for this engine.
    pub fn has_processor(&self) -> bool {
        matches!(
            self,
            DatabaseType::SqlServer | DatabaseType::Postgres | DatabaseType::MySql
        )
    }

    /// SQL generator for this engine.
    pub fn generator(&self, compatibility: CompatibilityMode) -> Box<dyn Generator> {
        match self {
            DatabaseType::SqlServer => Box::new(mssql::MssqlGenerator::new(compatibility)),
            DatabaseType::Postgres => Box::new(postgres::PostgresGenerator::new(compatibility)),
            DatabaseType::MySql => Box::new(mysql::MysqlGenerator::new(compatibility)),
            DatabaseType::Oracle => Box::new(oracle::OracleGenerator::new(compatibility)),
            DatabaseType::Hana => Box::new(hana::HanaGenerator::new(compatibility)),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_db_type(s)
    }
}

/// Connect a processor for the configured database.
///
/// # Errors
///
/// Returns a configuration error for engines without a processor, and
/// connection errors from the driver.
pub async fn connect(
    config: &ConnectionConfig,
    options: ProcessorOptions,
    compatibility: CompatibilityMode,
) -> Result<Arc<dyn Processor>> {
    let db_type = DatabaseType::from_db_type(&config.r#type)?;
    info!("Connecting to {} at {}", db_type, config.host);
    let processor: Arc<dyn Processor> = match db_type {
        DatabaseType::Postgres => {
            Arc::new(postgres::PostgresProcessor::connect(config, options, compatibility).await?)
        }
        DatabaseType::SqlServer => {
            Arc::new(mssql::MssqlProcessor::connect(config, options, compatibility).await?)
        }
        #[cfg(feature = "mysql")]
        DatabaseType::MySql => {
            Arc::new(mysql::MysqlProcessor::connect(config, options, compatibility).await?)
        }
        #[cfg(not(feature = "mysql"))]
        DatabaseType::MySql => {
            return Err(MigrateError::Config(
                "MySQL support requires the 'mysql' feature".into(),
            ))
        }
        DatabaseType::Oracle | DatabaseType::Hana => {
            return Err(MigrateError::Config(format!(
                "{} is generation-only; use the preview command to produce a SQL script",
                db_type
            )))
        }
    };
    Ok(processor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db_type() {
        assert_eq!(DatabaseType::from_db_type("mssql").unwrap(), DatabaseType::SqlServer);
        assert_eq!(DatabaseType::from_db_type("SqlServer").unwrap(), DatabaseType::SqlServer);
        assert_eq!(DatabaseType::from_db_type("pg").unwrap(), DatabaseType::Postgres);
        assert_eq!(DatabaseType::from_db_type("mariadb").unwrap(), DatabaseType::MySql);
        assert_eq!(DatabaseType::from_db_type("saphana").unwrap(), DatabaseType::Hana);

        let err = DatabaseType::from_db_type("sqlite").unwrap_err();
        assert!(err.to_string().contains("'sqlite'"));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for db_type in [
            DatabaseType::SqlServer,
            DatabaseType::Postgres,
            DatabaseType::MySql,
            DatabaseType::Oracle,
            DatabaseType::Hana,
        ] {
            assert_eq!(db_type.to_string().parse::<DatabaseType>().unwrap(), db_type);
        }
    }

    #[test]
    fn test_generator_names() {
        let names: Vec<String> = [DatabaseType::SqlServer, DatabaseType::Oracle, DatabaseType::Hana]
            .iter()
            .map(|t| t.generator(CompatibilityMode::Strict).name().to_string())
            .collect();
        assert_eq!(names, vec!["sqlserver", "oracle", "hana"]);
    }

    #[tokio::test]
    async fn test_connect_rejects_generation_only_engines() {
        let config = ConnectionConfig {
            r#type: "oracle".into(),
            ..ConnectionConfig::default()
        };
        let err = connect(&config, ProcessorOptions::default(), CompatibilityMode::Strict)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("generation-only"));
    }
}
