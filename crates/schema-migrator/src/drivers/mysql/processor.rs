//! MySQL processor.
//!
//! MySQL commits implicitly around most DDL, so the runner's transaction
//! only protects data statements; a failed DDL migration may be partially
//! applied.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row, SslOpts};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::core::{Processor, ProcessorOptions};
use crate::dialect::{CompatibilityMode, Generator};
use crate::drivers::{DatabaseType, SslMode};
use crate::error::{MigrateError, Result};
use crate::expressions::SchemaObject;
use crate::version::AppliedVersion;

use super::generator::MysqlGenerator;

/// MySQL processor backed by a mysql_async pool.
pub struct MysqlProcessor {
    generator: MysqlGenerator,
    options: ProcessorOptions,
    pool: Pool,
    conn: Mutex<Option<Conn>>,
}

fn ssl_opts(mode: SslMode) -> Option<SslOpts> {
    match mode {
        SslMode::Disable => {
            warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
            None
        }
        SslMode::Require => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
        SslMode::VerifyCa => Some(SslOpts::default().with_danger_skip_domain_validation(true)),
        SslMode::VerifyFull => Some(SslOpts::default()),
    }
}

impl MysqlProcessor {
    /// Connect using the given configuration.
    pub async fn connect(
        config: &ConnectionConfig,
        options: ProcessorOptions,
        compatibility: CompatibilityMode,
    ) -> Result<Self> {
        let port = config
            .port
            .unwrap_or_else(|| DatabaseType::MySql.default_port());

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts(SslMode::parse(&config.ssl_mode)?) {
            builder = builder.ssl_opts(ssl);
        }

        let constraints = PoolConstraints::new(1, config.max_connections).ok_or_else(|| {
            MigrateError::Config(format!(
                "Invalid max_connections {} for MySQL",
                config.max_connections
            ))
        })?;
        let opts: Opts = builder
            .pool_opts(PoolOpts::new().with_constraints(constraints))
            .into();
        let pool = Pool::new(opts);

        let mut conn = pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to MySQL"))?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::pool(e, "testing MySQL connection"))?;

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host, port, config.database
        );

        Ok(Self {
            generator: MysqlGenerator::new(compatibility),
            options,
            pool,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Schema filter for information_schema queries, `None` meaning `DATABASE()`.
    fn schema_filter<'a>(&'a self, schema: Option<&'a str>) -> Option<&'a str> {
        schema
            .filter(|s| !s.is_empty())
            .or(self.options.default_schema.as_deref())
    }

    /// Run an existence query whose first placeholder is the schema.
    async fn query_exists(&self, sql: &str, schema: Option<&str>, args: &[&str]) -> Result<bool> {
        let mut params: Vec<mysql_async::Value> = vec![schema.into()];
        params.extend(args.iter().map(|a| mysql_async::Value::from(*a)));

        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "MySQL existence check"))?;
        let row: Option<i64> = conn.exec_first(sql, params).await?;
        Ok(row.is_some())
    }
}

/// Read a DATETIME column without the chrono feature of mysql_common.
fn read_datetime(value: Option<&mysql_async::Value>) -> Option<NaiveDateTime> {
    match value? {
        mysql_async::Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)?.and_hms_micro_opt(
                *hour as u32,
                *minute as u32,
                *second as u32,
                *micros,
            )
        }
        mysql_async::Value::Bytes(bytes) => {
            let text = std::str::from_utf8(bytes).ok()?;
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok()
        }
        _ => None,
    }
}

#[async_trait]
impl Processor for MysqlProcessor {
    fn generator(&self) -> &dyn Generator {
        &self.generator
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "MySQL execute"))?;
        conn.query_drop(sql).await?;
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        debug!("MySQL commits DDL implicitly; only data changes roll back");
        self.execute("START TRANSACTION").await
    }

    async fn commit(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        self.execute("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        self.execute("ROLLBACK").await
    }

    async fn exists(&self, object: &SchemaObject) -> Result<bool> {
        match object {
            SchemaObject::Schema { name } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
                    Some(name),
                    &[],
                )
                .await
            }
            SchemaObject::Table { table } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.TABLES \
                     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?",
                    self.schema_filter(table.schema()),
                    &[&table.name],
                )
                .await
            }
            SchemaObject::Column { table, column } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.COLUMNS \
                     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? AND COLUMN_NAME = ?",
                    self.schema_filter(table.schema()),
                    &[&table.name, column],
                )
                .await
            }
            SchemaObject::Index { table, index } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.STATISTICS \
                     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? AND INDEX_NAME = ? \
                     LIMIT 1",
                    self.schema_filter(table.schema()),
                    &[&table.name, index],
                )
                .await
            }
            SchemaObject::Constraint { table, constraint } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.TABLE_CONSTRAINTS \
                     WHERE CONSTRAINT_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
                     AND CONSTRAINT_NAME = ?",
                    self.schema_filter(table.schema()),
                    &[&table.name, constraint],
                )
                .await
            }
            SchemaObject::Sequence { .. } => Ok(false),
            SchemaObject::DefaultValue { table, column } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.COLUMNS \
                     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
                     AND COLUMN_NAME = ? AND COLUMN_DEFAULT IS NOT NULL",
                    self.schema_filter(table.schema()),
                    &[&table.name, column],
                )
                .await
            }
        }
    }

    async fn fetch_applied_versions(&self, sql: &str) -> Result<Vec<AppliedVersion>> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "MySQL version query"))?;
        let rows: Vec<Row> = conn.query(sql).await?;
        rows.iter()
            .map(|row| -> Result<AppliedVersion> {
                let version = match row.get_opt::<i64, usize>(0) {
                    Some(Ok(v)) => v,
                    _ => {
                        return Err(MigrateError::Config(
                            "Version table contains a NULL or non-integer version".into(),
                        ))
                    }
                };
                Ok(AppliedVersion {
                    version,
                    applied_on: read_datetime(row.as_ref(1)),
                    description: row
                        .get_opt::<Option<String>, usize>(2)
                        .and_then(|r| r.ok())
                        .flatten(),
                })
            })
            .collect()
    }

    async fn close(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            if let Err(e) = conn.disconnect().await {
                warn!("Error closing MySQL connection: {}", e);
            }
        }
        if let Err(e) = self.pool.clone().disconnect().await {
            warn!("Error closing MySQL pool: {}", e);
        }
        debug!("MySQL pool closed");
    }
}
