//! SQL Server processor.
//!
//! Uses Tiberius over a bb8 pool. One connection is checked out for the
//! whole run so the runner's transaction statements share a session.

use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use chrono::NaiveDateTime;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::core::{Processor, ProcessorOptions};
use crate::dialect::{CompatibilityMode, Generator};
use crate::drivers::DatabaseType;
use crate::error::{MigrateError, Result};
use crate::expressions::SchemaObject;
use crate::version::AppliedVersion;

use super::generator::MssqlGenerator;

const DEFAULT_SCHEMA: &str = "dbo";

/// Connection manager for bb8 pool with Tiberius.
#[derive(Clone)]
struct TiberiusConnectionManager {
    config: Config,
    connect_timeout: Duration,
}

impl TiberiusConnectionManager {
    fn new(conn: &ConnectionConfig) -> Self {
        let mut config = Config::new();
        config.host(&conn.host);
        config.port(conn.port.unwrap_or_else(|| DatabaseType::SqlServer.default_port()));
        config.database(&conn.database);
        config.application_name("schema-migrator");
        config.authentication(AuthMethod::sql_server(&conn.user, &conn.password));

        if conn.encrypt {
            if conn.trust_server_cert {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        } else {
            config.encryption(EncryptionLevel::NotSupported);
        }

        Self {
            config,
            connect_timeout: Duration::from_secs(conn.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let addr = self.config.get_addr();
        let tcp = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| tiberius::error::Error::Io {
                kind: std::io::ErrorKind::TimedOut,
                message: format!("connect timed out after {:?}", self.connect_timeout),
            })?
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;
        tcp.set_nodelay(true).ok();
        Client::connect(self.config.clone(), tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

type Connection = PooledConnection<'static, TiberiusConnectionManager>;

/// SQL Server processor.
pub struct MssqlProcessor {
    generator: MssqlGenerator,
    options: ProcessorOptions,
    pool: Pool<TiberiusConnectionManager>,
    client: Mutex<Option<Connection>>,
}

impl MssqlProcessor {
    /// Connect using the given configuration.
    pub async fn connect(
        config: &ConnectionConfig,
        options: ProcessorOptions,
        compatibility: CompatibilityMode,
    ) -> Result<Self> {
        let manager = TiberiusConnectionManager::new(config);
        let pool = Pool::builder()
            .max_size(config.max_connections as u32)
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
            .test_on_check_out(true)
            .build(manager)
            .await
            .map_err(|e| MigrateError::pool(e, "creating SQL Server connection pool"))?;

        let mut client = pool
            .get_owned()
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to SQL Server"))?;
        client.simple_query("SELECT 1").await?.into_row().await?;

        info!(
            "Connected to SQL Server: {}:{}/{}",
            config.host,
            config
                .port
                .unwrap_or_else(|| DatabaseType::SqlServer.default_port()),
            config.database
        );

        Ok(Self {
            generator: MssqlGenerator::new(compatibility),
            options,
            pool,
            client: Mutex::new(Some(client)),
        })
    }

    fn schema_or_default<'a>(&'a self, schema: Option<&'a str>) -> &'a str {
        schema
            .filter(|s| !s.is_empty())
            .or(self.options.default_schema.as_deref())
            .unwrap_or(DEFAULT_SCHEMA)
    }

    async fn query_exists(&self, sql: &str, params: &[&str]) -> Result<bool> {
        let mut guard = self.client.lock().await;
        let client = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "SQL Server existence check"))?;
        let mut query = Query::new(sql);
        for param in params {
            query.bind(*param);
        }
        let row = query.query(&mut **client).await?.into_row().await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl Processor for MssqlProcessor {
    fn generator(&self) -> &dyn Generator {
        &self.generator
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }

    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        let mut guard = self.client.lock().await;
        let client = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "SQL Server execute"))?;
        client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        self.execute("BEGIN TRANSACTION").await
    }

    async fn commit(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        self.execute("COMMIT TRANSACTION").await
    }

    async fn rollback(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        self.execute("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION").await
    }

    async fn exists(&self, object: &SchemaObject) -> Result<bool> {
        match object {
            SchemaObject::Schema { name } => {
                self.query_exists("SELECT 1 FROM sys.schemas WHERE name = @P1", &[name])
                    .await
            }
            SchemaObject::Table { table } => {
                self.query_exists(
                    "SELECT 1 FROM INFORMATION_SCHEMA.TABLES \
                     WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2",
                    &[self.schema_or_default(table.schema()), &table.name],
                )
                .await
            }
            SchemaObject::Column { table, column } => {
                self.query_exists(
                    "SELECT 1 FROM INFORMATION_SCHEMA.COLUMNS \
                     WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2 AND COLUMN_NAME = @P3",
                    &[self.schema_or_default(table.schema()), &table.name, column],
                )
                .await
            }
            SchemaObject::Index { table, index } => {
                self.query_exists(
                    "SELECT 1 FROM sys.indexes \
                     WHERE object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2)) AND name = @P3",
                    &[self.schema_or_default(table.schema()), &table.name, index],
                )
                .await
            }
            SchemaObject::Constraint { table, constraint } => {
                self.query_exists(
                    "SELECT 1 FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS \
                     WHERE CONSTRAINT_SCHEMA = @P1 AND TABLE_NAME = @P2 AND CONSTRAINT_NAME = @P3",
                    &[self.schema_or_default(table.schema()), &table.name, constraint],
                )
                .await
            }
            SchemaObject::Sequence { schema, name } => {
                self.query_exists(
                    "SELECT 1 FROM sys.sequences s JOIN sys.schemas sc ON s.schema_id = sc.schema_id \
                     WHERE sc.name = @P1 AND s.name = @P2",
                    &[self.schema_or_default(schema.as_deref()), name],
                )
                .await
            }
            SchemaObject::DefaultValue { table, column } => {
                self.query_exists(
                    "SELECT 1 FROM sys.default_constraints dc \
                     JOIN sys.columns c ON dc.parent_object_id = c.object_id \
                     AND dc.parent_column_id = c.column_id \
                     WHERE dc.parent_object_id = OBJECT_ID(QUOTENAME(@P1) + '.' + QUOTENAME(@P2)) \
                     AND c.name = @P3",
                    &[self.schema_or_default(table.schema()), &table.name, column],
                )
                .await
            }
        }
    }

    async fn fetch_applied_versions(&self, sql: &str) -> Result<Vec<AppliedVersion>> {
        let mut guard = self.client.lock().await;
        let client = guard
            .as_mut()
            .ok_or_else(|| MigrateError::pool("connection closed", "SQL Server version query"))?;
        let rows = client.simple_query(sql).await?.into_first_result().await?;
        rows.iter()
            .map(|row| -> Result<AppliedVersion> {
                let version = row.try_get::<i64, _>(0)?.ok_or_else(|| {
                    MigrateError::Config("Version table contains a NULL version".into())
                })?;
                Ok(AppliedVersion {
                    version,
                    applied_on: row.try_get::<NaiveDateTime, _>(1)?,
                    description: row.try_get::<&str, _>(2)?.map(str::to_string),
                })
            })
            .collect()
    }

    async fn close(&self) {
        // Dropping the pooled connection returns it; the pool closes when dropped.
        self.client.lock().await.take();
        debug!(
            "SQL Server connection released ({} idle)",
            self.pool.state().idle_connections
        );
    }
}
