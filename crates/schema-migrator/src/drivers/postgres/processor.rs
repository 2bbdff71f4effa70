//! PostgreSQL processor.
//!
//! Holds one pooled connection for the lifetime of a run so that
//! BEGIN/COMMIT issued by the runner apply to the statements in between.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio::sync::Mutex;
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::core::{Processor, ProcessorOptions};
use crate::dialect::{CompatibilityMode, Generator};
use crate::drivers::{DatabaseType, SslMode};
use crate::error::{MigrateError, Result};
use crate::expressions::{SchemaObject, TableRef};
use crate::version::AppliedVersion;

use super::generator::PostgresGenerator;

const DEFAULT_SCHEMA: &str = "public";

/// PostgreSQL processor backed by a deadpool-postgres pool.
pub struct PostgresProcessor {
    generator: PostgresGenerator,
    options: ProcessorOptions,
    pool: Pool,
    client: Mutex<Object>,
}

impl PostgresProcessor {
    /// Connect using the given configuration.
    pub async fn connect(
        config: &ConnectionConfig,
        options: ProcessorOptions,
        compatibility: CompatibilityMode,
    ) -> Result<Self> {
        let port = config
            .port
            .unwrap_or_else(|| DatabaseType::Postgres.default_port());
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name("schema-migrator");
        pg_config.keepalives(true);
        pg_config.connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = match SslMode::parse(&config.ssl_mode)?.connector()? {
            None => {
                let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
                Pool::builder(mgr)
                    .max_size(config.max_connections)
                    .build()
                    .map_err(|e| MigrateError::pool(e, "creating PostgreSQL pool"))?
            }
            Some(tls) => {
                let mgr = Manager::from_config(pg_config, tls, mgr_config);
                Pool::builder(mgr)
                    .max_size(config.max_connections)
                    .build()
                    .map_err(|e| MigrateError::pool(e, "creating PostgreSQL pool"))?
            }
        };

        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "connecting to PostgreSQL"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host, port, config.database
        );

        Ok(Self {
            generator: PostgresGenerator::new(compatibility),
            options,
            pool,
            client: Mutex::new(client),
        })
    }

    fn schema_or_default<'a>(&'a self, schema: Option<&'a str>) -> &'a str {
        schema
            .filter(|s| !s.is_empty())
            .or(self.options.default_schema.as_deref())
            .unwrap_or(DEFAULT_SCHEMA)
    }

    async fn query_exists(&self, sql: &str, params: &[&str]) -> Result<bool> {
        let params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = params
            .iter()
            .map(|p| p as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();
        let client = self.client.lock().await;
        let row = client.query_opt(sql, &params).await?;
        Ok(row.is_some())
    }

    async fn table_exists(&self, table: &TableRef) -> Result<bool> {
        self.query_exists(
            "SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2",
            &[self.schema_or_default(table.schema()), &table.name],
        )
        .await
    }
}

#[async_trait]
impl Processor for PostgresProcessor {
    fn generator(&self) -> &dyn Generator {
        &self.generator
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        let client = self.client.lock().await;
        client.batch_execute(sql).await?;
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<()> {
        if self.is_preview() {
            return Ok(());
        }
        self.execute("BEGIN").await
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
                    "SELECT 1 FROM information_schema.schemata WHERE schema_name = $1",
                    &[name],
                )
                .await
            }
            SchemaObject::Table { table } => self.table_exists(table).await,
            SchemaObject::Column { table, column } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.columns \
                     WHERE table_schema = $1 AND table_name = $2 AND column_name = $3",
                    &[self.schema_or_default(table.schema()), &table.name, column],
                )
                .await
            }
            SchemaObject::Index { table, index } => {
                self.query_exists(
                    "SELECT 1 FROM pg_catalog.pg_indexes \
                     WHERE schemaname = $1 AND tablename = $2 AND indexname = $3",
                    &[self.schema_or_default(table.schema()), &table.name, index],
                )
                .await
            }
            SchemaObject::Constraint { table, constraint } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.table_constraints \
                     WHERE constraint_schema = $1 AND table_name = $2 AND constraint_name = $3",
                    &[self.schema_or_default(table.schema()), &table.name, constraint],
                )
                .await
            }
            SchemaObject::Sequence { schema, name } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.sequences \
                     WHERE sequence_schema = $1 AND sequence_name = $2",
                    &[self.schema_or_default(schema.as_deref()), name],
                )
                .await
            }
            SchemaObject::DefaultValue { table, column } => {
                self.query_exists(
                    "SELECT 1 FROM information_schema.columns \
                     WHERE table_schema = $1 AND table_name = $2 AND column_name = $3 \
                     AND column_default IS NOT NULL",
                    &[self.schema_or_default(table.schema()), &table.name, column],
                )
                .await
            }
        }
    }

    async fn fetch_applied_versions(&self, sql: &str) -> Result<Vec<AppliedVersion>> {
        let client = self.client.lock().await;
        let rows = client.query(sql, &[]).await?;
        rows.iter()
            .map(|row| -> Result<AppliedVersion> {
                Ok(AppliedVersion {
                    version: row.try_get::<_, i64>(0)?,
                    applied_on: row.try_get::<_, Option<NaiveDateTime>>(1)?,
                    description: row.try_get::<_, Option<String>>(2)?,
                })
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close();
        debug!("PostgreSQL pool closed");
    }
}
