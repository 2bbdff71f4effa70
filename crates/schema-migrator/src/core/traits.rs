//! The processor seam between the runner and a live database.
//!
//! A [`Processor`] pairs a dialect [`Generator`] with a connection: it
//! executes generated SQL, owns the transaction, and answers the existence
//! queries behind `if_exists()`/`if_not_exists()` guards.
//!
//! # Design Patterns
//!
//! - **Strategy**: the generator is chosen per database type
//! - **Template Method**: [`Processor::process`] is generate-then-execute,
//!   implementations only provide [`Processor::execute`]

use async_trait::async_trait;
use tracing::{debug, info};

use crate::dialect::Generator;
use crate::drivers::DatabaseType;
use crate::error::Result;
use crate::expressions::{Expression, SchemaObject};
use crate::version::AppliedVersion;

/// Behaviour shared by every processor.
#[derive(Debug, Clone, Default)]
pub struct ProcessorOptions {
    /// Log statements instead of executing them.
    pub preview_only: bool,

    /// Schema used by existence checks for unqualified names
    /// (driver default when unset: `public`, `dbo`, current database).
    pub default_schema: Option<String>,
}

/// Execute migrations against one database connection.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Generator for this processor's dialect.
    fn generator(&self) -> &dyn Generator;

    /// Database type served by this processor.
    fn database_type(&self) -> DatabaseType;

    fn options(&self) -> &ProcessorOptions;

    fn is_preview(&self) -> bool {
        self.options().preview_only
    }

    /// Execute one SQL statement (or batch) on the processor's connection.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Generate SQL for an expression and execute it.
    ///
    /// In preview mode the statements are logged and not executed.
    async fn process(&self, expression: &Expression) -> Result<()> {
        let statements = self.generator().generate(expression)?;
        debug!(
            "{} -> {} statement(s)",
            expression.describe(),
            statements.len()
        );
        for sql in &statements {
            if self.is_preview() {
                info!("[preview] {}", sql);
                continue;
            }
            self.execute(sql).await?;
        }
        Ok(())
    }

    /// Process an expression after checking its existence guard.
    ///
    /// Returns `false` when the guard skipped the expression (for split
    /// expressions, when every part was skipped).
    async fn process_guarded(&self, expression: &Expression) -> Result<bool> {
        if let Some(parts) = expression.guarded_parts() {
            let mut ran = false;
            for part in &parts {
                ran |= self.process_guarded(part).await?;
            }
            return Ok(ran);
        }
        if let Some(guard) = expression.guard() {
            let exists = self.exists(&guard.object).await?;
            if !guard.should_run(exists) {
                debug!("Skipping {} (guard not met)", expression.describe());
                return Ok(false);
            }
        }
        self.process(expression).await?;
        Ok(true)
    }

    async fn begin_transaction(&self) -> Result<()>;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    /// Check whether a database object exists.
    async fn exists(&self, object: &SchemaObject) -> Result<bool>;

    /// Run the version table query (`Version`, `AppliedOn`, `Description`).
    async fn fetch_applied_versions(&self, sql: &str) -> Result<Vec<AppliedVersion>>;

    /// Release the connection.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::builder::MigrationContext;
    use crate::drivers::postgres::PostgresGenerator;

    /// Knows a single column `t.a`; records what it executes.
    #[derive(Default)]
    struct OneColumnProcessor {
        generator: PostgresGenerator,
        options: ProcessorOptions,
        executed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Processor for OneColumnProcessor {
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
            self.executed.lock().unwrap().push(sql.to_string());
            Ok(())
        }

        async fn begin_transaction(&self) -> Result<()> {
            Ok(())
        }

        async fn commit(&self) -> Result<()> {
            Ok(())
        }

        async fn rollback(&self) -> Result<()> {
            Ok(())
        }

        async fn exists(&self, object: &SchemaObject) -> Result<bool> {
            Ok(matches!(object, SchemaObject::Column { table, column } if table.name == "t" && column == "a"))
        }

        async fn fetch_applied_versions(&self, _sql: &str) -> Result<Vec<AppliedVersion>> {
            Ok(Vec::new())
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_if_exists_checks_each_deleted_column() {
        let mut ctx = MigrationContext::new(DatabaseType::Postgres);
        ctx.delete().column("a").column("b").from_table("t").if_exists();
        let expressions = ctx.into_expressions();
        assert_eq!(expressions.len(), 1);

        let processor = OneColumnProcessor::default();
        assert!(processor.process_guarded(&expressions[0]).await.unwrap());
        assert_eq!(
            *processor.executed.lock().unwrap(),
            vec!["ALTER TABLE \"t\" DROP COLUMN \"a\"".to_string()]
        );
    }
}
