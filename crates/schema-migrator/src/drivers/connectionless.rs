//! Processor without a database connection.
//!
//! Generates SQL for any dialect and records it instead of executing it.
//! Used by the `preview` command and for dialects without a client library
//! (Oracle, HANA).

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::{Processor, ProcessorOptions};
use crate::dialect::{CompatibilityMode, Generator};
use crate::drivers::DatabaseType;
use crate::error::{MigrateError, Result};
use crate::expressions::{Expression, SchemaObject};
use crate::version::AppliedVersion;

/// Records generated statements; every existence check answers `false`
/// and no versions are ever applied.
pub struct ConnectionlessProcessor {
    database_type: DatabaseType,
    generator: Box<dyn Generator>,
    options: ProcessorOptions,
    statements: Mutex<Vec<String>>,
}

impl ConnectionlessProcessor {
    pub fn new(
        database_type: DatabaseType,
        options: ProcessorOptions,
        compatibility: CompatibilityMode,
    ) -> Self {
        Self {
            database_type,
            generator: database_type.generator(compatibility),
            options,
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Statements recorded so far, in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Render recorded statements as a script, one statement per block.
    pub fn script(&self) -> String {
        let terminator = match self.database_type {
            DatabaseType::SqlServer => "\nGO\n",
            _ => ";\n",
        };
        self.statements()
            .iter()
            .map(|s| format!("{}{}", s, terminator))
            .collect()
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.statements
            .lock()
            .map_err(|_| MigrateError::pool("statement log poisoned", "connectionless processor"))?
            .push(sql.to_string());
        Ok(())
    }
}

#[async_trait]
impl Processor for ConnectionlessProcessor {
    fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    fn is_preview(&self) -> bool {
        true
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        info!("[preview] {}", sql);
        self.record(sql)
    }

    async fn process(&self, expression: &Expression) -> Result<()> {
        let statements = self.generator.generate(expression)?;
        debug!(
            "{} -> {} statement(s)",
            expression.describe(),
            statements.len()
        );
        for sql in &statements {
            self.execute(sql).await?;
        }
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

    async fn exists(&self, _object: &SchemaObject) -> Result<bool> {
        Ok(false)
    }

    async fn fetch_applied_versions(&self, _sql: &str) -> Result<Vec<AppliedVersion>> {
        Ok(Vec::new())
    }

    async fn close(&self) {
        debug!(
            "Connectionless processor closed ({} statement(s) recorded)",
            self.statements().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{DeleteTable, TableRef};

    fn drop_users(if_exists: bool) -> Expression {
        Expression::DeleteTable(DeleteTable {
            table: TableRef::new(None, "users"),
            if_exists,
        })
    }

    #[tokio::test]
    async fn test_records_generated_statements() {
        let processor = ConnectionlessProcessor::new(
            DatabaseType::SqlServer,
            ProcessorOptions::default(),
            CompatibilityMode::Strict,
        );
        processor.process(&drop_users(false)).await.unwrap();
        assert_eq!(processor.statements(), vec!["DROP TABLE [users]"]);
        assert_eq!(processor.script(), "DROP TABLE [users]\nGO\n");
    }

    #[tokio::test]
    async fn test_if_exists_guard_skips_in_preview() {
        let processor = ConnectionlessProcessor::new(
            DatabaseType::Oracle,
            ProcessorOptions::default(),
            CompatibilityMode::Strict,
        );
        let ran = processor.process_guarded(&drop_users(true)).await.unwrap();
        assert!(!ran);
        assert!(processor.statements().is_empty());
        assert!(processor
            .fetch_applied_versions("SELECT 1")
            .await
            .unwrap()
            .is_empty());
    }
}
