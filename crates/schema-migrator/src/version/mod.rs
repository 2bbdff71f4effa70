//! The version table.
//!
//! Applied migrations are recorded one row per version in a metadata table
//! (`VersionInfo` by default). The table is created on first use through
//! ordinary expressions, so every dialect creates it with its own SQL.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{ColumnDefinition, DbType, Direction, IndexColumn, IndexDefinition, Processor, Value};
use crate::error::Result;
use crate::expressions::{
    CreateIndex, CreateSchema, CreateTable, DataRow, DeleteData, DeleteTable, Expression, InsertData,
    SchemaObject, TableRef,
};

/// Maximum stored length of a migration description.
pub const DESCRIPTION_LENGTH: u32 = 1024;

/// Layout of the version table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionTableMetadata {
    pub schema: Option<String>,
    pub table_name: String,
    pub column_name: String,
    pub applied_on_column_name: String,
    pub description_column_name: String,
    pub unique_index_name: String,
}

impl Default for VersionTableMetadata {
    fn default() -> Self {
        Self {
            schema: None,
            table_name: "VersionInfo".to_string(),
            column_name: "Version".to_string(),
            applied_on_column_name: "AppliedOn".to_string(),
            description_column_name: "Description".to_string(),
            unique_index_name: "UC_Version".to_string(),
        }
    }
}

impl VersionTableMetadata {
    pub fn table(&self) -> TableRef {
        TableRef::new(self.schema.as_deref(), &self.table_name)
    }

    /// Expressions creating the schema (when set), table and unique index.
    pub fn create_expressions(&self) -> Vec<Expression> {
        let mut expressions = Vec::new();
        if let Some(schema) = &self.schema {
            expressions.push(Expression::CreateSchema(CreateSchema {
                name: schema.clone(),
                if_not_exists: true,
            }));
        }

        let version = ColumnDefinition {
            db_type: Some(DbType::Int64),
            is_nullable: Some(false),
            ..ColumnDefinition::new(&self.column_name)
        };
        let applied_on = ColumnDefinition {
            db_type: Some(DbType::DateTime),
            is_nullable: Some(true),
            ..ColumnDefinition::new(&self.applied_on_column_name)
        };
        let description = ColumnDefinition {
            db_type: Some(DbType::String),
            size: Some(DESCRIPTION_LENGTH),
            is_nullable: Some(true),
            ..ColumnDefinition::new(&self.description_column_name)
        };
        expressions.push(Expression::CreateTable(CreateTable {
            table: self.table(),
            columns: vec![version, applied_on, description],
            description: None,
            if_not_exists: true,
        }));

        expressions.push(Expression::CreateIndex(CreateIndex {
            index: IndexDefinition {
                name: self.unique_index_name.clone(),
                schema: self.schema.clone(),
                table: self.table_name.clone(),
                columns: vec![IndexColumn::new(&self.column_name, Direction::Ascending)],
                is_unique: true,
                is_clustered: true,
                ..Default::default()
            },
            if_not_exists: true,
        }));
        expressions
    }
}

/// One row of the version table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedVersion {
    pub version: i64,
    pub applied_on: Option<NaiveDateTime>,
    pub description: Option<String>,
}

/// Applied versions keyed by version number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    applied: BTreeMap<i64, AppliedVersion>,
}

impl VersionInfo {
    pub fn new(rows: impl IntoIterator<Item = AppliedVersion>) -> Self {
        Self {
            applied: rows.into_iter().map(|r| (r.version, r)).collect(),
        }
    }

    pub fn is_applied(&self, version: i64) -> bool {
        self.applied.contains_key(&version)
    }

    /// Highest applied version.
    pub fn latest(&self) -> Option<i64> {
        self.applied.keys().next_back().copied()
    }

    /// Applied versions in ascending order.
    pub fn versions(&self) -> impl DoubleEndedIterator<Item = i64> + '_ {
        self.applied.keys().copied()
    }

    pub fn get(&self, version: i64) -> Option<&AppliedVersion> {
        self.applied.get(&version)
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    pub(crate) fn insert(&mut self, row: AppliedVersion) {
        self.applied.insert(row.version, row);
    }

    pub(crate) fn remove(&mut self, version: i64) {
        self.applied.remove(&version);
    }
}

/// Reads and writes the version table through a processor.
pub struct VersionLoader<'a> {
    processor: &'a dyn Processor,
    metadata: &'a VersionTableMetadata,
}

impl<'a> VersionLoader<'a> {
    pub fn new(processor: &'a dyn Processor, metadata: &'a VersionTableMetadata) -> Self {
        Self {
            processor,
            metadata,
        }
    }

    /// Create the version table if it is absent.
    pub async fn ensure_table(&self) -> Result<()> {
        if self.table_exists().await? {
            return Ok(());
        }
        info!("Creating version table {}", self.metadata.table());
        for expression in self.metadata.create_expressions() {
            self.processor.process_guarded(&expression).await?;
        }
        Ok(())
    }

    async fn table_exists(&self) -> Result<bool> {
        self.processor
            .exists(&SchemaObject::Table {
                table: self.metadata.table(),
            })
            .await
    }

    /// `SELECT Version, AppliedOn, Description FROM VersionInfo ORDER BY Version`.
    pub fn select_sql(&self) -> Result<String> {
        let generator = self.processor.generator();
        Ok(format!(
            "SELECT {}, {}, {} FROM {} ORDER BY {}",
            generator.quote(&self.metadata.column_name)?,
            generator.quote(&self.metadata.applied_on_column_name)?,
            generator.quote(&self.metadata.description_column_name)?,
            generator.table_name(&self.metadata.table())?,
            generator.quote(&self.metadata.column_name)?
        ))
    }

    /// Load applied versions; empty when the table does not exist yet.
    pub async fn load(&self) -> Result<VersionInfo> {
        if !self.table_exists().await? {
            debug!("Version table {} not found", self.metadata.table());
            return Ok(VersionInfo::default());
        }
        let rows = self
            .processor
            .fetch_applied_versions(&self.select_sql()?)
            .await?;
        debug!("Loaded {} applied version(s)", rows.len());
        Ok(VersionInfo::new(rows))
    }

    /// Insert the row recording an applied migration.
    pub async fn record_up(&self, version: i64, description: &str) -> Result<AppliedVersion> {
        let applied_on = Utc::now().naive_utc().trunc_subsecs(3);
        let description = truncate_description(description);
        let row = DataRow::new()
            .set(&self.metadata.column_name, version)
            .set(&self.metadata.applied_on_column_name, applied_on)
            .set(&self.metadata.description_column_name, description.as_str());
        self.processor
            .process(&Expression::InsertData(InsertData {
                table: self.metadata.table(),
                rows: vec![row],
                identity_insert: false,
            }))
            .await?;
        Ok(AppliedVersion {
            version,
            applied_on: Some(applied_on),
            description: Some(description),
        })
    }

    /// Delete the row of a reverted migration.
    pub async fn record_down(&self, version: i64) -> Result<()> {
        self.processor
            .process(&Expression::DeleteData(DeleteData {
                table: self.metadata.table(),
                rows: vec![DataRow::new().set(&self.metadata.column_name, Value::Int(version))],
                all_rows: false,
            }))
            .await
    }

    /// Drop the version table (after a full rollback).
    pub async fn remove_table(&self) -> Result<()> {
        info!("Removing version table {}", self.metadata.table());
        self.processor
            .process_guarded(&Expression::DeleteTable(DeleteTable {
                table: self.metadata.table(),
                if_exists: true,
            }))
            .await?;
        Ok(())
    }
}

fn truncate_description(description: &str) -> String {
    description
        .chars()
        .take(DESCRIPTION_LENGTH as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    use crate::core::ProcessorOptions;
    use crate::dialect::CompatibilityMode;
    use crate::drivers::{ConnectionlessProcessor, DatabaseType};

    #[test]
    fn test_default_metadata() {
        let meta = VersionTableMetadata::default();
        assert_eq!(meta.table(), TableRef::new(None, "VersionInfo"));
        assert_eq!(meta.unique_index_name, "UC_Version");
    }

    #[test]
    fn test_create_expressions_without_schema() {
        let expressions = VersionTableMetadata::default().create_expressions();
        assert_eq!(expressions.len(), 2);
        assert!(matches!(&expressions[0], Expression::CreateTable(t) if t.columns.len() == 3));
        match &expressions[1] {
            Expression::CreateIndex(idx) => {
                assert!(idx.index.is_unique);
                assert_eq!(idx.index.resolved_name(), "UC_Version");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(expressions.iter().all(|e| e.validate().is_empty()));
    }

    #[test]
    fn test_create_expressions_with_schema_start_with_schema() {
        let meta = VersionTableMetadata {
            schema: Some("meta".into()),
            ..Default::default()
        };
        let expressions = meta.create_expressions();
        assert_eq!(expressions.len(), 3);
        assert!(matches!(&expressions[0], Expression::CreateSchema(s) if s.name == "meta"));
        assert!(expressions.iter().all(|e| e.guard().is_some()));
    }

    #[test]
    fn test_version_info_ordering() {
        let info = VersionInfo::new([3, 1, 2].map(|v| AppliedVersion {
            version: v,
            applied_on: None,
            description: None,
        }));
        assert_eq!(info.latest(), Some(3));
        assert_eq!(info.versions().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(info.is_applied(2));
        assert!(!info.is_applied(4));
    }

    #[test]
    fn test_description_is_truncated() {
        let long = "x".repeat(2000);
        assert_eq!(truncate_description(&long).len(), 1024);
    }

    #[tokio::test]
    async fn test_record_up_on_sql_server_stores_milliseconds() {
        let processor = ConnectionlessProcessor::new(
            DatabaseType::SqlServer,
            ProcessorOptions::default(),
            CompatibilityMode::Strict,
        );
        let meta = VersionTableMetadata::default();
        let loader = VersionLoader::new(&processor, &meta);
        loader.ensure_table().await.unwrap();
        let row = loader.record_up(1, "init").await.unwrap();

        let applied_on = row.applied_on.unwrap();
        assert_eq!(applied_on.nanosecond() % 1_000_000, 0);

        let insert = processor
            .statements()
            .into_iter()
            .find(|s| s.starts_with("INSERT INTO [VersionInfo]"))
            .unwrap();
        let literal = format!("'{}'", applied_on.format("%Y-%m-%dT%H:%M:%S%.3f"));
        assert!(insert.contains(&literal), "{}", insert);
        assert!(insert.contains("N'init'"));
    }
}
