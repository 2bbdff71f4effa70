//! SQL Server SQL generation.
//!
//! SQL Server names every default constraint, so defaults are emitted as
//! `CONSTRAINT [DF_<table>_<column>] DEFAULT ...` and removed through a
//! lookup in `sys.default_constraints` before a column is altered or
//! dropped. Renames go through `sp_rename`, descriptions through
//! `MS_Description` extended properties.

use crate::core::identifier::validate_sql_fragment;
use crate::core::{ColumnDefinition, ConstraintDefinition, DbType, TypeMap};
use crate::dialect::{CompatibilityMode, Generator, Quoter};
use crate::error::Result;
use crate::expressions::{
    AlterColumn, AlterDefaultConstraint, AlterSchema, CreateIndex, DeleteColumn,
    DeleteDefaultConstraint, DeleteIndex, InsertData, RenameColumn, RenameTable, TableRef,
};

use super::quoter::MssqlQuoter;

const DEFAULT_SCHEMA: &str = "dbo";

/// SQL Server generator (2008 and later).
#[derive(Debug, Clone)]
pub struct MssqlGenerator {
    quoter: MssqlQuoter,
    type_map: TypeMap,
    compatibility: CompatibilityMode,
}

impl MssqlGenerator {
    pub fn new(compatibility: CompatibilityMode) -> Self {
        Self {
            quoter: MssqlQuoter,
            type_map: type_map(),
            compatibility,
        }
    }

    fn default_constraint_name(table: &TableRef, column: &str) -> String {
        format!("DF_{}_{}", table.name, column)
    }

    /// Batch dropping whatever default constraint is bound to a column.
    fn drop_default_batch(&self, table: &TableRef, column: &str) -> Result<String> {
        let table_sql = self.table_name(table)?;
        let object = self.quoter.format_string(&table_sql);
        Ok(format!(
            "DECLARE @default sysname, @sql nvarchar(max);\n\
             SELECT @default = name FROM sys.default_constraints \
             WHERE parent_object_id = OBJECT_ID({object}) \
             AND parent_column_id = COLUMNPROPERTY(OBJECT_ID({object}), {column}, 'ColumnId');\n\
             IF @default IS NOT NULL\n\
             BEGIN\n    \
             SET @sql = {prefix} + QUOTENAME(@default);\n    \
             EXEC sp_executesql @sql;\n\
             END",
            object = object,
            column = self.quoter.format_string(column),
            prefix = self
                .quoter
                .format_string(&format!("ALTER TABLE {} DROP CONSTRAINT ", table_sql)),
        ))
    }

    fn add_default_constraint(&self, table: &TableRef, column: &str, value: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {} FOR {}",
            self.table_name(table)?,
            self.quote(&Self::default_constraint_name(table, column))?,
            value,
            self.quote(column)?
        ))
    }

    /// Add-or-update of the `MS_Description` extended property.
    fn extended_property(
        &self,
        table: &TableRef,
        column: Option<&str>,
        description: &str,
    ) -> String {
        let q = &self.quoter;
        let schema = table.schema().unwrap_or(DEFAULT_SCHEMA);
        let (level2_list, level2_args) = match column {
            Some(col) => (
                format!("N'COLUMN', {}", q.format_string(col)),
                format!(
                    ", @level2type = N'COLUMN', @level2name = {}",
                    q.format_string(col)
                ),
            ),
            None => ("NULL, NULL".to_string(), String::new()),
        };
        let args = format!(
            "@name = N'MS_Description', @value = {}, @level0type = N'SCHEMA', @level0name = {}, \
             @level1type = N'TABLE', @level1name = {}{}",
            q.format_string(description),
            q.format_string(schema),
            q.format_string(&table.name),
            level2_args
        );
        format!(
            "IF EXISTS (SELECT 1 FROM fn_listextendedproperty(N'MS_Description', N'SCHEMA', {}, N'TABLE', {}, {}))\n    \
             EXEC sp_updateextendedproperty {}\n\
             ELSE\n    \
             EXEC sp_addextendedproperty {}",
            q.format_string(schema),
            q.format_string(&table.name),
            level2_list,
            args,
            args
        )
    }
}

impl Default for MssqlGenerator {
    fn default() -> Self {
        Self::new(CompatibilityMode::default())
    }
}

fn type_map() -> TypeMap {
    let mut map = TypeMap::new();
    map.set(DbType::AnsiStringFixedLength, "CHAR(255)")
        .set_sized(DbType::AnsiStringFixedLength, "CHAR($size)", 8000);
    map.set(DbType::AnsiString, "VARCHAR(255)")
        .set_sized(DbType::AnsiString, "VARCHAR($size)", 8000)
        .set_sized(DbType::AnsiString, "VARCHAR(MAX)", TypeMap::MAX_SIZE);
    map.set(DbType::Binary, "VARBINARY(8000)")
        .set_sized(DbType::Binary, "VARBINARY($size)", 8000)
        .set_sized(DbType::Binary, "VARBINARY(MAX)", TypeMap::MAX_SIZE);
    map.set(DbType::Boolean, "BIT");
    map.set(DbType::Byte, "TINYINT");
    map.set(DbType::Currency, "MONEY");
    map.set(DbType::Date, "DATE");
    map.set(DbType::DateTime, "DATETIME");
    map.set(DbType::DateTime2, "DATETIME2");
    map.set(DbType::DateTimeOffset, "DATETIMEOFFSET");
    map.set(DbType::Decimal, "DECIMAL(19,5)")
        .set_sized(DbType::Decimal, "DECIMAL($size,$precision)", 38);
    map.set(DbType::Double, "DOUBLE PRECISION");
    map.set(DbType::Guid, "UNIQUEIDENTIFIER");
    map.set(DbType::Int16, "SMALLINT");
    map.set(DbType::Int32, "INT");
    map.set(DbType::Int64, "BIGINT");
    map.set(DbType::Json, "NVARCHAR(MAX)");
    map.set(DbType::Single, "REAL");
    map.set(DbType::StringFixedLength, "NCHAR(255)")
        .set_sized(DbType::StringFixedLength, "NCHAR($size)", 4000);
    map.set(DbType::String, "NVARCHAR(255)")
        .set_sized(DbType::String, "NVARCHAR($size)", 4000)
        .set_sized(DbType::String, "NVARCHAR(MAX)", TypeMap::MAX_SIZE);
    map.set(DbType::Time, "TIME");
    map.set(DbType::Xml, "XML");
    map
}

impl Generator for MssqlGenerator {
    fn name(&self) -> &str {
        "sqlserver"
    }

    fn quoter(&self) -> &dyn Quoter {
        &self.quoter
    }

    fn type_map(&self) -> &TypeMap {
        &self.type_map
    }

    fn compatibility(&self) -> CompatibilityMode {
        self.compatibility
    }

    fn identity_clause(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        if !column.is_identity {
            return Ok(None);
        }
        Ok(Some(format!(
            "IDENTITY({},{})",
            column.identity_seed.unwrap_or(1),
            column.identity_increment.unwrap_or(1)
        )))
    }

    fn default_clause(&self, table: &TableRef, column: &ColumnDefinition) -> Result<Option<String>> {
        match self.default_value(&column.default)? {
            Some(value) => Ok(Some(format!(
                "CONSTRAINT {} DEFAULT {}",
                self.quote(&Self::default_constraint_name(table, &column.name))?,
                value
            ))),
            None => Ok(None),
        }
    }

    fn primary_key_name(&self, table: &TableRef, columns: &[&ColumnDefinition]) -> Option<String> {
        columns
            .iter()
            .find_map(|c| c.primary_key_name.clone())
            .or_else(|| Some(format!("PK_{}", table.name)))
    }

    fn description_statements(
        &self,
        table: &TableRef,
        table_description: Option<&str>,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        if let Some(description) = table_description {
            statements.push(self.extended_property(table, None, description));
        }
        for column in columns {
            if let Some(description) = &column.description {
                statements.push(self.extended_property(table, Some(&column.name), description));
            }
        }
        Ok(statements)
    }

    fn alter_schema(&self, e: &AlterSchema) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER SCHEMA {} TRANSFER {}",
            self.quote(&e.dest_schema)?,
            self.quoter.quote_table(&e.table, e.source_schema.as_deref())?
        )])
    }

    fn rename_table(&self, e: &RenameTable) -> Result<Vec<String>> {
        let old = self.table_name(&e.table)?;
        Ok(vec![format!(
            "EXEC sp_rename {}, {}",
            self.quoter.format_string(&old),
            self.quoter.format_string(&e.new_name)
        )])
    }

    fn add_column_keyword(&self) -> &str {
        "ADD"
    }

    fn alter_column(&self, e: &AlterColumn) -> Result<Vec<String>> {
        let column = &e.column;
        let default = self.default_value(&column.default)?;
        let mut statements = Vec::new();

        if default.is_some() {
            statements.push(self.drop_default_batch(&e.table, &column.name)?);
        }

        let mut parts = vec![self.quote(&column.name)?, self.column_type(column)?];
        parts.extend(self.collation_clause(column));
        parts.extend(self.nullable_clause(column));
        statements.push(format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.table_name(&e.table)?,
            parts.join(" ")
        ));

        if let Some(value) = default {
            statements.push(self.add_default_constraint(&e.table, &column.name, &value)?);
        }
        statements.extend(self.description_statements(
            &e.table,
            None,
            std::slice::from_ref(column),
        )?);
        Ok(statements)
    }

    fn delete_column(&self, e: &DeleteColumn) -> Result<Vec<String>> {
        let table = self.table_name(&e.table)?;
        let mut statements = Vec::new();
        for column in &e.columns {
            statements.push(self.drop_default_batch(&e.table, column)?);
            statements.push(format!(
                "ALTER TABLE {} DROP COLUMN {}",
                table,
                self.quote(column)?
            ));
        }
        Ok(statements)
    }

    fn rename_column(&self, e: &RenameColumn) -> Result<Vec<String>> {
        let old = format!("{}.{}", self.table_name(&e.table)?, self.quote(&e.old_name)?);
        Ok(vec![format!(
            "EXEC sp_rename {}, {}, N'COLUMN'",
            self.quoter.format_string(&old),
            self.quoter.format_string(&e.new_name)
        )])
    }

    fn alter_default_constraint(&self, e: &AlterDefaultConstraint) -> Result<Vec<String>> {
        let mut statements = vec![self.drop_default_batch(&e.table, &e.column)?];
        if let Some(value) = self.default_value(&e.default)? {
            statements.push(self.add_default_constraint(&e.table, &e.column, &value)?);
        }
        Ok(statements)
    }

    fn delete_default_constraint(&self, e: &DeleteDefaultConstraint) -> Result<Vec<String>> {
        Ok(vec![self.drop_default_batch(&e.table, &e.column)?])
    }

    fn create_index(&self, e: &CreateIndex) -> Result<Vec<String>> {
        let index = &e.index;
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        let clustered = if index.is_clustered { "CLUSTERED " } else { "" };
        let mut sql = format!(
            "CREATE {}{}INDEX {} ON {} ({})",
            unique,
            clustered,
            self.quote(&index.resolved_name())?,
            self.quoter
                .quote_table(&index.table, index.schema.as_deref())?,
            self.index_columns(index)?
        );
        if !index.include.is_empty() {
            sql.push_str(&format!(" INCLUDE ({})", self.quote_list(&index.include)?));
        }
        if let Some(filter) = &index.filter {
            validate_sql_fragment(filter)?;
            sql.push_str(&format!(" WHERE {}", filter));
        }
        Ok(vec![sql])
    }

    fn delete_index(&self, e: &DeleteIndex) -> Result<Vec<String>> {
        let index = &e.index;
        Ok(vec![format!(
            "DROP INDEX {} ON {}",
            self.quote(&index.resolved_name())?,
            self.quoter
                .quote_table(&index.table, index.schema.as_deref())?
        )])
    }

    fn constraint_clustering(&self, constraint: &ConstraintDefinition) -> &str {
        match constraint.clustered {
            Some(true) => " CLUSTERED",
            Some(false) => " NONCLUSTERED",
            None => "",
        }
    }

    fn insert_data(&self, e: &InsertData) -> Result<Vec<String>> {
        let table = self.table_name(&e.table)?;
        let mut statements = Vec::with_capacity(e.rows.len() + 2);
        if e.identity_insert {
            statements.push(format!("SET IDENTITY_INSERT {} ON", table));
        }
        for row in &e.rows {
            statements.push(self.insert_row(&table, row)?);
        }
        if e.identity_insert {
            statements.push(format!("SET IDENTITY_INSERT {} OFF", table));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ConstraintKind, DefaultValue, Direction, IndexColumn, IndexDefinition, SystemMethod, Value,
    };
    use crate::expressions::{CreateConstraint, CreateTable, DataRow, Expression};

    fn gen() -> MssqlGenerator {
        MssqlGenerator::default()
    }

    fn column(name: &str, db_type: DbType) -> ColumnDefinition {
        ColumnDefinition {
            db_type: Some(db_type),
            ..ColumnDefinition::new(name)
        }
    }

    fn users() -> TableRef {
        TableRef::new(Some("dbo"), "users")
    }

    #[test]
    fn test_create_table_with_identity_and_named_default() {
        let mut id = column("id", DbType::Int32);
        id.is_identity = true;
        id.is_primary_key = true;
        let mut created = column("created", DbType::DateTime2);
        created.default = DefaultValue::Method(SystemMethod::CurrentUtcDateTime);
        let mut name = column("name", DbType::String);
        name.size = Some(100);
        name.is_nullable = Some(true);

        let sql = gen()
            .generate(&Expression::CreateTable(CreateTable {
                table: users(),
                columns: vec![id, created, name],
                description: None,
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE [dbo].[users] ([id] INT IDENTITY(1,1) NOT NULL, \
                 [created] DATETIME2 NOT NULL CONSTRAINT [DF_users_created] DEFAULT GETUTCDATE(), \
                 [name] NVARCHAR(100) NULL, CONSTRAINT [PK_users] PRIMARY KEY ([id]))"
            ]
        );
    }

    #[test]
    fn test_type_map_max_sizes() {
        let map = type_map();
        assert_eq!(map.get(DbType::String, Some(4000), None).unwrap(), "NVARCHAR(4000)");
        assert_eq!(map.get(DbType::String, Some(4001), None).unwrap(), "NVARCHAR(MAX)");
        assert_eq!(map.get(DbType::AnsiString, None, None).unwrap(), "VARCHAR(255)");
        assert!(map.get(DbType::StringFixedLength, Some(5000), None).is_err());
    }

    #[test]
    fn test_alter_column_replaces_default_constraint() {
        let mut status = column("status", DbType::AnsiString);
        status.size = Some(20);
        status.default = DefaultValue::Value(Value::from("new"));
        let sql = gen()
            .generate(&Expression::AlterColumn(AlterColumn {
                table: users(),
                column: status,
            }))
            .unwrap();
        assert_eq!(sql.len(), 3);
        assert!(sql[0].contains("sys.default_constraints"));
        assert!(sql[0].contains("OBJECT_ID(N'[dbo].[users]')"));
        assert!(sql[0].contains("N'ALTER TABLE [dbo].[users] DROP CONSTRAINT ' + QUOTENAME(@default)"));
        assert_eq!(
            sql[1],
            "ALTER TABLE [dbo].[users] ALTER COLUMN [status] VARCHAR(20) NOT NULL"
        );
        assert_eq!(
            sql[2],
            "ALTER TABLE [dbo].[users] ADD CONSTRAINT [DF_users_status] DEFAULT N'new' FOR [status]"
        );
    }

    #[test]
    fn test_delete_column_drops_default_first() {
        let sql = gen()
            .generate(&Expression::DeleteColumn(DeleteColumn {
                table: users(),
                columns: vec!["a".into(), "b".into()],
                if_exists: false,
            }))
            .unwrap();
        assert_eq!(sql.len(), 4);
        assert!(sql[0].contains("COLUMNPROPERTY(OBJECT_ID(N'[dbo].[users]'), N'a', 'ColumnId')"));
        assert_eq!(sql[1], "ALTER TABLE [dbo].[users] DROP COLUMN [a]");
        assert_eq!(sql[3], "ALTER TABLE [dbo].[users] DROP COLUMN [b]");
    }

    #[test]
    fn test_renames_use_sp_rename() {
        let g = gen();
        let table = g
            .generate(&Expression::RenameTable(RenameTable {
                table: users(),
                new_name: "people".into(),
            }))
            .unwrap();
        assert_eq!(table[0], "EXEC sp_rename N'[dbo].[users]', N'people'");

        let column = g
            .generate(&Expression::RenameColumn(RenameColumn {
                table: users(),
                old_name: "name".into(),
                new_name: "full_name".into(),
            }))
            .unwrap();
        assert_eq!(
            column[0],
            "EXEC sp_rename N'[dbo].[users].[name]', N'full_name', N'COLUMN'"
        );
    }

    #[test]
    fn test_schema_transfer() {
        let sql = gen()
            .generate(&Expression::AlterSchema(AlterSchema {
                source_schema: Some("dbo".into()),
                table: "users".into(),
                dest_schema: "archive".into(),
            }))
            .unwrap();
        assert_eq!(sql[0], "ALTER SCHEMA [archive] TRANSFER [dbo].[users]");
    }

    #[test]
    fn test_clustered_filtered_index() {
        let index = IndexDefinition {
            schema: Some("dbo".into()),
            table: "users".into(),
            columns: vec![IndexColumn::new("email", Direction::Ascending)],
            is_unique: true,
            is_clustered: true,
            include: vec!["name".into()],
            filter: Some("[email] IS NOT NULL".into()),
            ..Default::default()
        };
        let g = gen();
        let create = g
            .generate(&Expression::CreateIndex(CreateIndex {
                index: index.clone(),
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            create[0],
            "CREATE UNIQUE CLUSTERED INDEX [IX_users_email] ON [dbo].[users] ([email] ASC) INCLUDE ([name]) WHERE [email] IS NOT NULL"
        );
        let drop = g
            .generate(&Expression::DeleteIndex(DeleteIndex {
                index,
                if_exists: false,
            }))
            .unwrap();
        assert_eq!(drop[0], "DROP INDEX [IX_users_email] ON [dbo].[users]");
    }

    #[test]
    fn test_nonclustered_primary_key_constraint() {
        let mut pk = ConstraintDefinition::new(ConstraintKind::PrimaryKey, "users");
        pk.schema = Some("dbo".into());
        pk.columns = vec!["id".into()];
        pk.clustered = Some(false);
        let sql = gen()
            .generate(&Expression::CreateConstraint(CreateConstraint { constraint: pk }))
            .unwrap();
        assert_eq!(
            sql[0],
            "ALTER TABLE [dbo].[users] ADD CONSTRAINT [PK_users] PRIMARY KEY NONCLUSTERED ([id])"
        );
    }

    #[test]
    fn test_identity_insert_wraps_rows() {
        let sql = gen()
            .generate(&Expression::InsertData(InsertData {
                table: users(),
                rows: vec![DataRow::new().set("id", 1).set("name", "Ada")],
                identity_insert: true,
            }))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "SET IDENTITY_INSERT [dbo].[users] ON",
                "INSERT INTO [dbo].[users] ([id], [name]) VALUES (1, N'Ada')",
                "SET IDENTITY_INSERT [dbo].[users] OFF",
            ]
        );
    }

    #[test]
    fn test_table_description_uses_extended_property() {
        let sql = gen()
            .description_statements(&TableRef::new(None, "users"), Some("People"), &[])
            .unwrap();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with(
            "IF EXISTS (SELECT 1 FROM fn_listextendedproperty(N'MS_Description', N'SCHEMA', N'dbo', N'TABLE', N'users', NULL, NULL))"
        ));
        assert!(sql[0].contains("EXEC sp_updateextendedproperty @name = N'MS_Description', @value = N'People'"));
        assert!(sql[0].contains("ELSE\n    EXEC sp_addextendedproperty"));
    }
}
