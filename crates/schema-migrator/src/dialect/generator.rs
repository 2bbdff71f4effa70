//! Expression to SQL translation (Template Method pattern).
//!
//! [`Generator::generate`] validates an expression and dispatches to one
//! method per expression kind. The default methods emit ANSI-style SQL;
//! dialects implement the four required accessors and override the
//! methods whose syntax differs. Shared clause builders (column clause,
//! foreign key clause, WHERE clause, ...) are themselves overridable hooks.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{
    ColumnDefinition, ConstraintDefinition, ConstraintKind, DefaultValue, Direction,
    ForeignKeyDefinition, IndexColumn, IndexDefinition, TypeMap,
};
use crate::error::{MigrateError, Result};
use crate::expressions::{
    AlterColumn, AlterDefaultConstraint, AlterSchema, AlterTable, CreateColumn, CreateConstraint,
    CreateForeignKey, CreateIndex, CreateSchema, CreateSequence, CreateTable, DataRow, DeleteColumn,
    DeleteConstraint, DeleteData, DeleteDefaultConstraint, DeleteForeignKey, DeleteIndex,
    DeleteSchema, DeleteSequence, DeleteTable, ExecuteSql, Expression, InsertData, RenameColumn,
    RenameTable, TableRef, UpdateData,
};

use super::quoter::Quoter;

/// How a generator reacts to operations its dialect cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityMode {
    /// Fail with `MigrateError::Unsupported`.
    #[default]
    Strict,
    /// Log a warning and emit nothing.
    Loose,
}

impl CompatibilityMode {
    /// Parse a compatibility mode from a string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strict" | "" => Ok(CompatibilityMode::Strict),
            "loose" => Ok(CompatibilityMode::Loose),
            other => Err(MigrateError::Config(format!(
                "Invalid compatibility mode '{}'. Valid values: strict, loose",
                other
            ))),
        }
    }
}

/// Translate expressions into dialect SQL.
pub trait Generator: Send + Sync {
    /// Dialect identifier (e.g. "postgres").
    fn name(&self) -> &str;

    fn quoter(&self) -> &dyn Quoter;

    fn type_map(&self) -> &TypeMap;

    fn compatibility(&self) -> CompatibilityMode;

    /// Validate an expression and translate it into zero or more statements.
    fn generate(&self, expression: &Expression) -> Result<Vec<String>> {
        expression.ensure_valid()?;
        match expression {
            Expression::CreateSchema(e) => self.create_schema(e),
            Expression::DeleteSchema(e) => self.delete_schema(e),
            Expression::AlterSchema(e) => self.alter_schema(e),
            Expression::CreateTable(e) => self.create_table(e),
            Expression::AlterTable(e) => self.alter_table(e),
            Expression::DeleteTable(e) => self.delete_table(e),
            Expression::RenameTable(e) => self.rename_table(e),
            Expression::CreateColumn(e) => self.create_column(e),
            Expression::AlterColumn(e) => self.alter_column(e),
            Expression::DeleteColumn(e) => self.delete_column(e),
            Expression::RenameColumn(e) => self.rename_column(e),
            Expression::AlterDefaultConstraint(e) => self.alter_default_constraint(e),
            Expression::DeleteDefaultConstraint(e) => self.delete_default_constraint(e),
            Expression::CreateForeignKey(e) => self.create_foreign_key(e),
            Expression::DeleteForeignKey(e) => self.delete_foreign_key(e),
            Expression::CreateIndex(e) => self.create_index(e),
            Expression::DeleteIndex(e) => self.delete_index(e),
            Expression::CreateConstraint(e) => self.create_constraint(e),
            Expression::DeleteConstraint(e) => self.delete_constraint(e),
            Expression::CreateSequence(e) => self.create_sequence(e),
            Expression::DeleteSequence(e) => self.delete_sequence(e),
            Expression::InsertData(e) => self.insert_data(e),
            Expression::UpdateData(e) => self.update_data(e),
            Expression::DeleteData(e) => self.delete_data(e),
            Expression::ExecuteSql(e) => self.execute_sql(e),
        }
    }

    // ===== Compatibility =====

    /// Result for a whole operation the dialect cannot express.
    fn unsupported(&self, operation: &str) -> Result<Vec<String>> {
        match self.compatibility() {
            CompatibilityMode::Strict => Err(MigrateError::unsupported(self.name(), operation)),
            CompatibilityMode::Loose => {
                warn!("{} does not support {}; skipping", self.name(), operation);
                Ok(Vec::new())
            }
        }
    }

    /// Drop an optional part of an operation the dialect cannot express.
    fn unsupported_feature(&self, feature: &str) -> Result<()> {
        match self.compatibility() {
            CompatibilityMode::Strict => Err(MigrateError::unsupported(self.name(), feature)),
            CompatibilityMode::Loose => {
                warn!("{} does not support {}; ignoring", self.name(), feature);
                Ok(())
            }
        }
    }

    // ===== Names =====

    fn quote(&self, name: &str) -> Result<String> {
        self.quoter().quote(name)
    }

    fn table_name(&self, table: &TableRef) -> Result<String> {
        self.quoter().quote_table(&table.name, table.schema())
    }

    fn quote_list(&self, names: &[String]) -> Result<String> {
        let quoted = names
            .iter()
            .map(|n| self.quote(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(quoted.join(", "))
    }

    // ===== Column clauses =====

    /// SQL type of a column: the custom type verbatim, else the type map.
    fn column_type(&self, column: &ColumnDefinition) -> Result<String> {
        if let Some(custom) = &column.custom_type {
            return Ok(custom.clone());
        }
        let db_type = column.db_type.ok_or_else(|| {
            MigrateError::Generation(format!("Column '{}' has no type", column.name))
        })?;
        self.type_map().get(db_type, column.size, column.precision)
    }

    fn collation_clause(&self, column: &ColumnDefinition) -> Option<String> {
        column.collation.as_ref().map(|c| format!("COLLATE {}", c))
    }

    fn identity_clause(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        if !column.is_identity {
            return Ok(None);
        }
        Ok(Some("GENERATED BY DEFAULT AS IDENTITY".to_string()))
    }

    fn nullable_clause(&self, column: &ColumnDefinition) -> Option<String> {
        let clause = if column.nullable() { "NULL" } else { "NOT NULL" };
        Some(clause.to_string())
    }

    /// Render a default as SQL, `None` when no default is set.
    fn default_value(&self, default: &DefaultValue) -> Result<Option<String>> {
        match default {
            DefaultValue::None => Ok(None),
            DefaultValue::Value(v) => Ok(Some(self.quoter().quote_value(v))),
            DefaultValue::Method(m) => self.quoter().format_system_method(*m).map(Some),
        }
    }

    fn default_clause(&self, _table: &TableRef, column: &ColumnDefinition) -> Result<Option<String>> {
        Ok(self
            .default_value(&column.default)?
            .map(|v| format!("DEFAULT {}", v)))
    }

    /// Oracle and HANA require `DEFAULT` ahead of `NOT NULL`.
    fn default_before_nullable(&self) -> bool {
        false
    }

    /// Full column clause: name, type, collation, identity, nullability, default.
    fn column_clause(
        &self,
        table: &TableRef,
        column: &ColumnDefinition,
        inline_primary_key: bool,
    ) -> Result<String> {
        let mut parts = vec![self.quote(&column.name)?, self.column_type(column)?];
        parts.extend(self.collation_clause(column));
        parts.extend(self.identity_clause(column)?);
        if self.default_before_nullable() {
            parts.extend(self.default_clause(table, column)?);
            parts.extend(self.nullable_clause(column));
        } else {
            parts.extend(self.nullable_clause(column));
            parts.extend(self.default_clause(table, column)?);
        }
        if inline_primary_key && column.is_primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        Ok(parts.join(" "))
    }

    /// Primary key constraint name for CREATE TABLE; `None` leaves it unnamed.
    fn primary_key_name(&self, _table: &TableRef, columns: &[&ColumnDefinition]) -> Option<String> {
        columns.iter().find_map(|c| c.primary_key_name.clone())
    }

    /// Follow-up index statements for columns flagged unique or indexed.
    fn column_index_statements(
        &self,
        table: &TableRef,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for column in columns.iter().filter(|c| c.is_unique || c.is_indexed) {
            let index = IndexDefinition {
                schema: table.schema.clone(),
                table: table.name.clone(),
                columns: vec![IndexColumn::new(&column.name, Direction::Ascending)],
                is_unique: column.is_unique,
                ..Default::default()
            };
            statements.extend(self.create_index(&CreateIndex {
                index,
                if_not_exists: false,
            })?);
        }
        Ok(statements)
    }

    /// Statements attaching table/column descriptions.
    fn description_statements(
        &self,
        _table: &TableRef,
        table_description: Option<&str>,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<String>> {
        if table_description.is_some() || columns.iter().any(|c| c.description.is_some()) {
            self.unsupported_feature("table and column descriptions")?;
        }
        Ok(Vec::new())
    }

    // ===== Schemas =====

    fn create_schema(&self, e: &CreateSchema) -> Result<Vec<String>> {
        Ok(vec![format!("CREATE SCHEMA {}", self.quote(&e.name)?)])
    }

    fn delete_schema(&self, e: &DeleteSchema) -> Result<Vec<String>> {
        Ok(vec![format!("DROP SCHEMA {}", self.quote(&e.name)?)])
    }

    fn alter_schema(&self, _e: &AlterSchema) -> Result<Vec<String>> {
        self.unsupported("moving tables between schemas")
    }

    // ===== Tables =====

    fn create_table_keyword(&self) -> &str {
        "CREATE TABLE"
    }

    fn create_table(&self, e: &CreateTable) -> Result<Vec<String>> {
        let mut definitions = e
            .columns
            .iter()
            .map(|c| self.column_clause(&e.table, c, false))
            .collect::<Result<Vec<_>>>()?;

        let pk_columns: Vec<&ColumnDefinition> =
            e.columns.iter().filter(|c| c.is_primary_key).collect();
        if !pk_columns.is_empty() {
            let names: Vec<String> = pk_columns.iter().map(|c| c.name.clone()).collect();
            let cols = self.quote_list(&names)?;
            let clause = match self.primary_key_name(&e.table, &pk_columns) {
                Some(name) => format!("CONSTRAINT {} PRIMARY KEY ({})", self.quote(&name)?, cols),
                None => format!("PRIMARY KEY ({})", cols),
            };
            definitions.push(clause);
        }

        let mut statements = vec![format!(
            "{} {} ({})",
            self.create_table_keyword(),
            self.table_name(&e.table)?,
            definitions.join(", ")
        )];
        statements.extend(self.column_index_statements(&e.table, &e.columns)?);
        statements.extend(self.description_statements(
            &e.table,
            e.description.as_deref(),
            &e.columns,
        )?);
        Ok(statements)
    }

    fn alter_table(&self, e: &AlterTable) -> Result<Vec<String>> {
        self.description_statements(&e.table, e.description.as_deref(), &[])
    }

    fn delete_table(&self, e: &DeleteTable) -> Result<Vec<String>> {
        Ok(vec![format!("DROP TABLE {}", self.table_name(&e.table)?)])
    }

    fn rename_table(&self, e: &RenameTable) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            self.table_name(&e.table)?,
            self.quote(&e.new_name)?
        )])
    }

    // ===== Columns =====

    fn add_column_keyword(&self) -> &str {
        "ADD COLUMN"
    }

    fn create_column(&self, e: &CreateColumn) -> Result<Vec<String>> {
        let column = std::slice::from_ref(&e.column);
        let mut statements = vec![format!(
            "ALTER TABLE {} {} {}",
            self.table_name(&e.table)?,
            self.add_column_keyword(),
            self.column_clause(&e.table, &e.column, true)?
        )];
        statements.extend(self.column_index_statements(&e.table, column)?);
        statements.extend(self.description_statements(&e.table, None, column)?);
        Ok(statements)
    }

    fn alter_column(&self, e: &AlterColumn) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.table_name(&e.table)?,
            self.column_clause(&e.table, &e.column, false)?
        )])
    }

    fn delete_column(&self, e: &DeleteColumn) -> Result<Vec<String>> {
        let table = self.table_name(&e.table)?;
        e.columns
            .iter()
            .map(|c| Ok(format!("ALTER TABLE {} DROP COLUMN {}", table, self.quote(c)?)))
            .collect()
    }

    fn rename_column(&self, e: &RenameColumn) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.table_name(&e.table)?,
            self.quote(&e.old_name)?,
            self.quote(&e.new_name)?
        )])
    }

    fn alter_default_constraint(&self, e: &AlterDefaultConstraint) -> Result<Vec<String>> {
        let table = self.table_name(&e.table)?;
        let column = self.quote(&e.column)?;
        let sql = match self.default_value(&e.default)? {
            Some(value) => format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                table, column, value
            ),
            None => format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT", table, column),
        };
        Ok(vec![sql])
    }

    fn delete_default_constraint(&self, e: &DeleteDefaultConstraint) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
            self.table_name(&e.table)?,
            self.quote(&e.column)?
        )])
    }

    // ===== Foreign keys =====

    /// ` ON DELETE ... ON UPDATE ...` suffix.
    fn referential_rules(&self, fk: &ForeignKeyDefinition) -> Result<String> {
        let mut rules = String::new();
        if let Some(action) = fk.on_delete.as_sql() {
            rules.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = fk.on_update.as_sql() {
            rules.push_str(&format!(" ON UPDATE {}", action));
        }
        Ok(rules)
    }

    fn foreign_key_clause(&self, fk: &ForeignKeyDefinition) -> Result<String> {
        Ok(format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}",
            self.quote(&fk.resolved_name())?,
            self.quote_list(&fk.foreign_columns)?,
            self.quoter()
                .quote_table(&fk.primary_table, fk.primary_schema.as_deref())?,
            self.quote_list(&fk.primary_columns)?,
            self.referential_rules(fk)?
        ))
    }

    fn create_foreign_key(&self, e: &CreateForeignKey) -> Result<Vec<String>> {
        let fk = &e.foreign_key;
        Ok(vec![format!(
            "ALTER TABLE {} ADD {}",
            self.quoter()
                .quote_table(&fk.foreign_table, fk.foreign_schema.as_deref())?,
            self.foreign_key_clause(fk)?
        )])
    }

    fn delete_foreign_key(&self, e: &DeleteForeignKey) -> Result<Vec<String>> {
        let fk = &e.foreign_key;
        Ok(vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quoter()
                .quote_table(&fk.foreign_table, fk.foreign_schema.as_deref())?,
            self.quote(&fk.resolved_name())?
        )])
    }

    // ===== Indexes =====

    fn index_columns(&self, index: &IndexDefinition) -> Result<String> {
        let columns = index
            .columns
            .iter()
            .map(|c| Ok(format!("{} {}", self.quote(&c.name)?, c.direction.as_sql())))
            .collect::<Result<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    fn create_index(&self, e: &CreateIndex) -> Result<Vec<String>> {
        let index = &e.index;
        if !index.include.is_empty() {
            self.unsupported_feature("index INCLUDE columns")?;
        }
        if index.filter.is_some() {
            self.unsupported_feature("filtered indexes")?;
        }
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        Ok(vec![format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            self.quote(&index.resolved_name())?,
            self.quoter()
                .quote_table(&index.table, index.schema.as_deref())?,
            self.index_columns(index)?
        )])
    }

    fn delete_index(&self, e: &DeleteIndex) -> Result<Vec<String>> {
        let index = &e.index;
        Ok(vec![format!(
            "DROP INDEX {}",
            self.quoter()
                .quote_table(&index.resolved_name(), index.schema.as_deref())?
        )])
    }

    // ===== Constraints =====

    /// Clustering keyword after PRIMARY KEY/UNIQUE (SQL Server only).
    fn constraint_clustering(&self, _constraint: &ConstraintDefinition) -> &str {
        ""
    }

    fn create_constraint(&self, e: &CreateConstraint) -> Result<Vec<String>> {
        let c = &e.constraint;
        let kind = match c.kind {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::Unique => "UNIQUE",
        };
        Ok(vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {}{} ({})",
            self.quoter().quote_table(&c.table, c.schema.as_deref())?,
            self.quote(&c.resolved_name())?,
            kind,
            self.constraint_clustering(c),
            self.quote_list(&c.columns)?
        )])
    }

    fn delete_constraint(&self, e: &DeleteConstraint) -> Result<Vec<String>> {
        let c = &e.constraint;
        Ok(vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quoter().quote_table(&c.table, c.schema.as_deref())?,
            self.quote(&c.resolved_name())?
        )])
    }

    // ===== Sequences =====

    fn no_cache_clause(&self) -> &str {
        "NO CACHE"
    }

    fn create_sequence(&self, e: &CreateSequence) -> Result<Vec<String>> {
        let s = &e.sequence;
        let mut sql = format!(
            "CREATE SEQUENCE {}",
            self.quoter().quote_table(&s.name, s.schema.as_deref())?
        );
        if let Some(v) = s.increment {
            sql.push_str(&format!(" INCREMENT BY {}", v));
        }
        if let Some(v) = s.min_value {
            sql.push_str(&format!(" MINVALUE {}", v));
        }
        if let Some(v) = s.max_value {
            sql.push_str(&format!(" MAXVALUE {}", v));
        }
        if let Some(v) = s.start_with {
            sql.push_str(&format!(" START WITH {}", v));
        }
        match s.cache {
            Some(n) if n > 1 => sql.push_str(&format!(" CACHE {}", n)),
            Some(_) => {
                sql.push(' ');
                sql.push_str(self.no_cache_clause());
            }
            None => {}
        }
        if s.cycle {
            sql.push_str(" CYCLE");
        }
        Ok(vec![sql])
    }

    fn delete_sequence(&self, e: &DeleteSequence) -> Result<Vec<String>> {
        Ok(vec![format!(
            "DROP SEQUENCE {}",
            self.quoter().quote_table(&e.name, e.schema.as_deref())?
        )])
    }

    // ===== Data =====

    /// `a = 1 AND b IS NULL`.
    fn where_clause(&self, condition: &DataRow) -> Result<String> {
        let parts = condition
            .0
            .iter()
            .map(|(column, value)| {
                let column = self.quote(column)?;
                Ok(if value.is_null() {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} = {}", column, self.quoter().quote_value(value))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(" AND "))
    }

    fn insert_row(&self, table: &str, row: &DataRow) -> Result<String> {
        let columns = row
            .columns()
            .map(|c| self.quote(c))
            .collect::<Result<Vec<_>>>()?;
        let values: Vec<String> = row.values().map(|v| self.quoter().quote_value(v)).collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn insert_data(&self, e: &InsertData) -> Result<Vec<String>> {
        let table = self.table_name(&e.table)?;
        e.rows.iter().map(|row| self.insert_row(&table, row)).collect()
    }

    fn update_data(&self, e: &UpdateData) -> Result<Vec<String>> {
        let assignments = e
            .set
            .0
            .iter()
            .map(|(column, value)| {
                Ok(format!(
                    "{} = {}",
                    self.quote(column)?,
                    self.quoter().quote_value(value)
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let condition = if e.condition.is_empty() {
            "1 = 1".to_string()
        } else {
            self.where_clause(&e.condition)?
        };
        Ok(vec![format!(
            "UPDATE {} SET {} WHERE {}",
            self.table_name(&e.table)?,
            assignments.join(", "),
            condition
        )])
    }

    fn delete_data(&self, e: &DeleteData) -> Result<Vec<String>> {
        let table = self.table_name(&e.table)?;
        if e.all_rows {
            return Ok(vec![format!("DELETE FROM {}", table)]);
        }
        e.rows
            .iter()
            .map(|row| Ok(format!("DELETE FROM {} WHERE {}", table, self.where_clause(row)?)))
            .collect()
    }

    fn execute_sql(&self, e: &ExecuteSql) -> Result<Vec<String>> {
        Ok(vec![e.sql.clone()])
    }
}

/// `COMMENT ON TABLE/COLUMN` statements, shared by the dialects that support them.
pub(crate) fn comment_on_statements<G: Generator + ?Sized>(
    generator: &G,
    table: &TableRef,
    table_description: Option<&str>,
    columns: &[ColumnDefinition],
) -> Result<Vec<String>> {
    let quoter = generator.quoter();
    let table_sql = generator.table_name(table)?;
    let mut statements = Vec::new();
    if let Some(description) = table_description {
        statements.push(format!(
            "COMMENT ON TABLE {} IS {}",
            table_sql,
            quoter.format_string(description)
        ));
    }
    for column in columns {
        if let Some(description) = &column.description {
            statements.push(format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                table_sql,
                generator.quote(&column.name)?,
                quoter.format_string(description)
            ));
        }
    }
    Ok(statements)
}
