//! Oracle SQL generation.
//!
//! Oracle schemas are users, so schema DDL is not generated. Columns are
//! changed with `MODIFY`, defaults precede `NOT NULL`, and foreign keys
//! accept only `ON DELETE` rules.

use crate::core::{ColumnDefinition, DbType, ForeignKeyDefinition, TypeMap};
use crate::dialect::{comment_on_statements, CompatibilityMode, Generator, Quoter};
use crate::error::Result;
use crate::expressions::{
    AlterColumn, AlterDefaultConstraint, CreateSchema, DeleteDefaultConstraint, DeleteSchema,
    TableRef,
};

use super::quoter::OracleQuoter;

/// Oracle generator.
#[derive(Debug, Clone)]
pub struct OracleGenerator {
    quoter: OracleQuoter,
    type_map: TypeMap,
    compatibility: CompatibilityMode,
}

impl OracleGenerator {
    pub fn new(compatibility: CompatibilityMode) -> Self {
        Self {
            quoter: OracleQuoter,
            type_map: type_map(),
            compatibility,
        }
    }
}

impl Default for OracleGenerator {
    fn default() -> Self {
        Self::new(CompatibilityMode::default())
    }
}

fn type_map() -> TypeMap {
    let mut map = TypeMap::new();
    map.set(DbType::AnsiStringFixedLength, "CHAR(255)")
        .set_sized(DbType::AnsiStringFixedLength, "CHAR($size)", 2000);
    map.set(DbType::AnsiString, "VARCHAR2(255)")
        .set_sized(DbType::AnsiString, "VARCHAR2($size)", 4000)
        .set_sized(DbType::AnsiString, "CLOB", TypeMap::MAX_SIZE);
    map.set(DbType::Binary, "RAW(2000)")
        .set_sized(DbType::Binary, "RAW($size)", 2000)
        .set_sized(DbType::Binary, "BLOB", TypeMap::MAX_SIZE);
    map.set(DbType::Boolean, "NUMBER(1,0)");
    map.set(DbType::Byte, "NUMBER(3,0)");
    map.set(DbType::Currency, "NUMBER(19,4)");
    map.set(DbType::Date, "DATE");
    map.set(DbType::DateTime, "TIMESTAMP(4)");
    map.set(DbType::DateTime2, "TIMESTAMP(7)");
    map.set(DbType::DateTimeOffset, "TIMESTAMP(4) WITH TIME ZONE");
    map.set(DbType::Decimal, "NUMBER(19,5)")
        .set_sized(DbType::Decimal, "NUMBER($size,$precision)", 38);
    map.set(DbType::Double, "DOUBLE PRECISION");
    map.set(DbType::Guid, "RAW(16)");
    map.set(DbType::Int16, "NUMBER(5,0)");
    map.set(DbType::Int32, "NUMBER(10,0)");
    map.set(DbType::Int64, "NUMBER(19,0)");
    map.set(DbType::Json, "CLOB");
    map.set(DbType::Single, "FLOAT(24)");
    map.set(DbType::StringFixedLength, "NCHAR(255)")
        .set_sized(DbType::StringFixedLength, "NCHAR($size)", 2000);
    map.set(DbType::String, "NVARCHAR2(255)")
        .set_sized(DbType::String, "NVARCHAR2($size)", 2000)
        .set_sized(DbType::String, "NCLOB", TypeMap::MAX_SIZE);
    map.set(DbType::Time, "DATE");
    map.set(DbType::Xml, "XMLTYPE");
    map
}

impl Generator for OracleGenerator {
    fn name(&self) -> &str {
        "oracle"
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
        let mut clause = "GENERATED BY DEFAULT ON NULL AS IDENTITY".to_string();
        if column.identity_seed.is_some() || column.identity_increment.is_some() {
            clause.push_str(&format!(
                " (START WITH {} INCREMENT BY {})",
                column.identity_seed.unwrap_or(1),
                column.identity_increment.unwrap_or(1)
            ));
        }
        Ok(Some(clause))
    }

    fn default_before_nullable(&self) -> bool {
        true
    }

    fn description_statements(
        &self,
        table: &TableRef,
        table_description: Option<&str>,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<String>> {
        comment_on_statements(self, table, table_description, columns)
    }

    fn create_schema(&self, _e: &CreateSchema) -> Result<Vec<String>> {
        self.unsupported("schema creation")
    }

    fn delete_schema(&self, _e: &DeleteSchema) -> Result<Vec<String>> {
        self.unsupported("schema deletion")
    }

    fn add_column_keyword(&self) -> &str {
        "ADD"
    }

    fn alter_column(&self, e: &AlterColumn) -> Result<Vec<String>> {
        let mut statements = vec![format!(
            "ALTER TABLE {} MODIFY {}",
            self.table_name(&e.table)?,
            self.column_clause(&e.table, &e.column, false)?
        )];
        statements.extend(self.description_statements(
            &e.table,
            None,
            std::slice::from_ref(&e.column),
        )?);
        Ok(statements)
    }

    fn alter_default_constraint(&self, e: &AlterDefaultConstraint) -> Result<Vec<String>> {
        let value = self
            .default_value(&e.default)?
            .unwrap_or_else(|| "NULL".to_string());
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY {} DEFAULT {}",
            self.table_name(&e.table)?,
            self.quote(&e.column)?,
            value
        )])
    }

    fn delete_default_constraint(&self, e: &DeleteDefaultConstraint) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY {} DEFAULT NULL",
            self.table_name(&e.table)?,
            self.quote(&e.column)?
        )])
    }

    fn referential_rules(&self, fk: &ForeignKeyDefinition) -> Result<String> {
        if fk.on_update.as_sql().is_some() {
            self.unsupported_feature("ON UPDATE rules")?;
        }
        Ok(fk
            .on_delete
            .as_sql()
            .map(|action| format!(" ON DELETE {}", action))
            .unwrap_or_default())
    }

    fn no_cache_clause(&self) -> &str {
        "NOCACHE"
    }
}
