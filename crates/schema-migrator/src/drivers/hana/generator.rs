//! SAP HANA SQL generation.
//!
//! Tables are created as column-store tables. Column changes use the
//! parenthesised `ADD (..)`, `ALTER (..)` and `DROP (..)` forms.

use crate::core::{ColumnDefinition, DbType, TypeMap};
use crate::dialect::{comment_on_statements, CompatibilityMode, Generator, Quoter};
use crate::error::Result;
use crate::expressions::{
    AlterColumn, AlterDefaultConstraint, CreateColumn, DeleteColumn, DeleteDefaultConstraint,
    RenameColumn, RenameTable, TableRef,
};

use super::quoter::HanaQuoter;

/// SAP HANA generator.
#[derive(Debug, Clone)]
pub struct HanaGenerator {
    quoter: HanaQuoter,
    type_map: TypeMap,
    compatibility: CompatibilityMode,
}

impl HanaGenerator {
    pub fn new(compatibility: CompatibilityMode) -> Self {
        Self {
            quoter: HanaQuoter,
            type_map: type_map(),
            compatibility,
        }
    }
}

impl Default for HanaGenerator {
    fn default() -> Self {
        Self::new(CompatibilityMode::default())
    }
}

fn type_map() -> TypeMap {
    let mut map = TypeMap::new();
    for db_type in [DbType::AnsiStringFixedLength, DbType::AnsiString] {
        map.set(db_type, "VARCHAR(255)")
            .set_sized(db_type, "VARCHAR($size)", 5000)
            .set_sized(db_type, "CLOB", TypeMap::MAX_SIZE);
    }
    for db_type in [DbType::StringFixedLength, DbType::String] {
        map.set(db_type, "NVARCHAR(255)")
            .set_sized(db_type, "NVARCHAR($size)", 5000)
            .set_sized(db_type, "NCLOB", TypeMap::MAX_SIZE);
    }
    map.set(DbType::Binary, "VARBINARY(5000)")
        .set_sized(DbType::Binary, "VARBINARY($size)", 5000)
        .set_sized(DbType::Binary, "BLOB", TypeMap::MAX_SIZE);
    map.set(DbType::Boolean, "BOOLEAN");
    map.set(DbType::Byte, "TINYINT");
    map.set(DbType::Currency, "DECIMAL(19,4)");
    map.set(DbType::Date, "DATE");
    map.set(DbType::DateTime, "TIMESTAMP");
    map.set(DbType::DateTime2, "TIMESTAMP");
    map.set(DbType::Decimal, "DECIMAL(19,5)")
        .set_sized(DbType::Decimal, "DECIMAL($size,$precision)", 38);
    map.set(DbType::Double, "DOUBLE");
    map.set(DbType::Guid, "VARCHAR(36)");
    map.set(DbType::Int16, "SMALLINT");
    map.set(DbType::Int32, "INTEGER");
    map.set(DbType::Int64, "BIGINT");
    map.set(DbType::Json, "NCLOB");
    map.set(DbType::Single, "REAL");
    map.set(DbType::Time, "TIME");
    map.set(DbType::Xml, "NCLOB");
    map
}

impl Generator for HanaGenerator {
    fn name(&self) -> &str {
        "hana"
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
        let mut clause = "GENERATED BY DEFAULT AS IDENTITY".to_string();
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

    fn create_table_keyword(&self) -> &str {
        "CREATE COLUMN TABLE"
    }

    fn rename_table(&self, e: &RenameTable) -> Result<Vec<String>> {
        Ok(vec![format!(
            "RENAME TABLE {} TO {}",
            self.table_name(&e.table)?,
            self.quote(&e.new_name)?
        )])
    }

    fn create_column(&self, e: &CreateColumn) -> Result<Vec<String>> {
        let column = std::slice::from_ref(&e.column);
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD ({})",
            self.table_name(&e.table)?,
            self.column_clause(&e.table, &e.column, true)?
        )];
        statements.extend(self.column_index_statements(&e.table, column)?);
        statements.extend(self.description_statements(&e.table, None, column)?);
        Ok(statements)
    }

    fn alter_column(&self, e: &AlterColumn) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} ALTER ({})",
            self.table_name(&e.table)?,
            self.column_clause(&e.table, &e.column, false)?
        )])
    }

    fn delete_column(&self, e: &DeleteColumn) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} DROP ({})",
            self.table_name(&e.table)?,
            self.quote_list(&e.columns)?
        )])
    }

    fn rename_column(&self, e: &RenameColumn) -> Result<Vec<String>> {
        Ok(vec![format!(
            "RENAME COLUMN {}.{} TO {}",
            self.table_name(&e.table)?,
            self.quote(&e.old_name)?,
            self.quote(&e.new_name)?
        )])
    }

    // HANA can only change a default by restating the whole column.
    fn alter_default_constraint(&self, _e: &AlterDefaultConstraint) -> Result<Vec<String>> {
        self.unsupported("altering a default without the column definition")
    }

    fn delete_default_constraint(&self, _e: &DeleteDefaultConstraint) -> Result<Vec<String>> {
        self.unsupported("dropping a default without the column definition")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DefaultValue;
    use crate::core::Value;
    use crate::expressions::{CreateTable, Expression};

    fn gen() -> HanaGenerator {
        HanaGenerator::default()
    }

    fn column(name: &str, db_type: DbType) -> ColumnDefinition {
        ColumnDefinition {
            db_type: Some(db_type),
            ..ColumnDefinition::new(name)
        }
    }

    #[test]
    fn test_create_column_table() {
        let mut id = column("ID", DbType::Int32);
        id.is_identity = true;
        id.identity_seed = Some(1000);
        id.is_primary_key = true;
        let mut active = column("ACTIVE", DbType::Boolean);
        active.default = DefaultValue::Value(Value::from(true));

        let sql = gen()
            .generate(&Expression::CreateTable(CreateTable {
                table: TableRef::new(None, "USERS"),
                columns: vec![id, active],
                description: None,
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE COLUMN TABLE \"USERS\" (\"ID\" INTEGER GENERATED BY DEFAULT AS IDENTITY \
                 (START WITH 1000 INCREMENT BY 1) NOT NULL, \
                 \"ACTIVE\" BOOLEAN DEFAULT true NOT NULL, PRIMARY KEY (\"ID\"))"
            ]
        );
    }

    #[test]
    fn test_column_changes_use_parentheses() {
        let g = gen();
        let table = TableRef::new(None, "USERS");
        let mut name = column("NAME", DbType::String);
        name.size = Some(100);
        name.is_nullable = Some(true);

        let add = g
            .generate(&Expression::CreateColumn(CreateColumn {
                table: table.clone(),
                column: name.clone(),
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(add[0], "ALTER TABLE \"USERS\" ADD (\"NAME\" NVARCHAR(100) NULL)");

        let alter = g
            .generate(&Expression::AlterColumn(AlterColumn {
                table: table.clone(),
                column: name,
            }))
            .unwrap();
        assert_eq!(alter[0], "ALTER TABLE \"USERS\" ALTER (\"NAME\" NVARCHAR(100) NULL)");

        let drop = g
            .generate(&Expression::DeleteColumn(DeleteColumn {
                table: table.clone(),
                columns: vec!["NAME".into(), "AGE".into()],
                if_exists: false,
            }))
            .unwrap();
        assert_eq!(drop, vec!["ALTER TABLE \"USERS\" DROP (\"NAME\", \"AGE\")"]);

        let rename = g
            .generate(&Expression::RenameColumn(RenameColumn {
                table,
                old_name: "NAME".into(),
                new_name: "FULL_NAME".into(),
            }))
            .unwrap();
        assert_eq!(rename[0], "RENAME COLUMN \"USERS\".\"NAME\" TO \"FULL_NAME\"");
    }

    #[test]
    fn test_default_changes_are_unsupported() {
        let expr = Expression::DeleteDefaultConstraint(DeleteDefaultConstraint {
            table: TableRef::new(None, "USERS"),
            column: "ACTIVE".into(),
        });
        assert!(gen().generate(&expr).is_err());
        assert!(HanaGenerator::new(CompatibilityMode::Loose)
            .generate(&expr)
            .unwrap()
            .is_empty());
    }
}
