//! MySQL SQL generation.
//!
//! MySQL has no schemas separate from databases and no sequences; those
//! expressions go through the compatibility mode. Descriptions are stored
//! as `COMMENT` attributes rather than separate statements.

use crate::core::{ColumnDefinition, ConstraintKind, DbType, TypeMap};
use crate::dialect::{CompatibilityMode, Generator, Quoter};
use crate::error::Result;
use crate::expressions::{
    AlterColumn, AlterSchema, CreateSchema, CreateSequence, DeleteConstraint, DeleteForeignKey,
    DeleteIndex, DeleteSchema, DeleteSequence, RenameTable, TableRef,
};

use super::quoter::MysqlQuoter;

/// MySQL generator (5.7 and later).
#[derive(Debug, Clone)]
pub struct MysqlGenerator {
    quoter: MysqlQuoter,
    type_map: TypeMap,
    compatibility: CompatibilityMode,
}

impl MysqlGenerator {
    pub fn new(compatibility: CompatibilityMode) -> Self {
        Self {
            quoter: MysqlQuoter,
            type_map: type_map(),
            compatibility,
        }
    }
}

impl Default for MysqlGenerator {
    fn default() -> Self {
        Self::new(CompatibilityMode::default())
    }
}

fn type_map() -> TypeMap {
    let mut map = TypeMap::new();
    for db_type in [DbType::AnsiStringFixedLength, DbType::StringFixedLength] {
        map.set(db_type, "CHAR(255)")
            .set_sized(db_type, "CHAR($size)", 255);
    }
    for db_type in [DbType::AnsiString, DbType::String] {
        map.set(db_type, "VARCHAR(255)")
            .set_sized(db_type, "VARCHAR($size)", 16_383)
            .set_sized(db_type, "TEXT", 65_535)
            .set_sized(db_type, "MEDIUMTEXT", 16_777_215)
            .set_sized(db_type, "LONGTEXT", TypeMap::MAX_SIZE);
    }
    map.set(DbType::Binary, "LONGBLOB")
        .set_sized(DbType::Binary, "TINYBLOB", 255)
        .set_sized(DbType::Binary, "BLOB", 65_535)
        .set_sized(DbType::Binary, "MEDIUMBLOB", 16_777_215)
        .set_sized(DbType::Binary, "LONGBLOB", TypeMap::MAX_SIZE);
    map.set(DbType::Boolean, "TINYINT(1)");
    map.set(DbType::Byte, "TINYINT UNSIGNED");
    map.set(DbType::Currency, "DECIMAL(19,4)");
    map.set(DbType::Date, "DATE");
    map.set(DbType::DateTime, "DATETIME");
    map.set(DbType::DateTime2, "DATETIME(6)");
    map.set(DbType::DateTimeOffset, "TIMESTAMP");
    map.set(DbType::Decimal, "DECIMAL(19,5)")
        .set_sized(DbType::Decimal, "DECIMAL($size,$precision)", 65);
    map.set(DbType::Double, "DOUBLE");
    map.set(DbType::Guid, "CHAR(36)");
    map.set(DbType::Int16, "SMALLINT");
    map.set(DbType::Int32, "INTEGER");
    map.set(DbType::Int64, "BIGINT");
    map.set(DbType::Json, "JSON");
    map.set(DbType::Single, "FLOAT");
    map.set(DbType::Time, "TIME");
    map.set(DbType::Xml, "TEXT");
    map
}

impl Generator for MysqlGenerator {
    fn name(&self) -> &str {
        "mysql"
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
        Ok(column.is_identity.then(|| "AUTO_INCREMENT".to_string()))
    }

    /// `name type [COLLATE] NULL|NOT NULL [DEFAULT] [AUTO_INCREMENT] [PRIMARY KEY] [COMMENT]`.
    fn column_clause(
        &self,
        table: &TableRef,
        column: &ColumnDefinition,
        inline_primary_key: bool,
    ) -> Result<String> {
        let mut parts = vec![self.quote(&column.name)?, self.column_type(column)?];
        parts.extend(self.collation_clause(column));
        parts.extend(self.nullable_clause(column));
        parts.extend(self.default_clause(table, column)?);
        parts.extend(self.identity_clause(column)?);
        if inline_primary_key && column.is_primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if let Some(description) = &column.description {
            parts.push(format!("COMMENT {}", self.quoter.format_string(description)));
        }
        Ok(parts.join(" "))
    }

    fn description_statements(
        &self,
        table: &TableRef,
        table_description: Option<&str>,
        _columns: &[ColumnDefinition],
    ) -> Result<Vec<String>> {
        // Column comments are part of the column clause.
        let Some(description) = table_description else {
            return Ok(Vec::new());
        };
        Ok(vec![format!(
            "ALTER TABLE {} COMMENT = {}",
            self.table_name(table)?,
            self.quoter.format_string(description)
        )])
    }

    fn create_schema(&self, _e: &CreateSchema) -> Result<Vec<String>> {
        self.unsupported("schemas")
    }

    fn delete_schema(&self, _e: &DeleteSchema) -> Result<Vec<String>> {
        self.unsupported("schemas")
    }

    fn alter_schema(&self, _e: &AlterSchema) -> Result<Vec<String>> {
        self.unsupported("schemas")
    }

    fn rename_table(&self, e: &RenameTable) -> Result<Vec<String>> {
        Ok(vec![format!(
            "RENAME TABLE {} TO {}",
            self.table_name(&e.table)?,
            self.quoter.quote_table(&e.new_name, e.table.schema())?
        )])
    }

    fn alter_column(&self, e: &AlterColumn) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.table_name(&e.table)?,
            self.column_clause(&e.table, &e.column, false)?
        )])
    }

    fn delete_foreign_key(&self, e: &DeleteForeignKey) -> Result<Vec<String>> {
        let fk = &e.foreign_key;
        Ok(vec![format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quoter
                .quote_table(&fk.foreign_table, fk.foreign_schema.as_deref())?,
            self.quote(&fk.resolved_name())?
        )])
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

    fn delete_constraint(&self, e: &DeleteConstraint) -> Result<Vec<String>> {
        let c = &e.constraint;
        let table = self.quoter.quote_table(&c.table, c.schema.as_deref())?;
        let sql = match c.kind {
            ConstraintKind::PrimaryKey => format!("ALTER TABLE {} DROP PRIMARY KEY", table),
            ConstraintKind::Unique => format!(
                "ALTER TABLE {} DROP INDEX {}",
                table,
                self.quote(&c.resolved_name())?
            ),
        };
        Ok(vec![sql])
    }

    fn create_sequence(&self, _e: &CreateSequence) -> Result<Vec<String>> {
        self.unsupported("sequences")
    }

    fn delete_sequence(&self, _e: &DeleteSequence) -> Result<Vec<String>> {
        self.unsupported("sequences")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConstraintDefinition, DefaultValue, SequenceDefinition, SystemMethod};
    use crate::expressions::{CreateTable, Expression};

    fn gen() -> MysqlGenerator {
        MysqlGenerator::default()
    }

    fn column(name: &str, db_type: DbType) -> ColumnDefinition {
        ColumnDefinition {
            db_type: Some(db_type),
            ..ColumnDefinition::new(name)
        }
    }

    #[test]
    fn test_create_table_with_auto_increment_and_comments() {
        let mut id = column("id", DbType::Int64);
        id.is_identity = true;
        id.is_primary_key = true;
        let mut created = column("created", DbType::DateTime);
        created.default = DefaultValue::Method(SystemMethod::CurrentDateTime);
        created.description = Some("Row creation".into());

        let sql = gen()
            .generate(&Expression::CreateTable(CreateTable {
                table: TableRef::new(None, "users"),
                columns: vec![id, created],
                description: Some("User's accounts".into()),
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE `users` (`id` BIGINT NOT NULL AUTO_INCREMENT, \
                 `created` DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP COMMENT 'Row creation', \
                 PRIMARY KEY (`id`))",
                "ALTER TABLE `users` COMMENT = 'User''s accounts'",
            ]
        );
    }

    #[test]
    fn test_text_types_by_size() {
        let map = type_map();
        assert_eq!(map.get(DbType::String, Some(100), None).unwrap(), "VARCHAR(100)");
        assert_eq!(map.get(DbType::String, Some(20_000), None).unwrap(), "TEXT");
        assert_eq!(map.get(DbType::String, Some(70_000), None).unwrap(), "MEDIUMTEXT");
        assert_eq!(map.get(DbType::Binary, None, None).unwrap(), "LONGBLOB");
    }

    #[test]
    fn test_alter_column_uses_modify() {
        let mut name = column("name", DbType::String);
        name.size = Some(200);
        name.is_nullable = Some(true);
        let sql = gen()
            .generate(&Expression::AlterColumn(AlterColumn {
                table: TableRef::new(None, "users"),
                column: name,
            }))
            .unwrap();
        assert_eq!(sql[0], "ALTER TABLE `users` MODIFY COLUMN `name` VARCHAR(200) NULL");
    }

    #[test]
    fn test_drop_constraints() {
        let g = gen();
        let mut pk = ConstraintDefinition::new(ConstraintKind::PrimaryKey, "users");
        pk.columns = vec!["id".into()];
        let sql = g
            .generate(&Expression::DeleteConstraint(DeleteConstraint {
                constraint: pk,
                if_exists: false,
            }))
            .unwrap();
        assert_eq!(sql[0], "ALTER TABLE `users` DROP PRIMARY KEY");

        let mut uc = ConstraintDefinition::new(ConstraintKind::Unique, "users");
        uc.columns = vec!["email".into()];
        let sql = g
            .generate(&Expression::DeleteConstraint(DeleteConstraint {
                constraint: uc,
                if_exists: false,
            }))
            .unwrap();
        assert_eq!(sql[0], "ALTER TABLE `users` DROP INDEX `UC_users_email`");
    }

    #[test]
    fn test_rename_table() {
        let sql = gen()
            .generate(&Expression::RenameTable(RenameTable {
                table: TableRef::new(Some("shop"), "users"),
                new_name: "customers".into(),
            }))
            .unwrap();
        assert_eq!(sql[0], "RENAME TABLE `shop`.`users` TO `shop`.`customers`");
    }

    #[test]
    fn test_schemas_and_sequences_are_unsupported() {
        let create = Expression::CreateSequence(CreateSequence {
            sequence: SequenceDefinition {
                name: "ids".into(),
                ..Default::default()
            },
            if_not_exists: false,
        });
        let err = gen().generate(&create).unwrap_err();
        assert_eq!(err.to_string(), "mysql does not support sequences");

        let loose = MysqlGenerator::new(CompatibilityMode::Loose);
        assert!(loose
            .generate(&Expression::CreateSchema(CreateSchema {
                name: "app".into(),
                if_not_exists: false,
            }))
            .unwrap()
            .is_empty());
    }
}
