//! PostgreSQL SQL generation.
//!
//! Differences from the ANSI defaults:
//! - identity columns become `smallserial`/`serial`/`bigserial`
//! - ALTER COLUMN is split into `TYPE`, `SET/DROP NOT NULL` and `SET DEFAULT`
//! - tables move between schemas with `SET SCHEMA`
//! - descriptions use `COMMENT ON`
//! - indexes support `INCLUDE` and partial-index `WHERE`

use crate::core::identifier::validate_sql_fragment;
use crate::core::{ColumnDefinition, ColumnModification, DbType, TypeMap};
use crate::dialect::{comment_on_statements, CompatibilityMode, Generator, Quoter};
use crate::error::{MigrateError, Result};
use crate::expressions::{AlterColumn, AlterSchema, CreateIndex, TableRef};

use super::quoter::PostgresQuoter;

/// Largest length PostgreSQL accepts for `varchar(n)`/`char(n)`.
const MAX_CHAR_LENGTH: u32 = 10_485_760;

/// PostgreSQL generator.
#[derive(Debug, Clone)]
pub struct PostgresGenerator {
    quoter: PostgresQuoter,
    type_map: TypeMap,
    compatibility: CompatibilityMode,
}

impl PostgresGenerator {
    pub fn new(compatibility: CompatibilityMode) -> Self {
        Self {
            quoter: PostgresQuoter,
            type_map: type_map(),
            compatibility,
        }
    }
}

impl Default for PostgresGenerator {
    fn default() -> Self {
        Self::new(CompatibilityMode::default())
    }
}

fn type_map() -> TypeMap {
    let mut map = TypeMap::new();
    map.set(DbType::AnsiStringFixedLength, "char(255)")
        .set_sized(DbType::AnsiStringFixedLength, "char($size)", MAX_CHAR_LENGTH);
    map.set(DbType::AnsiString, "text")
        .set_sized(DbType::AnsiString, "varchar($size)", MAX_CHAR_LENGTH);
    map.set(DbType::Binary, "bytea")
        .set_sized(DbType::Binary, "bytea", TypeMap::MAX_SIZE);
    map.set(DbType::Boolean, "boolean");
    map.set(DbType::Byte, "smallint");
    map.set(DbType::Currency, "money");
    map.set(DbType::Date, "date");
    map.set(DbType::DateTime, "timestamp");
    map.set(DbType::DateTime2, "timestamp");
    map.set(DbType::DateTimeOffset, "timestamptz");
    map.set(DbType::Decimal, "decimal(19,5)")
        .set_sized(DbType::Decimal, "decimal($size,$precision)", 1000);
    map.set(DbType::Double, "float8");
    map.set(DbType::Guid, "uuid");
    map.set(DbType::Int16, "smallint");
    map.set(DbType::Int32, "integer");
    map.set(DbType::Int64, "bigint");
    map.set(DbType::Json, "jsonb");
    map.set(DbType::Single, "float4");
    map.set(DbType::StringFixedLength, "char(255)")
        .set_sized(DbType::StringFixedLength, "char($size)", MAX_CHAR_LENGTH);
    map.set(DbType::String, "text")
        .set_sized(DbType::String, "varchar($size)", MAX_CHAR_LENGTH);
    map.set(DbType::Time, "time");
    map.set(DbType::Xml, "xml");
    map
}

impl Generator for PostgresGenerator {
    fn name(&self) -> &str {
        "postgres"
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

    fn column_type(&self, column: &ColumnDefinition) -> Result<String> {
        if column.is_identity
            && column.custom_type.is_none()
            && column.modification == ColumnModification::Create
        {
            match column.db_type {
                Some(DbType::Int16) => return Ok("smallserial".to_string()),
                Some(DbType::Int32) => return Ok("serial".to_string()),
                Some(DbType::Int64) => return Ok("bigserial".to_string()),
                _ => {}
            }
        }
        if let Some(custom) = &column.custom_type {
            return Ok(custom.clone());
        }
        let db_type = column.db_type.ok_or_else(|| {
            MigrateError::Generation(format!("Column '{}' has no type", column.name))
        })?;
        self.type_map.get(db_type, column.size, column.precision)
    }

    fn identity_clause(&self, column: &ColumnDefinition) -> Result<Option<String>> {
        if column.is_identity && !matches!(
            column.db_type,
            Some(DbType::Int16 | DbType::Int32 | DbType::Int64)
        ) {
            self.unsupported_feature("identity on non-integer columns")?;
        }
        Ok(None)
    }

    fn description_statements(
        &self,
        table: &TableRef,
        table_description: Option<&str>,
        columns: &[ColumnDefinition],
    ) -> Result<Vec<String>> {
        comment_on_statements(self, table, table_description, columns)
    }

    fn alter_schema(&self, e: &AlterSchema) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} SET SCHEMA {}",
            self.quoter.quote_table(&e.table, e.source_schema.as_deref())?,
            self.quote(&e.dest_schema)?
        )])
    }

    fn alter_column(&self, e: &AlterColumn) -> Result<Vec<String>> {
        let column = &e.column;
        let name = self.quote(&column.name)?;

        let mut clauses = Vec::new();
        let mut type_clause = format!("ALTER {} TYPE {}", name, self.column_type(column)?);
        if let Some(collation) = self.collation_clause(column) {
            type_clause.push(' ');
            type_clause.push_str(&collation);
        }
        clauses.push(type_clause);

        match column.is_nullable {
            Some(true) => clauses.push(format!("ALTER {} DROP NOT NULL", name)),
            Some(false) => clauses.push(format!("ALTER {} SET NOT NULL", name)),
            None => {}
        }

        if let Some(default) = self.default_value(&column.default)? {
            clauses.push(format!("ALTER {} SET DEFAULT {}", name, default));
        }

        let mut statements = vec![format!(
            "ALTER TABLE {} {}",
            self.table_name(&e.table)?,
            clauses.join(", ")
        )];
        statements.extend(self.description_statements(
            &e.table,
            None,
            std::slice::from_ref(column),
        )?);
        Ok(statements)
    }

    fn create_index(&self, e: &CreateIndex) -> Result<Vec<String>> {
        let index = &e.index;
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        let mut sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
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

    fn no_cache_clause(&self) -> &str {
        "CACHE 1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DefaultValue, Direction, IndexColumn, IndexDefinition, SystemMethod, Value};
    use crate::expressions::{
        CreateColumn, CreateSequence, CreateTable, Expression, InsertData, DataRow,
    };
    use crate::core::SequenceDefinition;

    fn gen() -> PostgresGenerator {
        PostgresGenerator::default()
    }

    fn column(name: &str, db_type: DbType) -> ColumnDefinition {
        ColumnDefinition {
            db_type: Some(db_type),
            ..ColumnDefinition::new(name)
        }
    }

    fn users() -> TableRef {
        TableRef::new(Some("public"), "users")
    }

    #[test]
    fn test_create_table_with_serial_identity() {
        let mut id = column("id", DbType::Int64);
        id.is_identity = true;
        id.is_primary_key = true;
        let mut created = column("created", DbType::DateTimeOffset);
        created.default = DefaultValue::Method(SystemMethod::CurrentDateTime);

        let sql = gen()
            .generate(&Expression::CreateTable(CreateTable {
                table: users(),
                columns: vec![id, created],
                description: Some("Registered users".into()),
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"public\".\"users\" (\"id\" bigserial NOT NULL, \"created\" timestamptz NOT NULL DEFAULT now(), PRIMARY KEY (\"id\"))",
                "COMMENT ON TABLE \"public\".\"users\" IS 'Registered users'",
            ]
        );
    }

    #[test]
    fn test_type_map_sizes() {
        let map = type_map();
        assert_eq!(map.get(DbType::String, None, None).unwrap(), "text");
        assert_eq!(map.get(DbType::String, Some(64), None).unwrap(), "varchar(64)");
        assert_eq!(
            map.get(DbType::Decimal, Some(12), Some(2)).unwrap(),
            "decimal(12,2)"
        );
        assert!(map.get(DbType::String, Some(MAX_CHAR_LENGTH + 1), None).is_err());
    }

    #[test]
    fn test_alter_column_is_split_into_clauses() {
        let mut email = column("email", DbType::String);
        email.size = Some(320);
        email.is_nullable = Some(true);
        email.default = DefaultValue::Value(Value::from(""));
        email.modification = ColumnModification::Alter;

        let sql = gen()
            .generate(&Expression::AlterColumn(AlterColumn {
                table: users(),
                column: email,
            }))
            .unwrap();
        assert_eq!(
            sql[0],
            "ALTER TABLE \"public\".\"users\" ALTER \"email\" TYPE varchar(320), ALTER \"email\" DROP NOT NULL, ALTER \"email\" SET DEFAULT ''"
        );
    }

    #[test]
    fn test_alter_column_keeps_unspecified_nullability() {
        let mut name = column("name", DbType::String);
        name.size = Some(200);
        name.modification = ColumnModification::Alter;

        let sql = gen()
            .generate(&Expression::AlterColumn(AlterColumn {
                table: TableRef::new(None, "users"),
                column: name.clone(),
            }))
            .unwrap();
        assert_eq!(sql[0], "ALTER TABLE \"users\" ALTER \"name\" TYPE varchar(200)");

        name.is_nullable = Some(false);
        let sql = gen()
            .generate(&Expression::AlterColumn(AlterColumn {
                table: TableRef::new(None, "users"),
                column: name,
            }))
            .unwrap();
        assert_eq!(
            sql[0],
            "ALTER TABLE \"users\" ALTER \"name\" TYPE varchar(200), ALTER \"name\" SET NOT NULL"
        );
    }

    #[test]
    fn test_untyped_column_is_a_generation_error() {
        let err = gen().column_type(&ColumnDefinition::new("mystery")).unwrap_err();
        assert!(matches!(err, MigrateError::Generation(ref m) if m.contains("mystery")));
    }

    #[test]
    fn test_alter_schema() {
        let sql = gen()
            .generate(&Expression::AlterSchema(AlterSchema {
                source_schema: Some("public".into()),
                table: "users".into(),
                dest_schema: "archive".into(),
            }))
            .unwrap();
        assert_eq!(sql[0], "ALTER TABLE \"public\".\"users\" SET SCHEMA \"archive\"");
    }

    #[test]
    fn test_partial_index_with_include() {
        let index = IndexDefinition {
            schema: Some("public".into()),
            table: "users".into(),
            columns: vec![IndexColumn::new("email", Direction::Ascending)],
            is_unique: true,
            include: vec!["name".into()],
            filter: Some("deleted_at IS NULL".into()),
            ..Default::default()
        };
        let sql = gen()
            .generate(&Expression::CreateIndex(CreateIndex {
                index,
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            sql[0],
            "CREATE UNIQUE INDEX \"IX_users_email\" ON \"public\".\"users\" (\"email\" ASC) INCLUDE (\"name\") WHERE deleted_at IS NULL"
        );
    }

    #[test]
    fn test_index_filter_rejects_statement_chaining() {
        let index = IndexDefinition {
            table: "users".into(),
            columns: vec![IndexColumn::new("email", Direction::Ascending)],
            filter: Some("1=1; DROP TABLE users".into()),
            ..Default::default()
        };
        assert!(gen()
            .generate(&Expression::CreateIndex(CreateIndex {
                index,
                if_not_exists: false,
            }))
            .is_err());
    }

    #[test]
    fn test_add_column_with_comment() {
        let mut col = column("nickname", DbType::String);
        col.is_nullable = Some(true);
        col.description = Some("Display name".into());
        let sql = gen()
            .generate(&Expression::CreateColumn(CreateColumn {
                table: users(),
                column: col,
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE \"public\".\"users\" ADD COLUMN \"nickname\" text NULL",
                "COMMENT ON COLUMN \"public\".\"users\".\"nickname\" IS 'Display name'",
            ]
        );
    }

    #[test]
    fn test_sequence_without_cache() {
        let sql = gen()
            .generate(&Expression::CreateSequence(CreateSequence {
                sequence: SequenceDefinition {
                    schema: Some("public".into()),
                    name: "ids".into(),
                    cache: Some(0),
                    ..Default::default()
                },
                if_not_exists: false,
            }))
            .unwrap();
        assert_eq!(sql[0], "CREATE SEQUENCE \"public\".\"ids\" CACHE 1");
    }

    #[test]
    fn test_insert_booleans_and_bytes() {
        let sql = gen()
            .generate(&Expression::InsertData(InsertData {
                table: users(),
                rows: vec![DataRow::new()
                    .set("active", true)
                    .set("avatar", vec![0xff_u8])],
                identity_insert: false,
            }))
            .unwrap();
        assert_eq!(
            sql[0],
            "INSERT INTO \"public\".\"users\" (\"active\", \"avatar\") VALUES (true, '\\xff')"
        );
    }
}
