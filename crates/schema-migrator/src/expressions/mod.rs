//! The expression model.
//!
//! A migration is an ordered list of [`Expression`]s, each describing one
//! schema or data change as plain data. Expressions know how to validate
//! themselves, how to produce their inverse (for auto-reversing
//! migrations) and which existence precondition, if any, guards them.
//! They know nothing about SQL: that is the generators' job.

mod data;

pub use data::{DataRow, DeleteData, ExecuteSql, InsertData, UpdateData};

use serde::{Deserialize, Serialize};

use crate::core::{
    ColumnDefinition, ConstraintDefinition, DefaultValue, ForeignKeyDefinition, IndexDefinition,
    SequenceDefinition,
};
use crate::error::{MigrateError, Result};

/// Optionally schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.into(),
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    fn validate(&self, errors: &mut Vec<String>) {
        if self.name.is_empty() {
            errors.push("Table name cannot be empty".to_string());
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSchema {
    pub name: String,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSchema {
    pub name: String,
    pub if_exists: bool,
}

/// Move a table into another schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterSchema {
    pub source_schema: Option<String>,
    pub table: String,
    pub dest_schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDefinition>,
    pub description: Option<String>,
    pub if_not_exists: bool,
}

/// Table-level alteration (currently the table comment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTable {
    pub table: TableRef,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTable {
    pub table: TableRef,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTable {
    pub table: TableRef,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateColumn {
    pub table: TableRef,
    pub column: ColumnDefinition,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterColumn {
    pub table: TableRef,
    pub column: ColumnDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteColumn {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameColumn {
    pub table: TableRef,
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterDefaultConstraint {
    pub table: TableRef,
    pub column: String,
    pub default: DefaultValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteDefaultConstraint {
    pub table: TableRef,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateForeignKey {
    pub foreign_key: ForeignKeyDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteForeignKey {
    pub foreign_key: ForeignKeyDefinition,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndex {
    pub index: IndexDefinition,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteIndex {
    pub index: IndexDefinition,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConstraint {
    pub constraint: ConstraintDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteConstraint {
    pub constraint: ConstraintDefinition,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSequence {
    pub sequence: SequenceDefinition,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSequence {
    pub schema: Option<String>,
    pub name: String,
    pub if_exists: bool,
}

/// One schema or data change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    CreateSchema(CreateSchema),
    DeleteSchema(DeleteSchema),
    AlterSchema(AlterSchema),
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    DeleteTable(DeleteTable),
    RenameTable(RenameTable),
    CreateColumn(CreateColumn),
    AlterColumn(AlterColumn),
    DeleteColumn(DeleteColumn),
    RenameColumn(RenameColumn),
    AlterDefaultConstraint(AlterDefaultConstraint),
    DeleteDefaultConstraint(DeleteDefaultConstraint),
    CreateForeignKey(CreateForeignKey),
    DeleteForeignKey(DeleteForeignKey),
    CreateIndex(CreateIndex),
    DeleteIndex(DeleteIndex),
    CreateConstraint(CreateConstraint),
    DeleteConstraint(DeleteConstraint),
    CreateSequence(CreateSequence),
    DeleteSequence(DeleteSequence),
    InsertData(InsertData),
    UpdateData(UpdateData),
    DeleteData(DeleteData),
    ExecuteSql(ExecuteSql),
}

/// A database object whose existence can be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaObject {
    Schema {
        name: String,
    },
    Table {
        table: TableRef,
    },
    Column {
        table: TableRef,
        column: String,
    },
    Index {
        table: TableRef,
        index: String,
    },
    Constraint {
        table: TableRef,
        constraint: String,
    },
    Sequence {
        schema: Option<String>,
        name: String,
    },
    DefaultValue {
        table: TableRef,
        column: String,
    },
}

/// Existence precondition of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub object: SchemaObject,
    /// Run the expression only when the object exists (`true`) or only when
    /// it is absent (`false`).
    pub run_when_exists: bool,
}

impl Guard {
    fn if_exists(object: SchemaObject) -> Self {
        Self {
            object,
            run_when_exists: true,
        }
    }

    fn if_not_exists(object: SchemaObject) -> Self {
        Self {
            object,
            run_when_exists: false,
        }
    }

    /// Decide whether the guarded expression runs given the object's state.
    pub fn should_run(&self, exists: bool) -> bool {
        exists == self.run_when_exists
    }
}

impl Expression {
    /// Short label for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Expression::CreateSchema(e) => format!("CreateSchema {}", e.name),
            Expression::DeleteSchema(e) => format!("DeleteSchema {}", e.name),
            Expression::AlterSchema(e) => format!("AlterSchema {} -> {}", e.table, e.dest_schema),
            Expression::CreateTable(e) => format!("CreateTable {}", e.table),
            Expression::AlterTable(e) => format!("AlterTable {}", e.table),
            Expression::DeleteTable(e) => format!("DeleteTable {}", e.table),
            Expression::RenameTable(e) => format!("RenameTable {} -> {}", e.table, e.new_name),
            Expression::CreateColumn(e) => format!("CreateColumn {}.{}", e.table, e.column.name),
            Expression::AlterColumn(e) => format!("AlterColumn {}.{}", e.table, e.column.name),
            Expression::DeleteColumn(e) => {
                format!("DeleteColumn {}.{}", e.table, e.columns.join(","))
            }
            Expression::RenameColumn(e) => {
                format!("RenameColumn {}.{} -> {}", e.table, e.old_name, e.new_name)
            }
            Expression::AlterDefaultConstraint(e) => {
                format!("AlterDefaultConstraint {}.{}", e.table, e.column)
            }
            Expression::DeleteDefaultConstraint(e) => {
                format!("DeleteDefaultConstraint {}.{}", e.table, e.column)
            }
            Expression::CreateForeignKey(e) => {
                format!("CreateForeignKey {}", e.foreign_key.resolved_name())
            }
            Expression::DeleteForeignKey(e) => {
                format!("DeleteForeignKey {}", e.foreign_key.resolved_name())
            }
            Expression::CreateIndex(e) => format!("CreateIndex {}", e.index.resolved_name()),
            Expression::DeleteIndex(e) => format!("DeleteIndex {}", e.index.resolved_name()),
            Expression::CreateConstraint(e) => {
                format!("CreateConstraint {}", e.constraint.resolved_name())
            }
            Expression::DeleteConstraint(e) => {
                format!("DeleteConstraint {}", e.constraint.resolved_name())
            }
            Expression::CreateSequence(e) => format!("CreateSequence {}", e.sequence.name),
            Expression::DeleteSequence(e) => format!("DeleteSequence {}", e.name),
            Expression::InsertData(e) => format!("InsertData {} ({} rows)", e.table, e.rows.len()),
            Expression::UpdateData(e) => format!("UpdateData {}", e.table),
            Expression::DeleteData(e) => format!("DeleteData {}", e.table),
            Expression::ExecuteSql(e) => {
                let first_line = e.sql.lines().next().unwrap_or_default();
                format!("ExecuteSql {}", truncate(first_line, 60))
            }
        }
    }

    /// Collect every validation error; an empty list means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            Expression::CreateSchema(CreateSchema { name, .. })
            | Expression::DeleteSchema(DeleteSchema { name, .. }) => {
                if name.is_empty() {
                    errors.push("Schema name cannot be empty".to_string());
                }
            }
            Expression::AlterSchema(e) => {
                if e.table.is_empty() {
                    errors.push("Table name cannot be empty".to_string());
                }
                if e.dest_schema.is_empty() {
                    errors.push("Destination schema name cannot be empty".to_string());
                }
            }
            Expression::CreateTable(e) => {
                e.table.validate(&mut errors);
                if e.columns.is_empty() {
                    errors.push(format!("Table '{}' must have at least one column", e.table.name));
                }
                for column in &e.columns {
                    column.validate(&mut errors);
                }
                let mut names: Vec<&str> = e.columns.iter().map(|c| c.name.as_str()).collect();
                names.sort_unstable();
                if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
                    errors.push(format!("Column '{}' is defined more than once", pair[0]));
                }
            }
            Expression::AlterTable(e) => e.table.validate(&mut errors),
            Expression::DeleteTable(e) => e.table.validate(&mut errors),
            Expression::RenameTable(e) => {
                e.table.validate(&mut errors);
                if e.new_name.is_empty() {
                    errors.push("New table name cannot be empty".to_string());
                }
            }
            Expression::CreateColumn(CreateColumn { table, column, .. })
            | Expression::AlterColumn(AlterColumn { table, column }) => {
                table.validate(&mut errors);
                column.validate(&mut errors);
            }
            Expression::DeleteColumn(e) => {
                e.table.validate(&mut errors);
                if e.columns.is_empty() {
                    errors.push("Delete column must name at least one column".to_string());
                }
                if e.columns.iter().any(String::is_empty) {
                    errors.push("Column name cannot be empty".to_string());
                }
            }
            Expression::RenameColumn(e) => {
                e.table.validate(&mut errors);
                if e.old_name.is_empty() {
                    errors.push("Column name cannot be empty".to_string());
                }
                if e.new_name.is_empty() {
                    errors.push("New column name cannot be empty".to_string());
                }
            }
            Expression::AlterDefaultConstraint(AlterDefaultConstraint { table, column, .. })
            | Expression::DeleteDefaultConstraint(DeleteDefaultConstraint { table, column }) => {
                table.validate(&mut errors);
                if column.is_empty() {
                    errors.push("Column name cannot be empty".to_string());
                }
            }
            Expression::CreateForeignKey(CreateForeignKey { foreign_key }) => {
                foreign_key.validate(&mut errors)
            }
            Expression::DeleteForeignKey(e) => {
                if e.foreign_key.foreign_table.is_empty() {
                    errors.push("Foreign table name cannot be empty".to_string());
                }
                if e.foreign_key.resolved_name().is_empty() {
                    errors.push("Foreign key name cannot be empty".to_string());
                }
            }
            Expression::CreateIndex(CreateIndex { index, .. }) => index.validate(&mut errors),
            Expression::DeleteIndex(e) => {
                if e.index.table.is_empty() {
                    errors.push("Table name cannot be empty".to_string());
                }
                if e.index.name.is_empty() && e.index.columns.is_empty() {
                    errors.push("Index name cannot be empty".to_string());
                }
            }
            Expression::CreateConstraint(CreateConstraint { constraint }) => {
                constraint.validate(&mut errors)
            }
            Expression::DeleteConstraint(e) => {
                if e.constraint.table.is_empty() {
                    errors.push("Table name cannot be empty".to_string());
                }
                if e.constraint.name.is_empty() && e.constraint.columns.is_empty() {
                    errors.push("Constraint name cannot be empty".to_string());
                }
            }
            Expression::CreateSequence(e) => e.sequence.validate(&mut errors),
            Expression::DeleteSequence(e) => {
                if e.name.is_empty() {
                    errors.push("Sequence name cannot be empty".to_string());
                }
            }
            Expression::InsertData(e) => e.validate(&mut errors),
            Expression::UpdateData(e) => e.validate(&mut errors),
            Expression::DeleteData(e) => e.validate(&mut errors),
            Expression::ExecuteSql(e) => e.validate(&mut errors),
        }
        errors
    }

    /// Validate, converting errors into [`MigrateError::Validation`].
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MigrateError::Validation {
                expression: self.describe(),
                errors,
            })
        }
    }

    /// Produce the inverse expression for auto-reversing migrations.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::NotReversible` for destructive or lossy
    /// changes (deletes, alters, updates, raw SQL).
    pub fn reverse(&self) -> Result<Expression> {
        let reversed = match self {
            Expression::CreateSchema(e) => Expression::DeleteSchema(DeleteSchema {
                name: e.name.clone(),
                if_exists: false,
            }),
            Expression::AlterSchema(e) => {
                let source = e
                    .source_schema
                    .clone()
                    .ok_or_else(|| MigrateError::NotReversible(self.describe()))?;
                Expression::AlterSchema(AlterSchema {
                    source_schema: Some(e.dest_schema.clone()),
                    table: e.table.clone(),
                    dest_schema: source,
                })
            }
            Expression::CreateTable(e) => Expression::DeleteTable(DeleteTable {
                table: e.table.clone(),
                if_exists: false,
            }),
            Expression::RenameTable(e) => Expression::RenameTable(RenameTable {
                table: TableRef {
                    schema: e.table.schema.clone(),
                    name: e.new_name.clone(),
                },
                new_name: e.table.name.clone(),
            }),
            Expression::CreateColumn(e) => Expression::DeleteColumn(DeleteColumn {
                table: e.table.clone(),
                columns: vec![e.column.name.clone()],
                if_exists: false,
            }),
            Expression::RenameColumn(e) => Expression::RenameColumn(RenameColumn {
                table: e.table.clone(),
                old_name: e.new_name.clone(),
                new_name: e.old_name.clone(),
            }),
            Expression::CreateForeignKey(e) => Expression::DeleteForeignKey(DeleteForeignKey {
                foreign_key: e.foreign_key.clone(),
                if_exists: false,
            }),
            Expression::CreateIndex(e) => Expression::DeleteIndex(DeleteIndex {
                index: e.index.clone(),
                if_exists: false,
            }),
            Expression::CreateConstraint(e) => Expression::DeleteConstraint(DeleteConstraint {
                constraint: e.constraint.clone(),
                if_exists: false,
            }),
            Expression::CreateSequence(e) => Expression::DeleteSequence(DeleteSequence {
                schema: e.sequence.schema.clone(),
                name: e.sequence.name.clone(),
                if_exists: false,
            }),
            Expression::InsertData(e) => Expression::DeleteData(DeleteData {
                table: e.table.clone(),
                rows: e.rows.clone(),
                all_rows: false,
            }),
            _ => return Err(MigrateError::NotReversible(self.describe())),
        };
        Ok(reversed)
    }

    /// Single-column parts of a multi-column `DeleteColumn` built with
    /// `if_exists()`, so each column gets its own existence check.
    pub fn guarded_parts(&self) -> Option<Vec<Expression>> {
        match self {
            Expression::DeleteColumn(e) if e.if_exists && e.columns.len() > 1 => Some(
                e.columns
                    .iter()
                    .map(|column| {
                        Expression::DeleteColumn(DeleteColumn {
                            table: e.table.clone(),
                            columns: vec![column.clone()],
                            if_exists: true,
                        })
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Existence precondition, if the expression was built with
    /// `if_exists()`/`if_not_exists()`. A multi-column `DeleteColumn` has
    /// none of its own; see [`Expression::guarded_parts`].
    pub fn guard(&self) -> Option<Guard> {
        match self {
            Expression::CreateSchema(e) if e.if_not_exists => {
                Some(Guard::if_not_exists(SchemaObject::Schema {
                    name: e.name.clone(),
                }))
            }
            Expression::DeleteSchema(e) if e.if_exists => Some(Guard::if_exists(SchemaObject::Schema {
                name: e.name.clone(),
            })),
            Expression::CreateTable(e) if e.if_not_exists => {
                Some(Guard::if_not_exists(SchemaObject::Table {
                    table: e.table.clone(),
                }))
            }
            Expression::DeleteTable(e) if e.if_exists => Some(Guard::if_exists(SchemaObject::Table {
                table: e.table.clone(),
            })),
            Expression::CreateColumn(e) if e.if_not_exists => {
                Some(Guard::if_not_exists(SchemaObject::Column {
                    table: e.table.clone(),
                    column: e.column.name.clone(),
                }))
            }
            Expression::DeleteColumn(e) if e.if_exists && e.columns.len() == 1 => {
                Some(Guard::if_exists(SchemaObject::Column {
                    table: e.table.clone(),
                    column: e.columns[0].clone(),
                }))
            }
            Expression::DeleteForeignKey(e) if e.if_exists => {
                Some(Guard::if_exists(SchemaObject::Constraint {
                    table: TableRef {
                        schema: e.foreign_key.foreign_schema.clone(),
                        name: e.foreign_key.foreign_table.clone(),
                    },
                    constraint: e.foreign_key.resolved_name(),
                }))
            }
            Expression::CreateIndex(e) if e.if_not_exists => {
                Some(Guard::if_not_exists(SchemaObject::Index {
                    table: TableRef {
                        schema: e.index.schema.clone(),
                        name: e.index.table.clone(),
                    },
                    index: e.index.resolved_name(),
                }))
            }
            Expression::DeleteIndex(e) if e.if_exists => Some(Guard::if_exists(SchemaObject::Index {
                table: TableRef {
                    schema: e.index.schema.clone(),
                    name: e.index.table.clone(),
                },
                index: e.index.resolved_name(),
            })),
            Expression::DeleteConstraint(e) if e.if_exists => {
                Some(Guard::if_exists(SchemaObject::Constraint {
                    table: TableRef {
                        schema: e.constraint.schema.clone(),
                        name: e.constraint.table.clone(),
                    },
                    constraint: e.constraint.resolved_name(),
                }))
            }
            Expression::CreateSequence(e) if e.if_not_exists => {
                Some(Guard::if_not_exists(SchemaObject::Sequence {
                    schema: e.sequence.schema.clone(),
                    name: e.sequence.name.clone(),
                }))
            }
            Expression::DeleteSequence(e) if e.if_exists => {
                Some(Guard::if_exists(SchemaObject::Sequence {
                    schema: e.schema.clone(),
                    name: e.name.clone(),
                }))
            }
            _ => None,
        }
    }
}

macro_rules! impl_from_expression {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Expression {
                fn from(e: $variant) -> Self {
                    Expression::$variant(e)
                }
            }
        )*
    };
}

impl_from_expression!(
    CreateSchema,
    DeleteSchema,
    AlterSchema,
    CreateTable,
    AlterTable,
    DeleteTable,
    RenameTable,
    CreateColumn,
    AlterColumn,
    DeleteColumn,
    RenameColumn,
    AlterDefaultConstraint,
    DeleteDefaultConstraint,
    CreateForeignKey,
    DeleteForeignKey,
    CreateIndex,
    DeleteIndex,
    CreateConstraint,
    DeleteConstraint,
    CreateSequence,
    DeleteSequence,
    InsertData,
    UpdateData,
    DeleteData,
    ExecuteSql,
);

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DbType;

    fn users() -> TableRef {
        TableRef::new(Some("app"), "users")
    }

    fn int_column(name: &str) -> ColumnDefinition {
        ColumnDefinition {
            db_type: Some(DbType::Int32),
            ..ColumnDefinition::new(name)
        }
    }

    #[test]
    fn test_create_table_reverses_to_delete() {
        let create = Expression::CreateTable(CreateTable {
            table: users(),
            columns: vec![int_column("id")],
            description: None,
            if_not_exists: false,
        });
        assert_eq!(
            create.reverse().unwrap(),
            Expression::DeleteTable(DeleteTable {
                table: users(),
                if_exists: false
            })
        );
    }

    #[test]
    fn test_rename_table_reverse_swaps_names() {
        let rename = Expression::RenameTable(RenameTable {
            table: users(),
            new_name: "people".into(),
        });
        match rename.reverse().unwrap() {
            Expression::RenameTable(r) => {
                assert_eq!(r.table, TableRef::new(Some("app"), "people"));
                assert_eq!(r.new_name, "users");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insert_reverses_to_delete_rows() {
        let row = DataRow::new().set("id", 1);
        let insert = Expression::InsertData(InsertData {
            table: users(),
            rows: vec![row.clone()],
            identity_insert: false,
        });
        match insert.reverse().unwrap() {
            Expression::DeleteData(d) => {
                assert_eq!(d.rows, vec![row]);
                assert!(!d.all_rows);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_delete_table_is_not_reversible() {
        let delete = Expression::DeleteTable(DeleteTable {
            table: users(),
            if_exists: false,
        });
        let err = delete.reverse().unwrap_err();
        assert!(matches!(err, MigrateError::NotReversible(ref what) if what == "DeleteTable app.users"));
    }

    #[test]
    fn test_alter_schema_without_source_is_not_reversible() {
        let alter = Expression::AlterSchema(AlterSchema {
            source_schema: None,
            table: "users".into(),
            dest_schema: "archive".into(),
        });
        assert!(alter.reverse().is_err());
    }

    #[test]
    fn test_create_table_validation_collects_all_errors() {
        let create = Expression::CreateTable(CreateTable {
            table: TableRef::new(None, ""),
            columns: vec![int_column("id"), int_column("id"), ColumnDefinition::new("name")],
            description: None,
            if_not_exists: false,
        });
        let errors = create.validate();
        assert!(errors.contains(&"Table name cannot be empty".to_string()));
        assert!(errors.contains(&"Column 'name' has no type".to_string()));
        assert!(errors.contains(&"Column 'id' is defined more than once".to_string()));
        assert!(create.ensure_valid().is_err());
    }

    #[test]
    fn test_guards() {
        let drop = Expression::DeleteTable(DeleteTable {
            table: users(),
            if_exists: true,
        });
        let guard = drop.guard().unwrap();
        assert_eq!(guard.object, SchemaObject::Table { table: users() });
        assert!(guard.should_run(true));
        assert!(!guard.should_run(false));

        let create = Expression::CreateSchema(CreateSchema {
            name: "app".into(),
            if_not_exists: true,
        });
        assert!(create.guard().unwrap().should_run(false));

        let unguarded = Expression::CreateSchema(CreateSchema {
            name: "app".into(),
            if_not_exists: false,
        });
        assert!(unguarded.guard().is_none());
    }

    #[test]
    fn test_multi_column_delete_is_guarded_per_column() {
        let delete = Expression::DeleteColumn(DeleteColumn {
            table: TableRef::new(None, "t"),
            columns: vec!["a".into(), "b".into()],
            if_exists: true,
        });
        assert!(delete.guard().is_none());

        let parts = delete.guarded_parts().unwrap();
        let objects: Vec<SchemaObject> = parts
            .iter()
            .map(|p| p.guard().unwrap().object)
            .collect();
        assert_eq!(
            objects,
            vec![
                SchemaObject::Column {
                    table: TableRef::new(None, "t"),
                    column: "a".into(),
                },
                SchemaObject::Column {
                    table: TableRef::new(None, "t"),
                    column: "b".into(),
                },
            ]
        );

        let unguarded = Expression::DeleteColumn(DeleteColumn {
            table: TableRef::new(None, "t"),
            columns: vec!["a".into(), "b".into()],
            if_exists: false,
        });
        assert!(unguarded.guarded_parts().is_none());
    }

    #[test]
    fn test_describe_truncates_sql() {
        let exec = Expression::ExecuteSql(ExecuteSql {
            sql: format!("UPDATE t SET x = '{}'\nWHERE 1 = 1", "a".repeat(100)),
        });
        let label = exec.describe();
        assert!(label.starts_with("ExecuteSql UPDATE t SET"));
        assert!(label.ends_with("..."));
    }
}
