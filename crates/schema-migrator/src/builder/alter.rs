//! `alter()` chains.

use crate::core::{ColumnDefinition, ColumnModification, DefaultValue, SystemMethod, Value};
use crate::expressions::{
    AlterColumn, AlterDefaultConstraint, AlterSchema, AlterTable, CreateColumn, Expression,
    TableRef,
};

use super::column::{last_column, AlterColumnBuilder, ColumnSyntax};
use super::Pending;

pub struct AlterRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> AlterRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    pub fn table(self, name: &str) -> AlterTableBuilder<'a> {
        AlterTableBuilder {
            sink: self.sink,
            table: TableRef::new(None, name),
            description: None,
            dest_schema: None,
            columns: Vec::new(),
        }
    }

    pub fn column(self, name: &str) -> AlterColumnBuilder<'a> {
        AlterColumnBuilder::new(self.sink, name)
    }

    /// Change the default value of a column.
    pub fn default_value(self, column: &str) -> AlterDefaultBuilder<'a> {
        AlterDefaultBuilder(Pending::new(
            self.sink,
            AlterDefaultConstraint {
                table: TableRef::default(),
                column: column.to_string(),
                default: DefaultValue::None,
            },
        ))
    }
}

/// `alter().table(..)`: one chain may add and alter several columns, set
/// the table comment and move the table to another schema.
///
/// On drop it appends, in order: the table comment change, one column
/// expression per `add_column()`/`alter_column()`, then the schema move.
pub struct AlterTableBuilder<'a> {
    sink: &'a mut Vec<Expression>,
    table: TableRef,
    description: Option<String>,
    dest_schema: Option<String>,
    columns: Vec<ColumnDefinition>,
}

impl AlterTableBuilder<'_> {
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.table.schema = Some(schema.to_string());
        self
    }

    /// Set the table comment.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Move the table into `schema`.
    pub fn to_schema(mut self, schema: &str) -> Self {
        self.dest_schema = Some(schema.to_string());
        self
    }

    pub fn add_column(self, name: &str) -> Self {
        self.push_column(name, ColumnModification::Create)
    }

    pub fn alter_column(self, name: &str) -> Self {
        self.push_column(name, ColumnModification::Alter)
    }

    fn push_column(mut self, name: &str, modification: ColumnModification) -> Self {
        self.columns.push(ColumnDefinition {
            table_name: self.table.name.clone(),
            modification,
            ..ColumnDefinition::new(name)
        });
        self
    }
}

impl ColumnSyntax for AlterTableBuilder<'_> {
    fn current_column(&mut self) -> &mut ColumnDefinition {
        last_column(&mut self.columns)
    }
}

impl Drop for AlterTableBuilder<'_> {
    fn drop(&mut self) {
        if let Some(description) = self.description.take() {
            self.sink.push(Expression::AlterTable(AlterTable {
                table: self.table.clone(),
                description: Some(description),
            }));
        }
        for column in self.columns.drain(..) {
            let expression = match column.modification {
                ColumnModification::Create => Expression::CreateColumn(CreateColumn {
                    table: self.table.clone(),
                    column,
                    if_not_exists: false,
                }),
                ColumnModification::Alter => Expression::AlterColumn(AlterColumn {
                    table: self.table.clone(),
                    column,
                }),
            };
            self.sink.push(expression);
        }
        if let Some(dest_schema) = self.dest_schema.take() {
            self.sink.push(Expression::AlterSchema(AlterSchema {
                source_schema: self.table.schema.clone(),
                table: self.table.name.clone(),
                dest_schema,
            }));
        }
    }
}

pub struct AlterDefaultBuilder<'a>(Pending<'a, AlterDefaultConstraint>);

impl AlterDefaultBuilder<'_> {
    pub fn on_table(mut self, table: &str) -> Self {
        self.0.item().table.name = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn to(mut self, value: impl Into<Value>) -> Self {
        self.0.item().default = DefaultValue::Value(value.into());
        self
    }

    pub fn to_method(mut self, method: SystemMethod) -> Self {
        self.0.item().default = DefaultValue::Method(method);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DbType;

    #[test]
    fn test_alter_table_expands_in_order() {
        let mut sink = Vec::new();
        AlterRoot::new(&mut sink)
            .table("users")
            .in_schema("legacy")
            .to_schema("app")
            .with_description("Registered users")
            .add_column("last_login")
            .as_datetime()
            .nullable()
            .alter_column("email")
            .as_string(400)
            .not_nullable();

        let described: Vec<String> = sink.iter().map(|e| e.describe()).collect();
        assert_eq!(
            described,
            vec![
                "AlterTable legacy.users",
                "CreateColumn legacy.users.last_login",
                "AlterColumn legacy.users.email",
                "AlterSchema users -> app",
            ]
        );
        match &sink[2] {
            Expression::AlterColumn(e) => {
                assert_eq!(e.column.db_type, Some(DbType::String));
                assert_eq!(e.column.size, Some(400));
                assert_eq!(e.column.table_name, "users");
            }
            other => panic!("unexpected {:?}", other),
        }
        match &sink[3] {
            Expression::AlterSchema(e) => assert_eq!(e.source_schema.as_deref(), Some("legacy")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alter_default() {
        let mut sink = Vec::new();
        AlterRoot::new(&mut sink)
            .default_value("created_at")
            .on_table("events")
            .to_method(SystemMethod::CurrentUtcDateTime);
        match &sink[0] {
            Expression::AlterDefaultConstraint(e) => {
                assert_eq!(e.table.name, "events");
                assert_eq!(e.default, DefaultValue::Method(SystemMethod::CurrentUtcDateTime));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_alter_table_appends_nothing() {
        let mut sink = Vec::new();
        AlterRoot::new(&mut sink).table("users");
        assert!(sink.is_empty());
    }
}
