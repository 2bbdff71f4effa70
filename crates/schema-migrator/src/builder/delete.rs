//! `delete()` chains.

use crate::core::{ConstraintDefinition, ConstraintKind, ForeignKeyDefinition, IndexColumn, IndexDefinition};
use crate::expressions::{
    DeleteColumn, DeleteConstraint, DeleteData, DeleteDefaultConstraint, DeleteForeignKey,
    DeleteIndex, DeleteSchema, DeleteSequence, DeleteTable, Expression, TableRef,
};

use super::data::DeleteDataBuilder;
use super::Pending;

pub struct DeleteRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> DeleteRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    pub fn schema(self, name: &str) -> DeleteSchemaBuilder<'a> {
        DeleteSchemaBuilder(Pending::new(
            self.sink,
            DeleteSchema {
                name: name.to_string(),
                if_exists: false,
            },
        ))
    }

    pub fn table(self, name: &str) -> DeleteTableBuilder<'a> {
        DeleteTableBuilder(Pending::new(
            self.sink,
            DeleteTable {
                table: TableRef::new(None, name),
                if_exists: false,
            },
        ))
    }

    /// Drop a column; chain `.column()` to drop more in one statement.
    pub fn column(self, name: &str) -> DeleteColumnBuilder<'a> {
        DeleteColumnBuilder(Pending::new(
            self.sink,
            DeleteColumn {
                table: TableRef::default(),
                columns: vec![name.to_string()],
                if_exists: false,
            },
        ))
    }

    pub fn foreign_key(self, name: &str) -> DeleteForeignKeyBuilder<'a> {
        DeleteForeignKeyBuilder(Pending::new(
            self.sink,
            DeleteForeignKey {
                foreign_key: ForeignKeyDefinition {
                    name: name.to_string(),
                    ..ForeignKeyDefinition::default()
                },
                if_exists: false,
            },
        ))
    }

    pub fn index(self, name: &str) -> DeleteIndexBuilder<'a> {
        DeleteIndexBuilder(Pending::new(
            self.sink,
            DeleteIndex {
                index: IndexDefinition {
                    name: name.to_string(),
                    ..IndexDefinition::default()
                },
                if_exists: false,
            },
        ))
    }

    pub fn primary_key(self, name: &str) -> DeleteConstraintBuilder<'a> {
        self.constraint(ConstraintKind::PrimaryKey, name)
    }

    pub fn unique_constraint(self, name: &str) -> DeleteConstraintBuilder<'a> {
        self.constraint(ConstraintKind::Unique, name)
    }

    fn constraint(self, kind: ConstraintKind, name: &str) -> DeleteConstraintBuilder<'a> {
        let mut constraint = ConstraintDefinition::new(kind, "");
        constraint.name = name.to_string();
        DeleteConstraintBuilder(Pending::new(
            self.sink,
            DeleteConstraint {
                constraint,
                if_exists: false,
            },
        ))
    }

    pub fn sequence(self, name: &str) -> DeleteSequenceBuilder<'a> {
        DeleteSequenceBuilder(Pending::new(
            self.sink,
            DeleteSequence {
                schema: None,
                name: name.to_string(),
                if_exists: false,
            },
        ))
    }

    pub fn default_constraint(self, column: &str) -> DeleteDefaultBuilder<'a> {
        DeleteDefaultBuilder(Pending::new(
            self.sink,
            DeleteDefaultConstraint {
                table: TableRef::default(),
                column: column.to_string(),
            },
        ))
    }

    /// Delete rows; add conditions with `row()` or use `all_rows()`.
    pub fn from_table(self, table: &str) -> DeleteDataBuilder<'a> {
        DeleteDataBuilder::new(
            self.sink,
            DeleteData {
                table: TableRef::new(None, table),
                rows: Vec::new(),
                all_rows: false,
            },
        )
    }
}

pub struct DeleteSchemaBuilder<'a>(Pending<'a, DeleteSchema>);

impl DeleteSchemaBuilder<'_> {
    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteTableBuilder<'a>(Pending<'a, DeleteTable>);

impl DeleteTableBuilder<'_> {
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteColumnBuilder<'a>(Pending<'a, DeleteColumn>);

impl DeleteColumnBuilder<'_> {
    pub fn column(mut self, name: &str) -> Self {
        self.0.item().columns.push(name.to_string());
        self
    }

    pub fn from_table(mut self, table: &str) -> Self {
        self.0.item().table.name = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    /// Each column is checked and dropped separately.
    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteForeignKeyBuilder<'a>(Pending<'a, DeleteForeignKey>);

impl DeleteForeignKeyBuilder<'_> {
    pub fn on_table(mut self, table: &str) -> Self {
        self.0.item().foreign_key.foreign_table = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().foreign_key.foreign_schema = Some(schema.to_string());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteIndexBuilder<'a>(Pending<'a, DeleteIndex>);

impl DeleteIndexBuilder<'_> {
    pub fn on_table(mut self, table: &str) -> Self {
        self.0.item().index.table = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().index.schema = Some(schema.to_string());
        self
    }

    /// Identify an unnamed index by its columns (`IX_` convention).
    pub fn on_column(mut self, column: &str) -> Self {
        self.0
            .item()
            .index
            .columns
            .push(IndexColumn::new(column, Default::default()));
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteConstraintBuilder<'a>(Pending<'a, DeleteConstraint>);

impl DeleteConstraintBuilder<'_> {
    pub fn from_table(mut self, table: &str) -> Self {
        self.0.item().constraint.table = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().constraint.schema = Some(schema.to_string());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteSequenceBuilder<'a>(Pending<'a, DeleteSequence>);

impl DeleteSequenceBuilder<'_> {
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().schema = Some(schema.to_string());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.0.item().if_exists = true;
        self
    }
}

pub struct DeleteDefaultBuilder<'a>(Pending<'a, DeleteDefaultConstraint>);

impl DeleteDefaultBuilder<'_> {
    pub fn on_table(mut self, table: &str) -> Self {
        self.0.item().table.name = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }
}
