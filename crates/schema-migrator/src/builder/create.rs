//! `create()` chains.

use crate::core::{
    ColumnDefinition, ConstraintDefinition, ConstraintKind, Direction, ForeignKeyDefinition,
    IndexColumn, IndexDefinition, Rule, SequenceDefinition,
};
use crate::expressions::{
    CreateConstraint, CreateForeignKey, CreateIndex, CreateSchema, CreateSequence, CreateTable,
    Expression, TableRef,
};

use super::column::{last_column, ColumnSyntax, CreateColumnBuilder};
use super::Pending;

pub struct CreateRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> CreateRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    pub fn schema(self, name: &str) -> CreateSchemaBuilder<'a> {
        CreateSchemaBuilder(Pending::new(
            self.sink,
            CreateSchema {
                name: name.to_string(),
                if_not_exists: false,
            },
        ))
    }

    pub fn table(self, name: &str) -> CreateTableBuilder<'a> {
        CreateTableBuilder(Pending::new(
            self.sink,
            CreateTable {
                table: TableRef::new(None, name),
                columns: Vec::new(),
                description: None,
                if_not_exists: false,
            },
        ))
    }

    /// Add a column to an existing table.
    pub fn column(self, name: &str) -> CreateColumnBuilder<'a> {
        CreateColumnBuilder::new(self.sink, name)
    }

    pub fn foreign_key(self) -> ForeignKeyBuilder<'a> {
        ForeignKeyBuilder(Pending::new(
            self.sink,
            CreateForeignKey {
                foreign_key: ForeignKeyDefinition::default(),
            },
        ))
    }

    /// Index; pass an empty name to use the `IX_` convention.
    pub fn index(self, name: &str) -> IndexBuilder<'a> {
        IndexBuilder(Pending::new(
            self.sink,
            CreateIndex {
                index: IndexDefinition {
                    name: name.to_string(),
                    ..IndexDefinition::default()
                },
                if_not_exists: false,
            },
        ))
    }

    pub fn primary_key(self, name: &str) -> ConstraintBuilder<'a> {
        self.constraint(ConstraintKind::PrimaryKey, name)
    }

    pub fn unique_constraint(self, name: &str) -> ConstraintBuilder<'a> {
        self.constraint(ConstraintKind::Unique, name)
    }

    fn constraint(self, kind: ConstraintKind, name: &str) -> ConstraintBuilder<'a> {
        let mut constraint = ConstraintDefinition::new(kind, "");
        constraint.name = name.to_string();
        ConstraintBuilder(Pending::new(self.sink, CreateConstraint { constraint }))
    }

    pub fn sequence(self, name: &str) -> SequenceBuilder<'a> {
        SequenceBuilder(Pending::new(
            self.sink,
            CreateSequence {
                sequence: SequenceDefinition {
                    name: name.to_string(),
                    ..SequenceDefinition::default()
                },
                if_not_exists: false,
            },
        ))
    }
}

pub struct CreateSchemaBuilder<'a>(Pending<'a, CreateSchema>);

impl CreateSchemaBuilder<'_> {
    pub fn if_not_exists(mut self) -> Self {
        self.0.item().if_not_exists = true;
        self
    }
}

/// `create().table(..)`. Column calls (`as_int32()`, `nullable()`, ...)
/// apply to the most recent `with_column()`.
pub struct CreateTableBuilder<'a>(Pending<'a, CreateTable>);

impl CreateTableBuilder<'_> {
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.0.item().description = Some(description.to_string());
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.0.item().if_not_exists = true;
        self
    }

    pub fn with_column(mut self, name: &str) -> Self {
        let table = self.0.item();
        let mut column = ColumnDefinition::new(name);
        column.table_name = table.table.name.clone();
        table.columns.push(column);
        self
    }
}

impl ColumnSyntax for CreateTableBuilder<'_> {
    fn current_column(&mut self) -> &mut ColumnDefinition {
        last_column(&mut self.0.item().columns)
    }
}

pub struct ForeignKeyBuilder<'a>(Pending<'a, CreateForeignKey>);

impl ForeignKeyBuilder<'_> {
    fn fk(&mut self) -> &mut ForeignKeyDefinition {
        &mut self.0.item().foreign_key
    }

    pub fn named(mut self, name: &str) -> Self {
        self.fk().name = name.to_string();
        self
    }

    /// Referencing (child) table.
    pub fn from_table(mut self, table: &str) -> Self {
        self.fk().foreign_table = table.to_string();
        self
    }

    /// Schema of the referencing table.
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.fk().foreign_schema = Some(schema.to_string());
        self
    }

    pub fn foreign_column(mut self, column: &str) -> Self {
        self.fk().foreign_columns.push(column.to_string());
        self
    }

    pub fn foreign_columns(mut self, columns: &[&str]) -> Self {
        self.fk()
            .foreign_columns
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Referenced (parent) table.
    pub fn to_table(mut self, table: &str) -> Self {
        self.fk().primary_table = table.to_string();
        self
    }

    pub fn primary_schema(mut self, schema: &str) -> Self {
        self.fk().primary_schema = Some(schema.to_string());
        self
    }

    pub fn primary_column(mut self, column: &str) -> Self {
        self.fk().primary_columns.push(column.to_string());
        self
    }

    pub fn primary_columns(mut self, columns: &[&str]) -> Self {
        self.fk()
            .primary_columns
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn on_delete(mut self, rule: Rule) -> Self {
        self.fk().on_delete = rule;
        self
    }

    pub fn on_update(mut self, rule: Rule) -> Self {
        self.fk().on_update = rule;
        self
    }
}

pub struct IndexBuilder<'a>(Pending<'a, CreateIndex>);

impl IndexBuilder<'_> {
    fn index(&mut self) -> &mut IndexDefinition {
        &mut self.0.item().index
    }

    pub fn on_table(mut self, table: &str) -> Self {
        self.index().table = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.index().schema = Some(schema.to_string());
        self
    }

    pub fn on_column(mut self, column: &str) -> Self {
        self.index()
            .columns
            .push(IndexColumn::new(column, Direction::Ascending));
        self
    }

    pub fn on_column_desc(mut self, column: &str) -> Self {
        self.index()
            .columns
            .push(IndexColumn::new(column, Direction::Descending));
        self
    }

    pub fn unique(mut self) -> Self {
        self.index().is_unique = true;
        self
    }

    pub fn clustered(mut self) -> Self {
        self.index().is_clustered = true;
        self
    }

    /// Non-key column carried in the index leaf.
    pub fn include(mut self, column: &str) -> Self {
        self.index().include.push(column.to_string());
        self
    }

    /// Partial index predicate, emitted verbatim.
    pub fn filter(mut self, predicate: &str) -> Self {
        self.index().filter = Some(predicate.to_string());
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.0.item().if_not_exists = true;
        self
    }
}

pub struct ConstraintBuilder<'a>(Pending<'a, CreateConstraint>);

impl ConstraintBuilder<'_> {
    fn constraint(&mut self) -> &mut ConstraintDefinition {
        &mut self.0.item().constraint
    }

    pub fn on_table(mut self, table: &str) -> Self {
        self.constraint().table = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.constraint().schema = Some(schema.to_string());
        self
    }

    pub fn column(mut self, column: &str) -> Self {
        self.constraint().columns.push(column.to_string());
        self
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.constraint()
            .columns
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn clustered(mut self, clustered: bool) -> Self {
        self.constraint().clustered = Some(clustered);
        self
    }
}

pub struct SequenceBuilder<'a>(Pending<'a, CreateSequence>);

impl SequenceBuilder<'_> {
    fn sequence(&mut self) -> &mut SequenceDefinition {
        &mut self.0.item().sequence
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.sequence().schema = Some(schema.to_string());
        self
    }

    pub fn increment_by(mut self, increment: i64) -> Self {
        self.sequence().increment = Some(increment);
        self
    }

    pub fn min_value(mut self, value: i64) -> Self {
        self.sequence().min_value = Some(value);
        self
    }

    pub fn max_value(mut self, value: i64) -> Self {
        self.sequence().max_value = Some(value);
        self
    }

    pub fn start_with(mut self, value: i64) -> Self {
        self.sequence().start_with = Some(value);
        self
    }

    pub fn cache(mut self, size: i64) -> Self {
        self.sequence().cache = Some(size);
        self
    }

    pub fn cycle(mut self) -> Self {
        self.sequence().cycle = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.0.item().if_not_exists = true;
        self
    }
}
