//! Fluent migration builder.
//!
//! [`MigrationContext`] is what a migration's `up()`/`down()` receives.
//! Each entry point (`create()`, `alter()`, `delete()`, `rename()`,
//! `insert()`, `update()`, `execute()`) starts a chain that describes one
//! expression; the expression is appended to the context when the chain
//! ends (the builder is dropped at the end of the statement).
//!
//! ```rust
//! use schema_migrator::builder::{ColumnSyntax, MigrationContext};
//! use schema_migrator::drivers::DatabaseType;
//!
//! let mut ctx = MigrationContext::new(DatabaseType::Postgres);
//! ctx.create()
//!     .table("users")
//!     .in_schema("app")
//!     .with_column("id").as_int64().primary_key().identity()
//!     .with_column("email").as_string(320).unique();
//! ctx.insert().into_table("users").in_schema("app").row(
//!     schema_migrator::expressions::DataRow::new().set("email", "admin@example.com"),
//! );
//! assert_eq!(ctx.expressions().len(), 2);
//! ```

mod alter;
mod column;
mod create;
mod data;
mod delete;

pub use alter::{AlterDefaultBuilder, AlterRoot, AlterTableBuilder};
pub use column::{AlterColumnBuilder, ColumnSyntax, CreateColumnBuilder};
pub use create::{
    ConstraintBuilder, CreateRoot, CreateSchemaBuilder, CreateTableBuilder, ForeignKeyBuilder,
    IndexBuilder, SequenceBuilder,
};
pub use data::{
    DeleteDataBuilder, ExecuteRoot, InsertBuilder, InsertRoot, RenameColumnBuilder, RenameRoot,
    RenameTableBuilder, UpdateBuilder, UpdateRoot,
};
pub use delete::{
    DeleteColumnBuilder, DeleteConstraintBuilder, DeleteDefaultBuilder, DeleteForeignKeyBuilder,
    DeleteIndexBuilder, DeleteRoot, DeleteSchemaBuilder, DeleteSequenceBuilder, DeleteTableBuilder,
};

use crate::drivers::DatabaseType;
use crate::expressions::Expression;

/// Collects the expressions of one migration direction.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    database_type: DatabaseType,
    expressions: Vec<Expression>,
}

impl MigrationContext {
    /// Context targeting the given database.
    pub fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            expressions: Vec::new(),
        }
    }

    /// Database the migration is running against.
    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn into_expressions(self) -> Vec<Expression> {
        self.expressions
    }

    /// Append a hand-built expression.
    pub fn push(&mut self, expression: impl Into<Expression>) {
        self.expressions.push(expression.into());
    }

    pub fn create(&mut self) -> CreateRoot<'_> {
        CreateRoot::new(&mut self.expressions)
    }

    pub fn alter(&mut self) -> AlterRoot<'_> {
        AlterRoot::new(&mut self.expressions)
    }

    pub fn delete(&mut self) -> DeleteRoot<'_> {
        DeleteRoot::new(&mut self.expressions)
    }

    pub fn rename(&mut self) -> RenameRoot<'_> {
        RenameRoot::new(&mut self.expressions)
    }

    pub fn insert(&mut self) -> InsertRoot<'_> {
        InsertRoot::new(&mut self.expressions)
    }

    pub fn update(&mut self) -> UpdateRoot<'_> {
        UpdateRoot::new(&mut self.expressions)
    }

    pub fn execute(&mut self) -> ExecuteRoot<'_> {
        ExecuteRoot::new(&mut self.expressions)
    }

    /// Run `f` only when the target database is one of `database_types`.
    pub fn if_database(
        &mut self,
        database_types: &[DatabaseType],
        f: impl FnOnce(&mut MigrationContext),
    ) {
        if database_types.contains(&self.database_type) {
            f(self);
        }
    }
}

/// An expression under construction, appended to the sink on drop.
pub(crate) struct Pending<'a, T>
where
    T: Clone + Into<Expression>,
{
    sink: &'a mut Vec<Expression>,
    item: T,
}

impl<'a, T> Pending<'a, T>
where
    T: Clone + Into<Expression>,
{
    pub(crate) fn new(sink: &'a mut Vec<Expression>, item: T) -> Self {
        Self { sink, item }
    }

    pub(crate) fn item(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T> Drop for Pending<'_, T>
where
    T: Clone + Into<Expression>,
{
    fn drop(&mut self) {
        self.sink.push(self.item.clone().into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DbType, Rule};
    use crate::expressions::DataRow;

    #[test]
    fn test_chains_append_in_statement_order() {
        let mut ctx = MigrationContext::new(DatabaseType::SqlServer);
        ctx.create()
            .table("orders")
            .with_column("id")
            .as_int32()
            .primary_key()
            .with_column("user_id")
            .as_int32();
        ctx.create()
            .foreign_key()
            .from_table("orders")
            .foreign_column("user_id")
            .to_table("users")
            .primary_column("id")
            .on_delete(Rule::Cascade);
        ctx.delete().table("legacy_orders").if_exists();

        let described: Vec<String> = ctx.expressions().iter().map(|e| e.describe()).collect();
        assert_eq!(
            described,
            vec![
                "CreateTable orders",
                "CreateForeignKey FK_orders_user_id_users_id",
                "DeleteTable legacy_orders",
            ]
        );
        match &ctx.expressions()[0] {
            Expression::CreateTable(t) => {
                assert_eq!(t.columns.len(), 2);
                assert_eq!(t.columns[1].db_type, Some(DbType::Int32));
                assert_eq!(t.columns[1].table_name, "orders");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_database() {
        let mut ctx = MigrationContext::new(DatabaseType::Postgres);
        ctx.if_database(&[DatabaseType::SqlServer], |ctx| {
            ctx.execute().sql("EXEC sp_refreshview 'v_users'");
        });
        ctx.if_database(&[DatabaseType::Postgres, DatabaseType::MySql], |ctx| {
            ctx.execute().sql("ANALYZE users");
        });
        assert_eq!(ctx.expressions().len(), 1);
        assert_eq!(ctx.expressions()[0].describe(), "ExecuteSql ANALYZE users");
    }

    #[test]
    fn test_push_and_update() {
        let mut ctx = MigrationContext::new(DatabaseType::MySql);
        ctx.update()
            .table("users")
            .set(DataRow::new().set("active", false))
            .where_eq(DataRow::new().set("email", crate::core::Value::Null));
        let expressions = ctx.into_expressions();
        assert!(expressions[0].validate().is_empty());
    }
}
