//! Rename, data and raw SQL chains.

use crate::expressions::{
    DataRow, DeleteData, ExecuteSql, Expression, InsertData, RenameColumn, RenameTable, TableRef,
    UpdateData,
};

use super::Pending;

pub struct RenameRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> RenameRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    pub fn table(self, old_name: &str) -> RenameTableBuilder<'a> {
        RenameTableBuilder(Pending::new(
            self.sink,
            RenameTable {
                table: TableRef::new(None, old_name),
                new_name: String::new(),
            },
        ))
    }

    pub fn column(self, old_name: &str) -> RenameColumnBuilder<'a> {
        RenameColumnBuilder(Pending::new(
            self.sink,
            RenameColumn {
                table: TableRef::default(),
                old_name: old_name.to_string(),
                new_name: String::new(),
            },
        ))
    }
}

pub struct RenameTableBuilder<'a>(Pending<'a, RenameTable>);

impl RenameTableBuilder<'_> {
    pub fn to(mut self, new_name: &str) -> Self {
        self.0.item().new_name = new_name.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }
}

pub struct RenameColumnBuilder<'a>(Pending<'a, RenameColumn>);

impl RenameColumnBuilder<'_> {
    pub fn on_table(mut self, table: &str) -> Self {
        self.0.item().table.name = table.to_string();
        self
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn to(mut self, new_name: &str) -> Self {
        self.0.item().new_name = new_name.to_string();
        self
    }
}

pub struct InsertRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> InsertRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    pub fn into_table(self, table: &str) -> InsertBuilder<'a> {
        InsertBuilder(Pending::new(
            self.sink,
            InsertData {
                table: TableRef::new(None, table),
                rows: Vec::new(),
                identity_insert: false,
            },
        ))
    }
}

pub struct InsertBuilder<'a>(Pending<'a, InsertData>);

impl InsertBuilder<'_> {
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn row(mut self, row: DataRow) -> Self {
        self.0.item().rows.push(row);
        self
    }

    /// Allow explicit values for identity columns.
    pub fn with_identity_insert(mut self) -> Self {
        self.0.item().identity_insert = true;
        self
    }
}

pub struct UpdateRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> UpdateRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    pub fn table(self, table: &str) -> UpdateBuilder<'a> {
        UpdateBuilder(Pending::new(
            self.sink,
            UpdateData {
                table: TableRef::new(None, table),
                set: DataRow::new(),
                condition: DataRow::new(),
                all_rows: false,
            },
        ))
    }
}

pub struct UpdateBuilder<'a>(Pending<'a, UpdateData>);

impl UpdateBuilder<'_> {
    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    pub fn set(mut self, values: DataRow) -> Self {
        self.0.item().set.0.extend(values.0);
        self
    }

    /// Equality conditions joined with AND.
    pub fn where_eq(mut self, condition: DataRow) -> Self {
        self.0.item().condition.0.extend(condition.0);
        self
    }

    pub fn all_rows(mut self) -> Self {
        self.0.item().all_rows = true;
        self
    }
}

pub struct DeleteDataBuilder<'a>(Pending<'a, DeleteData>);

impl<'a> DeleteDataBuilder<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>, item: DeleteData) -> Self {
        Self(Pending::new(sink, item))
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.0.item().table.schema = Some(schema.to_string());
        self
    }

    /// One `DELETE ... WHERE` per row, matching on every column of the row.
    pub fn row(mut self, condition: DataRow) -> Self {
        self.0.item().rows.push(condition);
        self
    }

    pub fn all_rows(mut self) -> Self {
        self.0.item().all_rows = true;
        self
    }
}

pub struct ExecuteRoot<'a> {
    sink: &'a mut Vec<Expression>,
}

impl<'a> ExecuteRoot<'a> {
    pub(crate) fn new(sink: &'a mut Vec<Expression>) -> Self {
        Self { sink }
    }

    /// Execute SQL verbatim.
    pub fn sql(self, sql: &str) {
        self.sink.push(Expression::ExecuteSql(ExecuteSql {
            sql: sql.to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_chains() {
        let mut sink = Vec::new();
        RenameRoot::new(&mut sink).table("people").to("persons").in_schema("hr");
        RenameRoot::new(&mut sink)
            .column("surname")
            .on_table("persons")
            .to("last_name");
        let described: Vec<String> = sink.iter().map(|e| e.describe()).collect();
        assert_eq!(
            described,
            vec![
                "RenameTable hr.people -> persons",
                "RenameColumn persons.surname -> last_name",
            ]
        );
    }

    #[test]
    fn test_insert_is_reversible_as_delete() {
        let mut sink = Vec::new();
        InsertRoot::new(&mut sink)
            .into_table("roles")
            .row(DataRow::new().set("id", 1).set("name", "admin"))
            .row(DataRow::new().set("id", 2).set("name", "viewer"))
            .with_identity_insert();
        assert_eq!(sink[0].describe(), "InsertData roles (2 rows)");
        match sink[0].reverse().unwrap() {
            Expression::DeleteData(d) => assert_eq!(d.rows.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_update_without_condition_is_invalid() {
        let mut sink = Vec::new();
        UpdateRoot::new(&mut sink)
            .table("users")
            .set(DataRow::new().set("active", true));
        assert!(sink[0].validate()[0].contains("missing a condition"));
    }
}
