//! Data manipulation expressions (insert, update, delete, raw SQL).

use serde::{Deserialize, Serialize};

use crate::core::Value;

use super::TableRef;

/// Ordered column/value pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataRow(pub Vec<(String, Value)>);

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value, builder style.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.push((column.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    /// Look up a column value by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }
}

/// `INSERT INTO table (...) VALUES (...)`, one statement per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertData {
    pub table: TableRef,
    pub rows: Vec<DataRow>,
    /// Allow explicit values for identity columns (SQL Server `IDENTITY_INSERT`).
    pub identity_insert: bool,
}

impl InsertData {
    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        self.table.validate(errors);
        if self.rows.is_empty() {
            errors.push("Insert must contain at least one row".to_string());
        }
        if self.rows.iter().any(DataRow::is_empty) {
            errors.push("Insert row must set at least one column".to_string());
        }
    }
}

/// `UPDATE table SET ... WHERE ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateData {
    pub table: TableRef,
    pub set: DataRow,
    /// Equality conditions joined with AND (NULL values become `IS NULL`).
    pub condition: DataRow,
    pub all_rows: bool,
}

impl UpdateData {
    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        self.table.validate(errors);
        if self.set.is_empty() {
            errors.push("Update must set at least one column".to_string());
        }
        if self.condition.is_empty() && !self.all_rows {
            errors.push(
                "Update statement is missing a condition; specify one with where_eq() or target all rows with all_rows()"
                    .to_string(),
            );
        }
    }
}

/// `DELETE FROM table WHERE ...`, one statement per row condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteData {
    pub table: TableRef,
    pub rows: Vec<DataRow>,
    pub all_rows: bool,
}

impl DeleteData {
    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        self.table.validate(errors);
        if self.rows.is_empty() && !self.all_rows {
            errors.push(
                "Delete statement is missing a condition; specify one with row() or target all rows with all_rows()"
                    .to_string(),
            );
        }
    }
}

/// Raw SQL executed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteSql {
    pub sql: String,
}

impl ExecuteSql {
    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        if self.sql.trim().is_empty() {
            errors.push("SQL statement cannot be empty".to_string());
        }
    }
}
