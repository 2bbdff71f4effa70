//! Schema object definitions carried by expressions.
//!
//! These types describe columns, keys, indexes, constraints and sequences
//! independently of any database. Generators turn them into dialect SQL.
//!
//! Object names are optional where a naming convention exists; the
//! `resolved_name` helpers apply the convention:
//!
//! | Object            | Convention                                   |
//! |-------------------|----------------------------------------------|
//! | Primary key       | `PK_<table>`                                 |
//! | Foreign key       | `FK_<fk table>_<fk cols>_<pk table>_<pk cols>` |
//! | Index             | `IX_<table>_<cols>`                          |
//! | Unique constraint | `UC_<table>_<cols>`                          |

use serde::{Deserialize, Serialize};

use super::value::DefaultValue;

/// Database-neutral column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DbType {
    AnsiString,
    AnsiStringFixedLength,
    Binary,
    Boolean,
    Byte,
    Currency,
    Date,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Json,
    Single,
    String,
    StringFixedLength,
    Time,
    Xml,
}

/// Referential action for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rule {
    /// No clause emitted (database default, usually NO ACTION).
    #[default]
    None,
    Cascade,
    SetNull,
    SetDefault,
}

impl Rule {
    /// SQL keyword(s) for the action, `None` when no clause is emitted.
    pub fn as_sql(&self) -> Option<&'static str> {
        match self {
            Rule::None => None,
            Rule::Cascade => Some("CASCADE"),
            Rule::SetNull => Some("SET NULL"),
            Rule::SetDefault => Some("SET DEFAULT"),
        }
    }
}

/// Whether an expression creates or alters a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnModification {
    #[default]
    Create,
    Alter,
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,

    /// Owning table name.
    pub table_name: String,

    /// Neutral type, resolved through the dialect's type map.
    pub db_type: Option<DbType>,

    /// Dialect-specific type string used verbatim (overrides `db_type`).
    pub custom_type: Option<String>,

    /// Length for character/binary types, precision for decimals.
    pub size: Option<u32>,

    /// Scale for decimals.
    pub precision: Option<u32>,

    /// `Some(true)` NULL, `Some(false)`/`None` NOT NULL.
    pub is_nullable: Option<bool>,

    /// Part of the table's primary key.
    pub is_primary_key: bool,

    /// Explicit primary key constraint name.
    pub primary_key_name: Option<String>,

    /// Identity/auto-increment column.
    pub is_identity: bool,

    /// Identity seed and increment (SQL Server `IDENTITY(seed,increment)`).
    pub identity_seed: Option<i64>,
    pub identity_increment: Option<i64>,

    /// Emit a unique index after creating the column.
    pub is_unique: bool,

    /// Emit a non-unique index after creating the column.
    pub is_indexed: bool,

    /// Default value.
    pub default: DefaultValue,

    /// Collation name.
    pub collation: Option<String>,

    /// Column comment.
    pub description: Option<String>,

    pub modification: ColumnModification,
}

impl ColumnDefinition {
    /// Create a column with only its name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True when the column accepts NULL.
    pub fn nullable(&self) -> bool {
        self.is_nullable == Some(true)
    }

    /// True when either a neutral or a custom type is set.
    pub fn has_type(&self) -> bool {
        self.db_type.is_some() || self.custom_type.is_some()
    }

    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.name.is_empty() {
            errors.push("Column name cannot be empty".to_string());
        }
        if !self.has_type() {
            errors.push(format!("Column '{}' has no type", self.name));
        }
        if self.is_primary_key && self.nullable() {
            errors.push(format!(
                "Primary key column '{}' cannot be nullable",
                self.name
            ));
        }
    }
}

/// Foreign key definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    /// Constraint name (empty uses the naming convention).
    pub name: String,

    /// Referencing (child) side.
    pub foreign_schema: Option<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,

    /// Referenced (parent) side.
    pub primary_schema: Option<String>,
    pub primary_table: String,
    pub primary_columns: Vec<String>,

    pub on_delete: Rule,
    pub on_update: Rule,
}

impl ForeignKeyDefinition {
    /// Constraint name, falling back to `FK_<fk table>_<fk cols>_<pk table>_<pk cols>`.
    pub fn resolved_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        format!(
            "FK_{}_{}_{}_{}",
            self.foreign_table,
            self.foreign_columns.join("_"),
            self.primary_table,
            self.primary_columns.join("_")
        )
    }

    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.foreign_table.is_empty() {
            errors.push("Foreign table name cannot be empty".to_string());
        }
        if self.primary_table.is_empty() {
            errors.push("Primary table name cannot be empty".to_string());
        }
        if self.foreign_columns.is_empty() {
            errors.push("Foreign key must have at least one foreign column".to_string());
        }
        if self.primary_columns.is_empty() {
            errors.push("Foreign key must have at least one primary column".to_string());
        }
        if !self.foreign_columns.is_empty()
            && !self.primary_columns.is_empty()
            && self.foreign_columns.len() != self.primary_columns.len()
        {
            errors.push(format!(
                "Foreign key has {} foreign columns but {} primary columns",
                self.foreign_columns.len(),
                self.primary_columns.len()
            ));
        }
    }
}

/// Sort direction of an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// Column participating in an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub direction: Direction,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            direction,
        }
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name (empty uses the naming convention).
    pub name: String,
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<IndexColumn>,
    pub is_unique: bool,
    /// SQL Server clustered index.
    pub is_clustered: bool,
    /// Non-key columns (SQL Server/PostgreSQL `INCLUDE`).
    pub include: Vec<String>,
    /// Partial index predicate.
    pub filter: Option<String>,
}

impl IndexDefinition {
    /// Index name, falling back to `IX_<table>_<cols>`.
    pub fn resolved_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let cols: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        format!("IX_{}_{}", self.table, cols.join("_"))
    }

    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.table.is_empty() {
            errors.push("Table name cannot be empty".to_string());
        }
        if self.columns.is_empty() {
            errors.push("Index must apply to at least one column".to_string());
        }
        if self.columns.iter().any(|c| c.name.is_empty()) {
            errors.push("Index column name cannot be empty".to_string());
        }
    }
}

/// Kind of table constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
}

/// Primary key or unique constraint definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDefinition {
    pub kind: ConstraintKind,
    /// Constraint name (empty uses the naming convention).
    pub name: String,
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
    /// SQL Server `CLUSTERED`/`NONCLUSTERED`; `None` leaves the server default.
    pub clustered: Option<bool>,
}

impl ConstraintDefinition {
    pub fn new(kind: ConstraintKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            name: String::new(),
            schema: None,
            table: table.into(),
            columns: Vec::new(),
            clustered: None,
        }
    }

    /// Constraint name, falling back to `PK_<table>` or `UC_<table>_<cols>`.
    pub fn resolved_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match self.kind {
            ConstraintKind::PrimaryKey => format!("PK_{}", self.table),
            ConstraintKind::Unique => format!("UC_{}_{}", self.table, self.columns.join("_")),
        }
    }

    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.table.is_empty() {
            errors.push("Table name cannot be empty".to_string());
        }
        if self.columns.is_empty() {
            errors.push("Constraint must apply to at least one column".to_string());
        }
    }
}

/// Sequence definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub schema: Option<String>,
    pub name: String,
    pub increment: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub start_with: Option<i64>,
    /// Cached values; `Some(0)`/`Some(1)` means NO CACHE.
    pub cache: Option<i64>,
    pub cycle: bool,
}

impl SequenceDefinition {
    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.name.is_empty() {
            errors.push("Sequence name cannot be empty".to_string());
        }
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                errors.push(format!(
                    "Sequence '{}' MINVALUE {} exceeds MAXVALUE {}",
                    self.name, min, max
                ));
            }
        }
        if self.increment == Some(0) {
            errors.push(format!("Sequence '{}' increment cannot be 0", self.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_conventional_name() {
        let fk = ForeignKeyDefinition {
            foreign_table: "orders".into(),
            foreign_columns: vec!["user_id".into()],
            primary_table: "users".into(),
            primary_columns: vec!["id".into()],
            ..Default::default()
        };
        assert_eq!(fk.resolved_name(), "FK_orders_user_id_users_id");
    }

    #[test]
    fn test_foreign_key_column_count_mismatch() {
        let fk = ForeignKeyDefinition {
            foreign_table: "orders".into(),
            foreign_columns: vec!["a".into(), "b".into()],
            primary_table: "users".into(),
            primary_columns: vec!["id".into()],
            ..Default::default()
        };
        let mut errors = Vec::new();
        fk.validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("2 foreign columns but 1 primary"));
    }

    #[test]
    fn test_index_conventional_name() {
        let idx = IndexDefinition {
            table: "users".into(),
            columns: vec![
                IndexColumn::new("last_name", Direction::Ascending),
                IndexColumn::new("first_name", Direction::Descending),
            ],
            ..Default::default()
        };
        assert_eq!(idx.resolved_name(), "IX_users_last_name_first_name");
    }

    #[test]
    fn test_constraint_conventional_names() {
        let mut pk = ConstraintDefinition::new(ConstraintKind::PrimaryKey, "users");
        pk.columns = vec!["id".into()];
        assert_eq!(pk.resolved_name(), "PK_users");

        let mut uc = ConstraintDefinition::new(ConstraintKind::Unique, "users");
        uc.columns = vec!["email".into(), "tenant".into()];
        assert_eq!(uc.resolved_name(), "UC_users_email_tenant");
    }

    #[test]
    fn test_column_validation() {
        let mut errors = Vec::new();
        let mut col = ColumnDefinition::new("id");
        col.is_primary_key = true;
        col.is_nullable = Some(true);
        col.validate(&mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("has no type"));
        assert!(errors[1].contains("cannot be nullable"));
    }

    #[test]
    fn test_sequence_validation() {
        let seq = SequenceDefinition {
            name: "seq".into(),
            min_value: Some(10),
            max_value: Some(1),
            increment: Some(0),
            ..Default::default()
        };
        let mut errors = Vec::new();
        seq.validate(&mut errors);
        assert_eq!(errors.len(), 2);
    }
}
