//! Core abstractions for database-agnostic schema migration.
//!
//! - [`schema`]: column, key, index, constraint and sequence definitions
//! - [`value`]: literal values and column defaults
//! - [`typemap`]: size-bounded `DbType` to SQL type lookup
//! - [`identifier`]: identifier and SQL fragment validation
//! - [`traits`]: the [`Processor`] seam between the runner and a database
//!
//! Driver modules (`drivers/postgres`, `drivers/mssql`, ...) implement the
//! dialect and processor traits against these types.

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod typemap;
pub mod value;

pub use schema::{
    ColumnDefinition, ColumnModification, ConstraintDefinition, ConstraintKind, DbType, Direction,
    ForeignKeyDefinition, IndexColumn, IndexDefinition, Rule, SequenceDefinition,
};
pub use traits::{Processor, ProcessorOptions};
pub use typemap::TypeMap;
pub use value::{DefaultValue, SystemMethod, Value};
