//! SQL dialect strategy.
//!
//! - [`Quoter`]: identifier and literal quoting
//! - [`Generator`]: expression to SQL translation
//!
//! Both traits carry ANSI defaults as provided methods (Template Method
//! pattern); the dialects in [`crate::drivers`] override what differs.
//!
//! ```rust
//! use schema_migrator::dialect::{CompatibilityMode, Generator};
//! use schema_migrator::drivers::DatabaseType;
//! use schema_migrator::expressions::{DeleteTable, Expression, TableRef};
//!
//! let generator = DatabaseType::Postgres.generator(CompatibilityMode::Strict);
//! let sql = generator
//!     .generate(&Expression::DeleteTable(DeleteTable {
//!         table: TableRef::new(Some("app"), "users"),
//!         if_exists: false,
//!     }))
//!     .unwrap();
//! assert_eq!(sql, vec!["DROP TABLE \"app\".\"users\""]);
//! ```

mod generator;
mod quoter;

pub(crate) use generator::comment_on_statements;
pub use generator::{CompatibilityMode, Generator};
pub(crate) use quoter::unsupported_method;
pub use quoter::Quoter;
