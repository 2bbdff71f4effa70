//! PostgreSQL driver.
//!
//! - [`PostgresQuoter`]: `"ident"` quoting and PostgreSQL literals
//! - [`PostgresGenerator`]: SQL generation
//! - [`PostgresProcessor`]: execution over deadpool-postgres

mod generator;
mod processor;
mod quoter;

pub use generator::PostgresGenerator;
pub use processor::PostgresProcessor;
pub use quoter::PostgresQuoter;
