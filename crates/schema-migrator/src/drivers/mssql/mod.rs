//! Microsoft SQL Server driver.
//!
//! - [`MssqlQuoter`]: `[ident]` quoting and `N'...'` strings
//! - [`MssqlGenerator`]: SQL generation
//! - [`MssqlProcessor`]: execution over Tiberius and bb8

mod generator;
mod processor;
mod quoter;

pub use generator::MssqlGenerator;
pub use processor::MssqlProcessor;
pub use quoter::MssqlQuoter;
