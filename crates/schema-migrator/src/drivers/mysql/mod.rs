//! MySQL/MariaDB driver.
//!
//! - [`MysqlQuoter`]: backtick quoting
//! - [`MysqlGenerator`]: SQL generation (MySQL 5.7+, MariaDB 10.2+)
//! - [`MysqlProcessor`]: execution over mysql_async
//!
//! # Feature Flag
//!
//! The processor is only available with the `mysql` feature (on by default);
//! the generator is always built so previews work without the client library.

mod generator;
#[cfg(feature = "mysql")]
mod processor;
mod quoter;

pub use generator::MysqlGenerator;
#[cfg(feature = "mysql")]
pub use processor::MysqlProcessor;
pub use quoter::MysqlQuoter;
