//! Oracle dialect (12c and later). Generation only; there is no Oracle processor.

mod generator;
mod quoter;

pub use generator::OracleGenerator;
pub use quoter::OracleQuoter;
