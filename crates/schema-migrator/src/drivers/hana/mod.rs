//! SAP HANA dialect. Generation only; there is no HANA processor.

mod generator;
mod quoter;

pub use generator::HanaGenerator;
pub use quoter::HanaQuoter;
