//! SAP HANA quoting.

use chrono::NaiveDateTime;

use crate::core::SystemMethod;
use crate::dialect::{unsupported_method, Quoter};
use crate::error::Result;

/// HANA quoter: `"ident"`, `true`/`false`, `X'..'` binary literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct HanaQuoter;

impl Quoter for HanaQuoter {
    fn format_bool(&self, value: bool) -> String {
        value.to_string()
    }

    fn format_bytes(&self, value: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(value))
    }

    fn format_datetime(&self, value: &NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    fn format_system_method(&self, method: SystemMethod) -> Result<String> {
        let sql = match method {
            SystemMethod::NewGuid => "SYSUUID",
            SystemMethod::CurrentDateTime => "CURRENT_TIMESTAMP",
            SystemMethod::CurrentUtcDateTime => "CURRENT_UTCTIMESTAMP",
            SystemMethod::CurrentUser => "CURRENT_USER",
            SystemMethod::NewSequentialId | SystemMethod::CurrentDateTimeOffset => {
                return Err(unsupported_method(method))
            }
        };
        Ok(sql.to_string())
    }
}
