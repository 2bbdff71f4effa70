//! Oracle quoting.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::core::SystemMethod;
use crate::dialect::{unsupported_method, Quoter};
use crate::error::Result;

/// Oracle quoter: `"ident"`, `HEXTORAW` for raw data, `to_date`/`to_timestamp` literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleQuoter;

impl Quoter for OracleQuoter {
    fn format_bytes(&self, value: &[u8]) -> String {
        format!("HEXTORAW('{}')", hex::encode_upper(value))
    }

    fn format_guid(&self, value: &Uuid) -> String {
        self.format_bytes(value.as_bytes())
    }

    fn format_date(&self, value: &NaiveDate) -> String {
        format!("to_date('{}', 'yyyy-mm-dd')", value.format("%Y-%m-%d"))
    }

    fn format_time(&self, value: &NaiveTime) -> String {
        format!("to_date('{}', 'hh24:mi:ss')", value.format("%H:%M:%S"))
    }

    fn format_datetime(&self, value: &NaiveDateTime) -> String {
        format!(
            "to_timestamp('{}', 'yyyy-mm-dd hh24:mi:ss.ff6')",
            value.format("%Y-%m-%d %H:%M:%S%.6f")
        )
    }

    fn format_datetime_offset(&self, value: &DateTime<FixedOffset>) -> String {
        format!(
            "to_timestamp_tz('{}', 'yyyy-mm-dd hh24:mi:ss.ff6 tzh:tzm')",
            value.format("%Y-%m-%d %H:%M:%S%.6f %:z")
        )
    }

    fn format_system_method(&self, method: SystemMethod) -> Result<String> {
        let sql = match method {
            SystemMethod::NewGuid => "sys_guid()",
            SystemMethod::CurrentDateTime => "LOCALTIMESTAMP",
            SystemMethod::CurrentDateTimeOffset => "CURRENT_TIMESTAMP",
            SystemMethod::CurrentUtcDateTime => "sys_extract_utc(SYSTIMESTAMP)",
            SystemMethod::CurrentUser => "USER",
            SystemMethod::NewSequentialId => return Err(unsupported_method(method)),
        };
        Ok(sql.to_string())
    }
}
