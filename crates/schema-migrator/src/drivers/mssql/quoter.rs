//! SQL Server quoting.

use chrono::NaiveDateTime;

use crate::core::SystemMethod;
use crate::dialect::Quoter;
use crate::error::Result;

/// SQL Server quoter: `[ident]`, `N'unicode'` strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlQuoter;

impl Quoter for MssqlQuoter {
    fn open_quote(&self) -> &str {
        "["
    }

    fn close_quote(&self) -> &str {
        "]"
    }

    fn format_string(&self, value: &str) -> String {
        format!("N'{}'", value.replace('\'', "''"))
    }

    /// Milliseconds at most: `DATETIME` rejects longer fractions.
    fn format_datetime(&self, value: &NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%dT%H:%M:%S%.3f"))
    }

    fn format_system_method(&self, method: SystemMethod) -> Result<String> {
        let sql = match method {
            SystemMethod::NewGuid => "NEWID()",
            SystemMethod::NewSequentialId => "NEWSEQUENTIALID()",
            SystemMethod::CurrentDateTime => "GETDATE()",
            SystemMethod::CurrentDateTimeOffset => "SYSDATETIMEOFFSET()",
            SystemMethod::CurrentUtcDateTime => "GETUTCDATE()",
            SystemMethod::CurrentUser => "CURRENT_USER",
        };
        Ok(sql.to_string())
    }
}
