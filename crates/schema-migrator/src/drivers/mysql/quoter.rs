//! MySQL quoting.

use chrono::NaiveDateTime;

use crate::core::SystemMethod;
use crate::dialect::{unsupported_method, Quoter};
use crate::error::Result;

/// MySQL quoter: `` `ident` ``, backslash-escaped strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlQuoter;

impl Quoter for MysqlQuoter {
    fn open_quote(&self) -> &str {
        "`"
    }

    fn close_quote(&self) -> &str {
        "`"
    }

    fn format_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn format_datetime(&self, value: &NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    fn format_system_method(&self, method: SystemMethod) -> Result<String> {
        let sql = match method {
            SystemMethod::NewGuid => "(UUID())",
            SystemMethod::CurrentDateTime => "CURRENT_TIMESTAMP",
            SystemMethod::CurrentUtcDateTime => "(UTC_TIMESTAMP())",
            SystemMethod::CurrentUser => "(CURRENT_USER())",
            SystemMethod::NewSequentialId | SystemMethod::CurrentDateTimeOffset => {
                return Err(unsupported_method(method))
            }
        };
        Ok(sql.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use chrono::NaiveDate;

    #[test]
    fn test_quote_ident() {
        let q = MysqlQuoter;
        assert_eq!(q.quote("order").unwrap(), "`order`");
        assert_eq!(q.quote("we`ird").unwrap(), "`we``ird`");
    }

    #[test]
    fn test_string_escapes_backslashes() {
        let q = MysqlQuoter;
        assert_eq!(q.quote_value(&Value::from(r"C:\temp\it's")), r"'C:\\temp\\it''s'");
    }

    #[test]
    fn test_datetime_uses_space_separator() {
        let q = MysqlQuoter;
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(q.quote_value(&Value::from(dt)), "'2024-03-01 12:30:00'");
    }

    #[test]
    fn test_system_methods() {
        let q = MysqlQuoter;
        assert_eq!(q.format_system_method(SystemMethod::NewGuid).unwrap(), "(UUID())");
        assert!(q
            .format_system_method(SystemMethod::CurrentDateTimeOffset)
            .is_err());
    }
}
