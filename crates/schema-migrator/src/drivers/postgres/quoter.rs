//! PostgreSQL quoting.

use crate::core::SystemMethod;
use crate::dialect::{unsupported_method, Quoter};
use crate::error::Result;

/// PostgreSQL quoter: `"ident"`, `true`/`false`, `'\x..'` byte strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresQuoter;

impl Quoter for PostgresQuoter {
    fn format_bool(&self, value: bool) -> String {
        value.to_string()
    }

    fn format_bytes(&self, value: &[u8]) -> String {
        format!("'\\x{}'", hex::encode(value))
    }

    fn format_system_method(&self, method: SystemMethod) -> Result<String> {
        let sql = match method {
            SystemMethod::NewGuid => "gen_random_uuid()",
            SystemMethod::CurrentDateTime => "now()",
            SystemMethod::CurrentDateTimeOffset => "current_timestamp",
            SystemMethod::CurrentUtcDateTime => "(now() at time zone 'UTC')",
            SystemMethod::CurrentUser => "current_user",
            SystemMethod::NewSequentialId => return Err(unsupported_method(method)),
        };
        Ok(sql.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_quote_ident() {
        let q = PostgresQuoter;
        assert_eq!(q.quote("name").unwrap(), "\"name\"");
        assert_eq!(q.quote("table\"name").unwrap(), "\"table\"\"name\"");
        assert_eq!(q.quote("Users").unwrap(), "\"Users\"");
    }

    #[test]
    fn test_literals() {
        let q = PostgresQuoter;
        assert_eq!(q.quote_value(&Value::from(true)), "true");
        assert_eq!(q.quote_value(&Value::from(vec![0x01_u8, 0xab])), "'\\x01ab'");
        assert_eq!(q.quote_value(&Value::from("it's")), "'it''s'");
    }

    #[test]
    fn test_system_methods() {
        let q = PostgresQuoter;
        assert_eq!(
            q.format_system_method(SystemMethod::CurrentUtcDateTime).unwrap(),
            "(now() at time zone 'UTC')"
        );
        assert!(q.format_system_method(SystemMethod::NewSequentialId).is_err());
    }
}
