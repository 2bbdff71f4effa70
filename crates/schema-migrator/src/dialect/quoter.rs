//! Identifier and literal quoting (Strategy pattern).
//!
//! The default methods implement the ANSI rules; each dialect overrides the
//! quote characters and whichever literal formats differ.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::identifier::validate_identifier;
use crate::core::{SystemMethod, Value};
use crate::error::{MigrateError, Result};

/// Quoting and literal formatting for one SQL dialect.
pub trait Quoter: Send + Sync {
    /// Opening identifier quote.
    fn open_quote(&self) -> &str {
        "\""
    }

    /// Closing identifier quote.
    fn close_quote(&self) -> &str {
        "\""
    }

    /// True when the name is already wrapped in this dialect's quotes.
    fn is_quoted(&self, name: &str) -> bool {
        let (open, close) = (self.open_quote(), self.close_quote());
        name.len() >= open.len() + close.len() && name.starts_with(open) && name.ends_with(close)
    }

    /// Quote an identifier, doubling embedded close quotes.
    ///
    /// Already-quoted names are returned unchanged.
    fn quote(&self, name: &str) -> Result<String> {
        if self.is_quoted(name) {
            return Ok(name.to_string());
        }
        validate_identifier(name)?;
        let close = self.close_quote();
        let doubled = format!("{close}{close}");
        Ok(format!(
            "{}{}{}",
            self.open_quote(),
            name.replace(close, &doubled),
            close
        ))
    }

    /// Quote a table name, qualified with its schema when one is given.
    fn quote_table(&self, table: &str, schema: Option<&str>) -> Result<String> {
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => Ok(format!("{}.{}", self.quote(schema)?, self.quote(table)?)),
            None => self.quote(table),
        }
    }

    /// Render a literal value as SQL text.
    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => self.format_bool(*v),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => self.format_float(*v),
            Value::Decimal(v) => self.format_decimal(v),
            Value::String(v) => self.format_string(v),
            Value::Bytes(v) => self.format_bytes(v),
            Value::Guid(v) => self.format_guid(v),
            Value::Date(v) => self.format_date(v),
            Value::Time(v) => self.format_time(v),
            Value::DateTime(v) => self.format_datetime(v),
            Value::DateTimeOffset(v) => self.format_datetime_offset(v),
            Value::Raw(sql) => sql.clone(),
        }
    }

    fn format_bool(&self, value: bool) -> String {
        let literal = if value { "1" } else { "0" };
        literal.to_string()
    }

    fn format_float(&self, value: f64) -> String {
        // Display for f64 never uses exponent notation or locale separators
        value.to_string()
    }

    fn format_decimal(&self, value: &Decimal) -> String {
        value.normalize().to_string()
    }

    fn format_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn format_bytes(&self, value: &[u8]) -> String {
        format!("0x{}", hex::encode_upper(value))
    }

    fn format_guid(&self, value: &Uuid) -> String {
        format!("'{}'", value)
    }

    fn format_date(&self, value: &NaiveDate) -> String {
        format!("'{}'", value.format("%Y-%m-%d"))
    }

    fn format_time(&self, value: &NaiveTime) -> String {
        format!("'{}'", value.format("%H:%M:%S%.f"))
    }

    fn format_datetime(&self, value: &NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%dT%H:%M:%S%.f"))
    }

    fn format_datetime_offset(&self, value: &DateTime<FixedOffset>) -> String {
        format!("'{}'", value.format("%Y-%m-%dT%H:%M:%S%.f%:z"))
    }

    /// SQL for a database function default.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Generation` when the dialect has no equivalent.
    fn format_system_method(&self, method: SystemMethod) -> Result<String> {
        match method {
            SystemMethod::CurrentDateTime => Ok("CURRENT_TIMESTAMP".to_string()),
            SystemMethod::CurrentUser => Ok("CURRENT_USER".to_string()),
            other => Err(unsupported_method(other)),
        }
    }
}

/// Error for a system method the dialect cannot express.
pub(crate) fn unsupported_method(method: SystemMethod) -> MigrateError {
    MigrateError::Generation(format!("System method {:?} is not supported", method))
}
