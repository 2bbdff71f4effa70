//! Literal values carried by expressions.
//!
//! Values appear as column defaults and as data in insert/update/delete
//! expressions. Quoting them into SQL text is the job of each dialect's
//! [`Quoter`](crate::core::Quoter).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A literal SQL value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Any integer (tinyint through bigint).
    Int(i64),

    /// Floating point value.
    Float(f64),

    /// Exact decimal value.
    Decimal(Decimal),

    /// Character data.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// UUID/GUID value.
    Guid(Uuid),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// SQL fragment emitted verbatim (e.g. `LOWER(name)`).
    Raw(String),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap a SQL fragment that must not be quoted.
    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Raw(sql.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTimeOffset(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Database functions usable as column defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemMethod {
    /// Random GUID/UUID.
    NewGuid,
    /// Sequential GUID (SQL Server `NEWSEQUENTIALID()`).
    NewSequentialId,
    /// Local date and time.
    CurrentDateTime,
    /// Date and time with offset.
    CurrentDateTimeOffset,
    /// UTC date and time.
    CurrentUtcDateTime,
    /// Name of the connected user.
    CurrentUser,
}

/// Default value of a column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum DefaultValue {
    /// No default.
    #[default]
    None,
    /// Literal default.
    Value(Value),
    /// Function default.
    Method(SystemMethod),
}

impl DefaultValue {
    /// Returns true when no default is set.
    pub fn is_none(&self) -> bool {
        matches!(self, DefaultValue::None)
    }
}

impl From<SystemMethod> for DefaultValue {
    fn from(m: SystemMethod) -> Self {
        DefaultValue::Method(m)
    }
}

impl From<Value> for DefaultValue {
    fn from(v: Value) -> Self {
        DefaultValue::Value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }

    #[test]
    fn test_default_value_conversions() {
        assert_eq!(
            DefaultValue::from(Value::from(5)),
            DefaultValue::Value(Value::Int(5))
        );
        assert_eq!(
            DefaultValue::from(SystemMethod::NewGuid),
            DefaultValue::Method(SystemMethod::NewGuid)
        );
        assert!(DefaultValue::default().is_none());
    }
}
