//! Identifier and SQL fragment validation.
//!
//! Identifiers (schema, table, column, index and constraint names) cannot be
//! bound as parameters, so every generator quotes them into the statement
//! text. Before quoting, names are checked here so that a malformed name
//! fails generation instead of producing broken or dangerous SQL.

use crate::error::{MigrateError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
/// - Oracle 12.2+: 128 bytes
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding [`MAX_IDENTIFIER_LENGTH`]
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Generation(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Generation(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Generation(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Validate a boolean SQL fragment embedded into a statement (index filters).
///
/// Filter predicates are copied into `CREATE INDEX ... WHERE <filter>`
/// verbatim, so a fragment must be a single expression:
///
/// - no semicolons (statement chaining)
/// - no comment markers (`--`, `/*`, `*/`)
pub fn validate_sql_fragment(fragment: &str) -> Result<()> {
    if fragment.trim().is_empty() {
        return Err(MigrateError::Generation(
            "SQL fragment cannot be empty".to_string(),
        ));
    }

    if fragment.contains(';') {
        return Err(MigrateError::Generation(format!(
            "SQL fragment contains semicolon: {:?}",
            fragment
        )));
    }

    if fragment.contains("--") || fragment.contains("/*") || fragment.contains("*/") {
        return Err(MigrateError::Generation(format!(
            "SQL fragment contains comment markers: {:?}",
            fragment
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_length_boundary() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        let result = validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1));
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_sql_fragment_accepts_predicates() {
        assert!(validate_sql_fragment("deleted_at IS NULL").is_ok());
        assert!(validate_sql_fragment("status IN ('active', 'pending')").is_ok());
    }

    #[test]
    fn test_sql_fragment_rejects_chaining_and_comments() {
        assert!(validate_sql_fragment("1=1; DROP TABLE users").is_err());
        assert!(validate_sql_fragment("1=1 -- tail").is_err());
        assert!(validate_sql_fragment("1=1 /* x */").is_err());
        assert!(validate_sql_fragment("   ").is_err());
    }
}
