//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::drivers::{DatabaseType, SslMode};
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let conn = &config.connection;
    let db_type = DatabaseType::from_db_type(&conn.r#type)?;

    if db_type.has_processor() {
        if conn.host.is_empty() {
            return Err(MigrateError::Config("connection.host is required".into()));
        }
        if conn.database.is_empty() {
            return Err(MigrateError::Config(
                "connection.database is required".into(),
            ));
        }
        if conn.user.is_empty() {
            return Err(MigrateError::Config("connection.user is required".into()));
        }
    }

    if db_type == DatabaseType::Postgres {
        SslMode::parse(&conn.ssl_mode)?;
    }

    if conn.max_connections == 0 {
        return Err(MigrateError::Config(
            "connection.max_connections must be at least 1".into(),
        ));
    }

    let vt = &config.runner.version_table;
    let names = [
        ("table_name", Some(&vt.table_name)),
        ("column_name", Some(&vt.column_name)),
        ("applied_on_column_name", Some(&vt.applied_on_column_name)),
        ("description_column_name", Some(&vt.description_column_name)),
        ("unique_index_name", Some(&vt.unique_index_name)),
        ("schema", vt.schema.as_ref()),
    ];
    for (field, value) in names {
        if let Some(value) = value {
            validate_identifier(value).map_err(|e| {
                MigrateError::Config(format!("runner.version_table.{}: {}", field, e))
            })?;
        }
    }

    if config.runner.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(MigrateError::Config(
            "runner.tags cannot contain empty tags".into(),
        ));
    }

    Ok(())
}
