//! Error types for the migration library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection and pool errors.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for a failed migration.
pub const EXIT_MIGRATION_ERROR: u8 = 3;
/// Exit code for invalid expressions or version ordering.
pub const EXIT_VALIDATION_ERROR: u8 = 4;
/// Exit code for operations a dialect cannot express.
pub const EXIT_UNSUPPORTED_ERROR: u8 = 5;
/// Exit code for cancellation (SIGINT/SIGTERM).
pub const EXIT_CANCELLED: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// PostgreSQL connection or query error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQL Server connection or query error
    #[error("SQL Server error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// MySQL connection or query error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// One or more expressions failed validation
    #[error("Validation failed for {expression}: {}", .errors.join("; "))]
    Validation {
        expression: String,
        errors: Vec<String>,
    },

    /// The target dialect cannot express an operation (strict compatibility mode)
    #[error("{dialect} does not support {operation}")]
    Unsupported { dialect: String, operation: String },

    /// SQL generation failed (unknown type, oversize column, ...)
    #[error("SQL generation failed: {0}")]
    Generation(String),

    /// An expression cannot be reversed automatically
    #[error("Cannot auto-reverse {0}; implement down() explicitly")]
    NotReversible(String),

    /// A migration failed while being applied or reverted
    #[error("Migration {version} ({description}) failed: {source}")]
    Migration {
        version: i64,
        description: String,
        #[source]
        source: Box<MigrateError>,
    },

    /// Two migrations declare the same version
    #[error("Duplicate migration version {0}")]
    DuplicateVersion(i64),

    /// The version table lists a version with no matching migration
    #[error("Applied version {0} has no matching migration")]
    MissingMigration(i64),

    /// Pending migrations exist below the latest applied version
    #[error("Unapplied migrations precede the latest applied version {latest}: {pending:?}")]
    VersionOrder { latest: i64, pending: Vec<i64> },

    /// A breaking-change migration was refused
    #[error("Migration {0} is marked as a breaking change; set allow_breaking_change to apply it")]
    BreakingChange(i64),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run was cancelled (SIGINT, etc.)
    #[error("Migration run cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create an Unsupported error
    pub fn unsupported(dialect: impl Into<String>, operation: impl Into<String>) -> Self {
        MigrateError::Unsupported {
            dialect: dialect.into(),
            operation: operation.into(),
        }
    }

    /// Wrap an error with the migration it occurred in
    pub fn migration(version: i64, description: impl Into<String>, source: MigrateError) -> Self {
        MigrateError::Migration {
            version,
            description: description.into(),
            source: Box::new(source),
        }
    }

    /// Map the error to a process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            MigrateError::Postgres(_) | MigrateError::Mssql(_) | MigrateError::Pool { .. } => {
                EXIT_CONNECTION_ERROR
            }
            #[cfg(feature = "mysql")]
            MigrateError::Mysql(_) => EXIT_CONNECTION_ERROR,
            MigrateError::Migration { .. }
            | MigrateError::MissingMigration(_)
            | MigrateError::BreakingChange(_)
            | MigrateError::NotReversible(_) => EXIT_MIGRATION_ERROR,
            MigrateError::Validation { .. }
            | MigrateError::DuplicateVersion(_)
            | MigrateError::VersionOrder { .. }
            | MigrateError::Generation(_) => EXIT_VALIDATION_ERROR,
            MigrateError::Unsupported { .. } => EXIT_UNSUPPORTED_ERROR,
            MigrateError::Cancelled => EXIT_CANCELLED,
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
