//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dialect::CompatibilityMode;
use crate::migration::TagBehavior;
use crate::runner::TransactionMode;
use crate::version::VersionTableMetadata;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database connection.
    pub connection: ConnectionConfig,

    /// Runner behavior.
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Target database connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database type: postgres, mssql, mysql, oracle or hana.
    pub r#type: String,

    /// Database host.
    #[serde(default = "default_localhost")]
    pub host: String,

    /// Database port (driver default when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password. Never written back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Default schema for unqualified existence checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// PostgreSQL SSL mode (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,

    /// SQL Server: encrypt the connection (default: true).
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// SQL Server: accept any server certificate (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,

    /// Pool size (default: 2).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Connect timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            r#type: String::new(),
            host: default_localhost(),
            port: None,
            database: String::new(),
            user: String::new(),
            password: String::new(),
            schema: None,
            ssl_mode: default_require(),
            encrypt: true,
            trust_server_cert: false,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Runner behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Directory holding `V<version>__<description>.sql` files.
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Version table layout.
    #[serde(default)]
    pub version_table: VersionTableMetadata,

    /// Transaction scope (default: per_migration).
    #[serde(default)]
    pub transaction_mode: TransactionMode,

    /// Only run migrations matching these tags (plus untagged ones).
    #[serde(default)]
    pub tags: Vec<String>,

    /// Tag matching for migrations that do not declare their own behavior.
    #[serde(default)]
    pub tag_behavior: TagBehavior,

    /// Profile migrations to run after the versioned ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Reaction to operations the dialect cannot express.
    #[serde(default)]
    pub compatibility: CompatibilityMode,

    /// Log SQL instead of executing it.
    #[serde(default)]
    pub preview: bool,

    /// Apply migrations flagged as breaking changes.
    #[serde(default)]
    pub allow_breaking_change: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            version_table: VersionTableMetadata::default(),
            transaction_mode: TransactionMode::default(),
            tags: Vec::new(),
            tag_behavior: TagBehavior::default(),
            profile: None,
            compatibility: CompatibilityMode::default(),
            preview: false,
            allow_breaking_change: false,
        }
    }
}

// Default value functions for serde
fn default_localhost() -> String {
    "localhost".to_string()
}

fn default_require() -> String {
    "require".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> usize {
    2
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}
