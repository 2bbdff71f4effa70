//! Migrations loaded from SQL files.
//!
//! A directory holds `V<version>__<description>.sql` scripts and optional
//! `V<version>__<description>.down.sql` counterparts. Leading comment lines
//! may carry settings:
//!
//! ```sql
//! -- tags: uk, production
//! -- transaction: none
//! -- breaking: true
//! ```
//!
//! Scripts are split into batches on lines containing only `GO`; each batch
//! is executed verbatim.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::builder::MigrationContext;
use crate::error::{MigrateError, Result};

use super::{Migration, MigrationSet, TransactionBehavior};

/// A migration backed by SQL scripts.
#[derive(Debug, Clone)]
pub struct SqlFileMigration {
    pub version: i64,
    pub description: String,
    pub up_sql: String,
    pub down_sql: Option<String>,
    pub tags: Vec<String>,
    pub transaction_behavior: TransactionBehavior,
    pub breaking_change: bool,
    pub path: PathBuf,
}

impl SqlFileMigration {
    /// Build a migration from script text, reading header settings.
    pub fn new(version: i64, description: &str, up_sql: String, path: PathBuf) -> Result<Self> {
        let mut migration = Self {
            version,
            description: description.to_string(),
            up_sql,
            down_sql: None,
            tags: Vec::new(),
            transaction_behavior: TransactionBehavior::Default,
            breaking_change: false,
            path,
        };
        migration.read_header()?;
        Ok(migration)
    }

    fn read_header(&mut self) -> Result<()> {
        let header: Vec<(String, String)> = self
            .up_sql
            .lines()
            .map(str::trim)
            .take_while(|line| line.is_empty() || line.starts_with("--"))
            .filter_map(|line| line.strip_prefix("--"))
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
            .collect();

        for (key, value) in header {
            match key.as_str() {
                "tags" => {
                    self.tags = value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "transaction" => {
                    self.transaction_behavior = match value.to_lowercase().as_str() {
                        "none" => TransactionBehavior::None,
                        "default" => TransactionBehavior::Default,
                        other => {
                            return Err(MigrateError::Config(format!(
                                "{}: unknown transaction setting '{}' (expected default or none)",
                                self.path.display(),
                                other
                            )))
                        }
                    };
                }
                "breaking" => self.breaking_change = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }
        Ok(())
    }
}

impl Migration for SqlFileMigration {
    fn version(&self) -> i64 {
        self.version
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn transaction_behavior(&self) -> TransactionBehavior {
        self.transaction_behavior
    }

    fn breaking_change(&self) -> bool {
        self.breaking_change
    }

    fn up(&self, ctx: &mut MigrationContext) -> Result<()> {
        for batch in split_batches(&self.up_sql) {
            ctx.execute().sql(&batch);
        }
        Ok(())
    }

    fn down(&self, ctx: &mut MigrationContext) -> Result<()> {
        let down_sql = self.down_sql.as_ref().ok_or_else(|| {
            MigrateError::NotReversible(format!(
                "{} (no .down.sql file)",
                self.path.display()
            ))
        })?;
        for batch in split_batches(down_sql) {
            ctx.execute().sql(&batch);
        }
        Ok(())
    }
}

/// Split a script on `GO` separator lines, dropping empty batches.
pub(crate) fn split_batches(script: &str) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    for line in script.lines() {
        if line.trim().eq_ignore_ascii_case("go") {
            push_batch(&mut batches, &mut current);
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_batch(&mut batches, &mut current);
    batches
}

fn push_batch(batches: &mut Vec<String>, current: &mut String) {
    let batch = std::mem::take(current);
    let has_sql = batch
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with("--"));
    if has_sql {
        batches.push(batch.trim().to_string());
    }
}

/// Parse `V<version>__<description>.sql` / `.down.sql` file names.
fn parse_file_name(name: &str) -> Option<(i64, String, bool)> {
    let (stem, is_down) = match name.strip_suffix(".down.sql") {
        Some(stem) => (stem, true),
        None => (name.strip_suffix(".sql")?, false),
    };
    let rest = stem.strip_prefix('V').or_else(|| stem.strip_prefix('v'))?;
    let (version, description) = rest.split_once("__")?;
    let version = version.parse().ok()?;
    Some((version, description.replace('_', " "), is_down))
}

/// Load every SQL migration in `dir`.
///
/// # Errors
///
/// Returns an error for unreadable files, duplicate versions and down
/// scripts without a matching up script.
pub fn load_dir(dir: &Path) -> Result<MigrationSet> {
    if !dir.is_dir() {
        return Err(MigrateError::Config(format!(
            "Migrations directory not found: {}",
            dir.display()
        )));
    }

    let mut ups: BTreeMap<i64, SqlFileMigration> = BTreeMap::new();
    let mut downs: BTreeMap<i64, (String, PathBuf)> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((version, description, is_down)) = parse_file_name(name) else {
            debug!("Skipping {} (not a migration file name)", path.display());
            continue;
        };
        let sql = fs::read_to_string(&path)?;
        if is_down {
            downs.insert(version, (sql, path));
            continue;
        }
        if ups.contains_key(&version) {
            return Err(MigrateError::DuplicateVersion(version));
        }
        let migration = SqlFileMigration::new(version, &description, sql, path)?;
        ups.insert(version, migration);
    }

    for (version, (sql, path)) in downs {
        let up = ups.get_mut(&version).ok_or_else(|| {
            MigrateError::Config(format!(
                "{} has no matching up script",
                path.display()
            ))
        })?;
        up.down_sql = Some(sql);
    }

    let mut set = MigrationSet::new();
    for migration in ups.into_values() {
        set.add(migration)?;
    }
    info!("Loaded {} SQL migration(s) from {}", set.len(), dir.display());
    Ok(set)
}
