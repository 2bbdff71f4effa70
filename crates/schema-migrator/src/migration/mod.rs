//! Migrations and migration sets.
//!
//! A [`Migration`] describes one versioned change through the fluent
//! builder. A [`MigrationSet`] holds the versioned migrations of an
//! application together with its profile and maintenance migrations, and
//! selects the ones a run should consider.

mod sql_file;

pub use sql_file::{load_dir, SqlFileMigration};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::MigrationContext;
use crate::error::{MigrateError, Result};

/// Whether a migration runs inside the runner's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionBehavior {
    #[default]
    Default,
    /// Run outside any transaction (e.g. `CREATE INDEX CONCURRENTLY`).
    None,
}

/// How a tagged migration matches the runner's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagBehavior {
    /// The migration must carry every requested tag.
    #[default]
    RequireAll,
    /// The migration must carry at least one requested tag.
    RequireAny,
}

/// Points in a run where maintenance migrations execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStage {
    BeforeAll,
    BeforeEach,
    AfterEach,
    BeforeProfiles,
    AfterAll,
}

/// One versioned schema change.
pub trait Migration: Send + Sync {
    fn version(&self) -> i64;

    fn description(&self) -> &str;

    fn tags(&self) -> &[String] {
        &[]
    }

    /// Tag matching for this migration; the runner default when `None`.
    fn tag_behavior(&self) -> Option<TagBehavior> {
        None
    }

    fn transaction_behavior(&self) -> TransactionBehavior {
        TransactionBehavior::Default
    }

    /// Breaking changes only run when explicitly allowed.
    fn breaking_change(&self) -> bool {
        false
    }

    fn up(&self, ctx: &mut MigrationContext) -> Result<()>;

    /// Revert the migration. The default replays `up()` and reverses each
    /// expression in reverse order; it fails when any of them cannot be
    /// reversed.
    fn down(&self, ctx: &mut MigrationContext) -> Result<()> {
        let mut forward = MigrationContext::new(ctx.database_type());
        self.up(&mut forward)?;
        for expression in forward.into_expressions().iter().rev() {
            ctx.push(expression.reverse()?);
        }
        Ok(())
    }
}

/// Decide whether a migration with `tags` runs when the runner requested
/// `requested`.
pub fn matches_tags(tags: &[String], requested: &[String], behavior: TagBehavior) -> bool {
    if requested.is_empty() || tags.is_empty() {
        return true;
    }
    match behavior {
        TagBehavior::RequireAll => requested.iter().all(|t| tags.contains(t)),
        TagBehavior::RequireAny => requested.iter().any(|t| tags.contains(t)),
    }
}

/// The migrations known to a runner.
#[derive(Default, Clone)]
pub struct MigrationSet {
    versioned: BTreeMap<i64, Arc<dyn Migration>>,
    profiles: HashMap<String, Vec<Arc<dyn Migration>>>,
    maintenance: HashMap<MaintenanceStage, Vec<Arc<dyn Migration>>>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a versioned migration.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::DuplicateVersion` if the version is taken.
    pub fn add(&mut self, migration: impl Migration + 'static) -> Result<()> {
        self.add_arc(Arc::new(migration))
    }

    pub fn add_arc(&mut self, migration: Arc<dyn Migration>) -> Result<()> {
        let version = migration.version();
        if self.versioned.contains_key(&version) {
            return Err(MigrateError::DuplicateVersion(version));
        }
        self.versioned.insert(version, migration);
        Ok(())
    }

    /// Add a migration that runs on every `migrate_up` when `profile` is
    /// selected. Profile migrations are not versioned.
    pub fn add_profile(&mut self, profile: &str, migration: impl Migration + 'static) {
        self.profiles
            .entry(profile.to_string())
            .or_default()
            .push(Arc::new(migration));
    }

    pub fn add_maintenance(&mut self, stage: MaintenanceStage, migration: impl Migration + 'static) {
        self.maintenance
            .entry(stage)
            .or_default()
            .push(Arc::new(migration));
    }

    pub fn get(&self, version: i64) -> Option<&Arc<dyn Migration>> {
        self.versioned.get(&version)
    }

    pub fn len(&self) -> usize {
        self.versioned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versioned.is_empty()
    }

    /// Versioned migrations in ascending version order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<dyn Migration>> {
        self.versioned.values()
    }

    /// Versioned migrations matching the requested tags, ascending.
    pub fn filtered(
        &self,
        requested: &[String],
        default_behavior: TagBehavior,
    ) -> Vec<Arc<dyn Migration>> {
        self.versioned
            .values()
            .filter(|m| {
                matches_tags(
                    m.tags(),
                    requested,
                    m.tag_behavior().unwrap_or(default_behavior),
                )
            })
            .cloned()
            .collect()
    }

    pub fn profile(&self, name: &str) -> &[Arc<dyn Migration>] {
        self.profiles.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn maintenance(&self, stage: MaintenanceStage) -> &[Arc<dyn Migration>] {
        self.maintenance
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for MigrationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationSet")
            .field("versions", &self.versioned.keys().collect::<Vec<_>>())
            .field("profiles", &self.profiles.keys().collect::<Vec<_>>())
            .finish()
    }
}
