//! Migration runner.
//!
//! The runner compares the migration set against the version table and
//! applies or reverts migrations through a [`Processor`]. Each migration's
//! expressions and its version row are committed together; a failure rolls
//! the open transaction back and reports the failing version.

mod report;

pub use report::{
    MigrationEntry, MigrationListing, MigrationOutcome, MigrationState, RunDirection, RunReport,
};

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::MigrationContext;
use crate::config::RunnerConfig;
use crate::core::Processor;
use crate::error::{MigrateError, Result};
use crate::expressions::Expression;
use crate::migration::{MaintenanceStage, Migration, MigrationSet, TransactionBehavior};
use crate::version::{AppliedVersion, VersionInfo, VersionLoader};

/// Transaction scope of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// One transaction per migration, including its version row.
    #[default]
    PerMigration,
    /// One transaction for the whole run.
    PerSession,
    /// No transactions.
    None,
}

/// Applies and reverts migrations against one processor.
pub struct MigrationRunner {
    processor: Arc<dyn Processor>,
    migrations: MigrationSet,
    config: RunnerConfig,
    cancel: CancellationToken,
}

impl MigrationRunner {
    pub fn new(processor: Arc<dyn Processor>, migrations: MigrationSet, config: RunnerConfig) -> Self {
        Self {
            processor,
            migrations,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between migrations once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn migrations(&self) -> &MigrationSet {
        &self.migrations
    }

    fn loader(&self) -> VersionLoader<'_> {
        VersionLoader::new(self.processor.as_ref(), &self.config.version_table)
    }

    /// Versioned migrations selected by the configured tags.
    fn candidates(&self) -> Vec<Arc<dyn Migration>> {
        self.migrations
            .filtered(&self.config.tags, self.config.tag_behavior)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!("Cancellation requested; stopping before the next migration");
            return Err(MigrateError::Cancelled);
        }
        Ok(())
    }

    /// Apply every pending migration.
    pub async fn migrate_up(&self) -> Result<RunReport> {
        self.up(None).await
    }

    /// Apply pending migrations up to and including `version`.
    pub async fn migrate_up_to(&self, version: i64) -> Result<RunReport> {
        self.up(Some(version)).await
    }

    async fn up(&self, target: Option<i64>) -> Result<RunReport> {
        let mut report = RunReport::new(RunDirection::Up, self.processor.is_preview());
        let loader = self.loader();
        let mut applied = loader.load().await?;

        let pending: Vec<Arc<dyn Migration>> = self
            .candidates()
            .into_iter()
            .filter(|m| !applied.is_applied(m.version()))
            .filter(|m| target.map_or(true, |t| m.version() <= t))
            .collect();

        if !self.config.allow_breaking_change {
            if let Some(m) = pending.iter().find(|m| m.breaking_change()) {
                return Err(MigrateError::BreakingChange(m.version()));
            }
        }
        loader.ensure_table().await?;

        info!(
            "{} pending migration(s), current version {:?}",
            pending.len(),
            applied.latest()
        );

        let result = self
            .in_session(self.run_up(&pending, &mut applied, &mut report))
            .await;
        result?;

        report.finish(applied.latest());
        info!(
            "Applied {} migration(s) in {:.2}s",
            report.applied.len(),
            report.duration_seconds
        );
        Ok(report)
    }

    async fn run_up(
        &self,
        pending: &[Arc<dyn Migration>],
        applied: &mut VersionInfo,
        report: &mut RunReport,
    ) -> Result<()> {
        self.run_maintenance(MaintenanceStage::BeforeAll).await?;
        for migration in pending {
            self.check_cancelled()?;
            self.run_maintenance(MaintenanceStage::BeforeEach).await?;

            let started = Instant::now();
            if let Some(row) = self.apply(migration.as_ref(), RunDirection::Up).await? {
                applied.insert(row);
            }
            report.applied.push(outcome(migration.as_ref(), started));

            self.run_maintenance(MaintenanceStage::AfterEach).await?;
        }

        self.run_maintenance(MaintenanceStage::BeforeProfiles).await?;
        if let Some(profile) = &self.config.profile {
            let migrations = self.migrations.profile(profile);
            debug!("Running {} migration(s) of profile '{}'", migrations.len(), profile);
            for migration in migrations {
                self.check_cancelled()?;
                self.apply_unversioned(migration.as_ref()).await?;
            }
        }
        self.run_maintenance(MaintenanceStage::AfterAll).await
    }

    async fn run_maintenance(&self, stage: MaintenanceStage) -> Result<()> {
        for migration in self.migrations.maintenance(stage) {
            debug!("Maintenance {:?}: {}", stage, migration.description());
            self.apply_unversioned(migration.as_ref()).await?;
        }
        Ok(())
    }

    /// Revert applied migrations above `version`.
    pub async fn migrate_down(&self, version: i64) -> Result<RunReport> {
        let applied = self.loader().load().await?;
        let versions: Vec<i64> = applied.versions().rev().filter(|v| *v > version).collect();
        self.down(applied, versions).await
    }

    /// Revert the `steps` most recently applied migrations.
    pub async fn rollback(&self, steps: usize) -> Result<RunReport> {
        let applied = self.loader().load().await?;
        let versions: Vec<i64> = applied.versions().rev().take(steps).collect();
        self.down(applied, versions).await
    }

    /// Revert applied migrations above `version`, which must itself be
    /// applied. Rolling back to 0 reverts everything and drops the version
    /// table.
    pub async fn rollback_to(&self, version: i64) -> Result<RunReport> {
        let applied = self.loader().load().await?;
        if version != 0 && !applied.is_applied(version) {
            return Err(MigrateError::Config(format!(
                "Cannot roll back to version {}: it is not applied",
                version
            )));
        }
        let versions: Vec<i64> = applied.versions().rev().filter(|v| *v > version).collect();
        let report = self.down(applied, versions).await?;
        if version == 0 {
            self.loader().remove_table().await?;
        }
        Ok(report)
    }

    async fn down(&self, mut applied: VersionInfo, versions: Vec<i64>) -> Result<RunReport> {
        let mut report = RunReport::new(RunDirection::Down, self.processor.is_preview());
        let migrations = versions
            .iter()
            .map(|v| {
                self.migrations
                    .get(*v)
                    .cloned()
                    .ok_or(MigrateError::MissingMigration(*v))
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Reverting {} migration(s)", migrations.len());
        let result = self
            .in_session(self.run_down(&migrations, &mut applied, &mut report))
            .await;
        result?;

        report.finish(applied.latest());
        info!(
            "Reverted {} migration(s) in {:.2}s",
            report.reverted.len(),
            report.duration_seconds
        );
        Ok(report)
    }

    async fn run_down(
        &self,
        migrations: &[Arc<dyn Migration>],
        applied: &mut VersionInfo,
        report: &mut RunReport,
    ) -> Result<()> {
        for migration in migrations {
            self.check_cancelled()?;
            let started = Instant::now();
            self.apply(migration.as_ref(), RunDirection::Down).await?;
            applied.remove(migration.version());
            report.reverted.push(outcome(migration.as_ref(), started));
        }
        Ok(())
    }

    /// Applied, pending and missing migrations.
    pub async fn list(&self) -> Result<MigrationListing> {
        let applied = self.loader().load().await?;
        let mut entries: Vec<MigrationEntry> = self
            .migrations
            .iter()
            .map(|m| {
                let row = applied.get(m.version());
                MigrationEntry {
                    version: m.version(),
                    description: m.description().to_string(),
                    state: if row.is_some() {
                        MigrationState::Applied
                    } else {
                        MigrationState::Pending
                    },
                    applied_on: row.and_then(|r| r.applied_on),
                    tags: m.tags().to_vec(),
                    breaking_change: m.breaking_change(),
                }
            })
            .collect();

        for version in applied.versions() {
            if self.migrations.get(version).is_some() {
                continue;
            }
            let row = applied.get(version);
            entries.push(MigrationEntry {
                version,
                description: row
                    .and_then(|r| r.description.clone())
                    .unwrap_or_default(),
                state: MigrationState::Missing,
                applied_on: row.and_then(|r| r.applied_on),
                tags: Vec::new(),
                breaking_change: false,
            });
        }
        entries.sort_by_key(|e| e.version);

        Ok(MigrationListing {
            current_version: applied.latest(),
            entries,
        })
    }

    /// Fail when an unapplied migration sorts below the latest applied one.
    pub async fn validate_version_order(&self) -> Result<()> {
        let applied = self.loader().load().await?;
        let Some(latest) = applied.latest() else {
            return Ok(());
        };
        let pending: Vec<i64> = self
            .candidates()
            .iter()
            .map(|m| m.version())
            .filter(|v| *v < latest && !applied.is_applied(*v))
            .collect();
        if pending.is_empty() {
            Ok(())
        } else {
            Err(MigrateError::VersionOrder { latest, pending })
        }
    }

    pub async fn has_pending(&self) -> Result<bool> {
        let applied = self.loader().load().await?;
        Ok(self
            .candidates()
            .iter()
            .any(|m| !applied.is_applied(m.version())))
    }

    /// Build the expressions of one direction and validate them.
    fn build(&self, migration: &dyn Migration, direction: RunDirection) -> Result<Vec<Expression>> {
        let mut ctx = MigrationContext::new(self.processor.database_type());
        match direction {
            RunDirection::Up => migration.up(&mut ctx)?,
            RunDirection::Down => migration.down(&mut ctx)?,
        }
        let expressions = ctx.into_expressions();
        for expression in &expressions {
            expression.ensure_valid()?;
        }
        Ok(expressions)
    }

    async fn execute_all(&self, expressions: &[Expression]) -> Result<()> {
        for expression in expressions {
            self.processor.process_guarded(expression).await?;
        }
        Ok(())
    }

    /// Apply or revert one versioned migration with its version row.
    /// Returns the recorded row when applying.
    async fn apply(
        &self,
        migration: &dyn Migration,
        direction: RunDirection,
    ) -> Result<Option<AppliedVersion>> {
        let version = migration.version();
        let description = migration.description();
        match direction {
            RunDirection::Up => info!("Applying {}: {}", version, description),
            RunDirection::Down => info!("Reverting {}: {}", version, description),
        }

        let work = async {
            let expressions = self.build(migration, direction)?;
            self.execute_all(&expressions).await?;
            let loader = self.loader();
            match direction {
                RunDirection::Up => loader.record_up(version, description).await.map(Some),
                RunDirection::Down => loader.record_down(version).await.map(|_| None),
            }
        };
        self.in_transaction(migration.transaction_behavior(), work)
            .await
            .map_err(|e| MigrateError::migration(version, description, e))
    }

    /// Run a maintenance or profile migration without a version row.
    async fn apply_unversioned(&self, migration: &dyn Migration) -> Result<()> {
        let work = async {
            let expressions = self.build(migration, RunDirection::Up)?;
            self.execute_all(&expressions).await
        };
        self.in_transaction(migration.transaction_behavior(), work)
            .await
            .map_err(|e| MigrateError::migration(migration.version(), migration.description(), e))
    }

    /// Wrap a migration's work in the transaction its mode calls for.
    async fn in_transaction<T, F>(&self, behavior: TransactionBehavior, work: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match (self.config.transaction_mode, behavior) {
            (TransactionMode::PerMigration, TransactionBehavior::Default) => {
                self.processor.begin_transaction().await?;
                match work.await {
                    Ok(value) => {
                        self.processor.commit().await?;
                        Ok(value)
                    }
                    Err(e) => {
                        self.rollback_quietly().await;
                        Err(e)
                    }
                }
            }
            (TransactionMode::PerSession, TransactionBehavior::None) => {
                // Work already done in the session is committed first.
                self.processor.commit().await?;
                let result = work.await;
                self.processor.begin_transaction().await?;
                result
            }
            _ => work.await,
        }
    }

    /// Run `work` inside the session transaction when configured.
    async fn in_session<F>(&self, work: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        if self.config.transaction_mode != TransactionMode::PerSession {
            return work.await;
        }
        self.processor.begin_transaction().await?;
        match work.await {
            Ok(()) => self.processor.commit().await,
            Err(e) => {
                self.rollback_quietly().await;
                Err(e)
            }
        }
    }

    async fn rollback_quietly(&self) {
        if let Err(e) = self.processor.rollback().await {
            warn!("Rollback failed: {}", e);
        }
    }
}

fn outcome(migration: &dyn Migration, started: Instant) -> MigrationOutcome {
    MigrationOutcome {
        version: migration.version(),
        description: migration.description().to_string(),
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::builder::ColumnSyntax;
    use crate::core::{ProcessorOptions, Value};
    use crate::dialect::{CompatibilityMode, Generator};
    use crate::drivers::postgres::PostgresGenerator;
    use crate::drivers::DatabaseType;
    use crate::expressions::SchemaObject;
    use crate::migration::TagBehavior;

    /// Committed and in-flight state of the fake database.
    #[derive(Default, Clone)]
    struct Db {
        tables: HashSet<String>,
        versions: BTreeMap<i64, AppliedVersion>,
        log: Vec<String>,
    }

    /// Interprets expressions instead of SQL and models transactions by
    /// snapshotting the committed state.
    struct FakeProcessor {
        generator: PostgresGenerator,
        options: ProcessorOptions,
        committed: Mutex<Db>,
        working: Mutex<Option<Db>>,
        transactions: Mutex<Vec<&'static str>>,
    }

    impl FakeProcessor {
        fn new() -> Self {
            Self {
                generator: PostgresGenerator::new(CompatibilityMode::Strict),
                options: ProcessorOptions::default(),
                committed: Mutex::new(Db::default()),
                working: Mutex::new(None),
                transactions: Mutex::new(Vec::new()),
            }
        }

        fn with_db<T>(&self, f: impl FnOnce(&mut Db) -> T) -> T {
            let mut working = self.working.lock().unwrap();
            match working.as_mut() {
                Some(db) => f(db),
                None => f(&mut self.committed.lock().unwrap()),
            }
        }

        fn committed(&self) -> Db {
            self.committed.lock().unwrap().clone()
        }

        fn transactions(&self) -> Vec<&'static str> {
            self.transactions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Processor for FakeProcessor {
        fn generator(&self) -> &dyn Generator {
            &self.generator
        }

        fn database_type(&self) -> DatabaseType {
            DatabaseType::Postgres
        }

        fn options(&self) -> &ProcessorOptions {
            &self.options
        }

        async fn execute(&self, sql: &str) -> Result<()> {
            if sql.contains("FAIL") {
                return Err(MigrateError::Generation(format!("boom: {}", sql)));
            }
            self.with_db(|db| db.log.push(sql.to_string()));
            Ok(())
        }

        async fn process(&self, expression: &Expression) -> Result<()> {
            match expression {
                Expression::CreateTable(e) => {
                    self.with_db(|db| db.tables.insert(e.table.name.clone()));
                }
                Expression::DeleteTable(e) => {
                    self.with_db(|db| db.tables.remove(&e.table.name));
                }
                Expression::InsertData(e) if e.table.name == "VersionInfo" => {
                    let version = match e.rows[0].get("Version") {
                        Some(Value::Int(v)) => *v,
                        other => panic!("unexpected version value {:?}", other),
                    };
                    let description = match e.rows[0].get("Description") {
                        Some(Value::String(s)) => Some(s.clone()),
                        _ => None,
                    };
                    self.with_db(|db| {
                        db.versions.insert(
                            version,
                            AppliedVersion {
                                version,
                                applied_on: None,
                                description,
                            },
                        )
                    });
                    return Ok(());
                }
                Expression::DeleteData(e) if e.table.name == "VersionInfo" => {
                    if let Some(Value::Int(v)) = e.rows[0].get("Version") {
                        self.with_db(|db| db.versions.remove(v));
                    }
                    return Ok(());
                }
                _ => {}
            }
            for sql in self.generator.generate(expression)? {
                self.execute(&sql).await?;
            }
            Ok(())
        }

        async fn begin_transaction(&self) -> Result<()> {
            let snapshot = self.committed();
            *self.working.lock().unwrap() = Some(snapshot);
            self.transactions.lock().unwrap().push("begin");
            Ok(())
        }

        async fn commit(&self) -> Result<()> {
            if let Some(db) = self.working.lock().unwrap().take() {
                *self.committed.lock().unwrap() = db;
            }
            self.transactions.lock().unwrap().push("commit");
            Ok(())
        }

        async fn rollback(&self) -> Result<()> {
            self.working.lock().unwrap().take();
            self.transactions.lock().unwrap().push("rollback");
            Ok(())
        }

        async fn exists(&self, object: &SchemaObject) -> Result<bool> {
            Ok(match object {
                SchemaObject::Table { table } => self.with_db(|db| db.tables.contains(&table.name)),
                _ => false,
            })
        }

        async fn fetch_applied_versions(&self, _sql: &str) -> Result<Vec<AppliedVersion>> {
            Ok(self.with_db(|db| db.versions.values().cloned().collect()))
        }

        async fn close(&self) {}
    }

    struct TableMigration {
        version: i64,
        table: &'static str,
        tags: Vec<String>,
        breaking: bool,
        behavior: TransactionBehavior,
    }

    impl TableMigration {
        fn new(version: i64, table: &'static str) -> Self {
            Self {
                version,
                table,
                tags: Vec::new(),
                breaking: false,
                behavior: TransactionBehavior::Default,
            }
        }
    }

    impl Migration for TableMigration {
        fn version(&self) -> i64 {
            self.version
        }

        fn description(&self) -> &str {
            self.table
        }

        fn tags(&self) -> &[String] {
            &self.tags
        }

        fn transaction_behavior(&self) -> TransactionBehavior {
            self.behavior
        }

        fn breaking_change(&self) -> bool {
            self.breaking
        }

        fn up(&self, ctx: &mut MigrationContext) -> Result<()> {
            ctx.create()
                .table(self.table)
                .with_column("id")
                .as_int32()
                .primary_key();
            Ok(())
        }
    }

    struct SqlMigration {
        version: i64,
        sql: &'static str,
    }

    impl Migration for SqlMigration {
        fn version(&self) -> i64 {
            self.version
        }

        fn description(&self) -> &str {
            "raw sql"
        }

        fn up(&self, ctx: &mut MigrationContext) -> Result<()> {
            ctx.execute().sql(self.sql);
            Ok(())
        }

        fn down(&self, ctx: &mut MigrationContext) -> Result<()> {
            ctx.execute().sql("SELECT 'undo'");
            Ok(())
        }
    }

    fn runner_with(
        processor: &Arc<FakeProcessor>,
        set: MigrationSet,
        config: RunnerConfig,
    ) -> MigrationRunner {
        let processor: Arc<dyn Processor> = processor.clone();
        MigrationRunner::new(processor, set, config)
    }

    fn three_tables() -> MigrationSet {
        let mut set = MigrationSet::new();
        set.add(TableMigration::new(1, "users")).unwrap();
        set.add(TableMigration::new(2, "orders")).unwrap();
        set.add(TableMigration::new(3, "invoices")).unwrap();
        set
    }

    #[tokio::test]
    async fn test_migrate_up_applies_in_order_once() {
        let processor = Arc::new(FakeProcessor::new());
        let runner = runner_with(&processor, three_tables(), RunnerConfig::default());

        let report = runner.migrate_up().await.unwrap();
        let applied: Vec<i64> = report.applied.iter().map(|o| o.version).collect();
        assert_eq!(applied, vec![1, 2, 3]);
        assert_eq!(report.current_version, Some(3));

        let db = processor.committed();
        assert!(db.tables.contains("VersionInfo"));
        assert!(db.tables.contains("invoices"));
        assert_eq!(db.versions.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);

        let again = runner.migrate_up().await.unwrap();
        assert!(again.applied.is_empty());
        assert!(!runner.has_pending().await.unwrap());
    }

    #[tokio::test]
    async fn test_migrate_up_to_stops_at_target() {
        let processor = Arc::new(FakeProcessor::new());
        let runner = runner_with(&processor, three_tables(), RunnerConfig::default());

        runner.migrate_up_to(2).await.unwrap();
        let listing = runner.list().await.unwrap();
        assert_eq!(listing.current_version, Some(2));
        assert_eq!(
            listing.pending().map(|e| e.version).collect::<Vec<_>>(),
            vec![3]
        );
    }

    #[tokio::test]
    async fn test_failure_rolls_back_only_the_failing_migration() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        set.add(TableMigration::new(1, "users")).unwrap();
        set.add(SqlMigration {
            version: 2,
            sql: "SELECT FAIL",
        })
        .unwrap();
        set.add(TableMigration::new(3, "invoices")).unwrap();
        let runner = runner_with(&processor, set, RunnerConfig::default());

        let err = runner.migrate_up().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Migration 2 (raw sql) failed"), "{}", message);

        let db = processor.committed();
        assert_eq!(db.versions.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert!(!db.tables.contains("invoices"));
        assert_eq!(processor.transactions().last(), Some(&"rollback"));
    }

    #[tokio::test]
    async fn test_per_session_failure_rolls_back_everything() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        set.add(TableMigration::new(1, "users")).unwrap();
        set.add(SqlMigration {
            version: 2,
            sql: "SELECT FAIL",
        })
        .unwrap();
        let config = RunnerConfig {
            transaction_mode: TransactionMode::PerSession,
            ..RunnerConfig::default()
        };
        let runner = runner_with(&processor, set, config);

        assert!(runner.migrate_up().await.is_err());
        assert!(processor.committed().versions.is_empty());
        assert_eq!(processor.transactions(), vec!["begin", "rollback"]);
    }

    #[tokio::test]
    async fn test_no_transaction_migration_skips_begin() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        let mut migration = TableMigration::new(1, "users");
        migration.behavior = TransactionBehavior::None;
        set.add(migration).unwrap();
        let runner = runner_with(&processor, set, RunnerConfig::default());

        runner.migrate_up().await.unwrap();
        assert!(processor.transactions().is_empty());
        assert_eq!(processor.committed().versions.len(), 1);
    }

    #[tokio::test]
    async fn test_breaking_change_requires_opt_in() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        let mut migration = TableMigration::new(4, "archive");
        migration.breaking = true;
        set.add(migration).unwrap();

        let runner = runner_with(&processor, set.clone(), RunnerConfig::default());
        let err = runner.migrate_up().await.unwrap_err();
        assert!(matches!(err, MigrateError::BreakingChange(4)));
        let untouched = processor.committed();
        assert!(untouched.tables.is_empty());
        assert!(untouched.log.is_empty());

        let config = RunnerConfig {
            allow_breaking_change: true,
            ..RunnerConfig::default()
        };
        let runner = runner_with(&processor, set, config);
        assert_eq!(runner.migrate_up().await.unwrap().applied.len(), 1);
    }

    #[tokio::test]
    async fn test_tags_filter_pending() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        set.add(TableMigration::new(1, "users")).unwrap();
        let mut uk_only = TableMigration::new(2, "vat_rates");
        uk_only.tags = vec!["uk".into()];
        set.add(uk_only).unwrap();

        let config = RunnerConfig {
            tags: vec!["us".into()],
            tag_behavior: TagBehavior::RequireAll,
            ..RunnerConfig::default()
        };
        let runner = runner_with(&processor, set, config);
        let report = runner.migrate_up().await.unwrap();
        assert_eq!(report.applied.len(), 1);
        assert!(!runner.has_pending().await.unwrap());
    }

    #[tokio::test]
    async fn test_rollback_steps_and_auto_reverse() {
        let processor = Arc::new(FakeProcessor::new());
        let runner = runner_with(&processor, three_tables(), RunnerConfig::default());
        runner.migrate_up().await.unwrap();

        let report = runner.rollback(2).await.unwrap();
        let reverted: Vec<i64> = report.reverted.iter().map(|o| o.version).collect();
        assert_eq!(reverted, vec![3, 2]);
        assert_eq!(report.current_version, Some(1));

        let db = processor.committed();
        assert!(!db.tables.contains("orders"));
        assert!(db.tables.contains("users"));
    }

    #[tokio::test]
    async fn test_rollback_to_zero_drops_version_table() {
        let processor = Arc::new(FakeProcessor::new());
        let runner = runner_with(&processor, three_tables(), RunnerConfig::default());
        runner.migrate_up().await.unwrap();

        let err = runner.rollback_to(7).await.unwrap_err();
        assert!(err.to_string().contains("not applied"));

        runner.rollback_to(0).await.unwrap();
        let db = processor.committed();
        assert!(db.tables.is_empty());
        assert!(db.versions.is_empty());
    }

    #[tokio::test]
    async fn test_migrate_down_reports_missing_migration() {
        let processor = Arc::new(FakeProcessor::new());
        runner_with(&processor, three_tables(), RunnerConfig::default())
            .migrate_up()
            .await
            .unwrap();

        let mut fewer = MigrationSet::new();
        fewer.add(TableMigration::new(1, "users")).unwrap();
        let runner = runner_with(&processor, fewer, RunnerConfig::default());

        let err = runner.migrate_down(0).await.unwrap_err();
        assert!(matches!(err, MigrateError::MissingMigration(3)));

        let listing = runner.list().await.unwrap();
        let states: Vec<MigrationState> = listing.entries.iter().map(|e| e.state).collect();
        assert_eq!(
            states,
            vec![
                MigrationState::Applied,
                MigrationState::Missing,
                MigrationState::Missing
            ]
        );
    }

    #[tokio::test]
    async fn test_validate_version_order() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        set.add(TableMigration::new(1, "users")).unwrap();
        set.add(TableMigration::new(3, "invoices")).unwrap();
        let runner = runner_with(&processor, set, RunnerConfig::default());
        runner.migrate_up().await.unwrap();
        runner.validate_version_order().await.unwrap();

        let mut late = MigrationSet::new();
        late.add(TableMigration::new(1, "users")).unwrap();
        late.add(TableMigration::new(2, "orders")).unwrap();
        late.add(TableMigration::new(3, "invoices")).unwrap();
        let runner = runner_with(&processor, late, RunnerConfig::default());
        match runner.validate_version_order().await.unwrap_err() {
            MigrateError::VersionOrder { latest, pending } => {
                assert_eq!(latest, 3);
                assert_eq!(pending, vec![2]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_migrations() {
        let processor = Arc::new(FakeProcessor::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let runner = runner_with(&processor, three_tables(), RunnerConfig::default())
            .with_cancellation(cancel);

        let err = runner.migrate_up().await.unwrap_err();
        assert!(matches!(err, MigrateError::Cancelled));
        assert!(processor.committed().versions.is_empty());
    }

    #[tokio::test]
    async fn test_maintenance_and_profiles_run_unversioned() {
        let processor = Arc::new(FakeProcessor::new());
        let mut set = MigrationSet::new();
        set.add(TableMigration::new(1, "users")).unwrap();
        set.add_maintenance(
            MaintenanceStage::AfterAll,
            SqlMigration {
                version: 0,
                sql: "ANALYZE",
            },
        );
        set.add_profile(
            "dev",
            SqlMigration {
                version: 0,
                sql: "INSERT INTO users VALUES (1)",
            },
        );
        let config = RunnerConfig {
            profile: Some("dev".into()),
            ..RunnerConfig::default()
        };
        let runner = runner_with(&processor, set, config);
        runner.migrate_up().await.unwrap();

        let db = processor.committed();
        assert_eq!(db.versions.len(), 1);
        let tail: Vec<&str> = db.log.iter().rev().take(2).map(String::as_str).collect();
        assert_eq!(tail, vec!["ANALYZE", "INSERT INTO users VALUES (1)"]);
    }
}
