use crate::driver::DatabaseClient;
use crate::error::{Error, ErrorKind};
use crate::migrate::metadata::{MetadataStorage, TableMetadataStorage};
use crate::migrate::{Direction, ExecutionResult, MigrationEngine, SqlMigration, StepLog};
use crate::{AsyncResult, Result};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref DEFAULT_PATTERN: Regex = Regex::new(r"^\d+[\w-]+\.sql$").unwrap();
}

/// Migration engine running the `.sql` files found in a directory.
///
/// Files whose name matches the pattern are executed in file name order;
/// applied step names are kept in a tracking table.
#[derive(Clone, Debug)]
pub struct SqlMigrator {
    path: PathBuf,
    pattern: Regex,
    tracking_table: String,
    params: BTreeMap<String, String>,
}

impl SqlMigrator {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pattern: DEFAULT_PATTERN.clone(),
            tracking_table: "migrations".to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_tracking_table(mut self, tracking_table: &str) -> Self {
        self.tracking_table = tracking_table.to_string();
        self
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Reads every migration file matching the pattern, sorted by name.
    pub async fn load_migrations(&self) -> Result<Vec<SqlMigration>> {
        let mut names = vec![];
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if self.pattern.is_match(&name) {
                names.push(name);
            }
        }

        names.sort();

        let mut migrations = Vec::with_capacity(names.len());
        for name in names {
            let contents = tokio::fs::read_to_string(self.path.join(&name)).await?;
            migrations.push(SqlMigration::parse(&name, &contents)?.bind_params(&self.params));
        }

        Ok(migrations)
    }

    async fn execute(
        &self,
        client: &dyn DatabaseClient,
        storage: &TableMetadataStorage<'_>,
        migration: &SqlMigration,
        direction: Direction,
    ) -> Result<()> {
        let sql = match direction {
            Direction::Up => &migration.up,
            Direction::Down => &migration.down,
        };

        debug!(target: "creed::migrate", "++ {} {}", if direction == Direction::Up {
            "migrating"
        } else {
            "reverting"
        }, migration.name);

        let start = chrono::Utc::now();
        if !sql.is_empty() {
            client
                .execute_batch(sql)
                .await
                .map_err(|e| e.with_kind(ErrorKind::MigrationStepError))?;
        }

        storage
            .complete(ExecutionResult {
                name: migration.name.clone(),
                direction,
                executed_at: chrono::Utc::now(),
                execution_time: (chrono::Utc::now() - start).num_milliseconds(),
            })
            .await
            .map_err(|e| e.with_kind(ErrorKind::MigrationStepError))
    }

    async fn migrate_up(&self, client: &dyn DatabaseClient, steps: &mut StepLog) -> Result<()> {
        let migrations = self.load_migrations().await?;
        let storage = TableMetadataStorage::new(client).with_table_name(&self.tracking_table);
        let executed = storage.get_executed_migration().await?;

        let plans = migrations
            .iter()
            .filter(|m| !executed.has_migration(&m.name))
            .collect::<Vec<_>>();

        if plans.is_empty() {
            info!(target: "creed::migrate", "No migration to execute.");
            return Ok(());
        }

        let global_start = chrono::Utc::now();
        for migration in &plans {
            steps.record(&migration.name);
            self.execute(client, &storage, migration, Direction::Up)
                .await?;
        }

        let total_time = chrono::Utc::now() - global_start;
        info!(target: "creed::migrate", "Migrated database in {}ms, {} migrations executed", total_time.num_milliseconds(), plans.len());

        Ok(())
    }

    async fn migrate_down(&self, client: &dyn DatabaseClient, steps: &mut StepLog) -> Result<()> {
        let storage = TableMetadataStorage::new(client).with_table_name(&self.tracking_table);
        let executed = storage.get_executed_migration().await?;
        let Some(last) = executed.last() else {
            info!(target: "creed::migrate", "No migration to revert.");
            return Ok(());
        };

        let migrations = self.load_migrations().await?;
        let migration = migrations
            .iter()
            .find(|m| m.name == last.name)
            .ok_or_else(|| Error::invalid_migration(&last.name, "migration file not found"))?;

        steps.record(&migration.name);
        if migration.down.is_empty() {
            return Err(Error::invalid_migration(
                &migration.name,
                "migration has no down section",
            ));
        }

        self.execute(client, &storage, migration, Direction::Down)
            .await
    }
}

impl MigrationEngine for SqlMigrator {
    fn run_forward<'a>(
        &'a self,
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()> {
        Box::pin(self.migrate_up(client, steps))
    }

    fn run_reverse<'a>(
        &'a self,
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()> {
        Box::pin(self.migrate_down(client, steps))
    }
}
