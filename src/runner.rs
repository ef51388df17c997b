use crate::driver::{ClientFactory, DatabaseClient};
use crate::error::{Error, ErrorKind};
use crate::logger::Logger;
use crate::migrate::{Direction, MigrationEngine, SqlMigrator, StepLog};
use crate::outcome::{MigrationOutcome, SeedInfo, SeedResult};
use crate::report::log_result_summary;
use crate::seed::seed_from_json;
use crate::{Async, Result};
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

pub type SeedFuture<'a> = Async<'a, SeedResult>;

/// Caller supplied seeding routine, receiving the connected client and the client factory.
pub type SeedFn =
    Box<dyn for<'a> Fn(&'a dyn DatabaseClient, &'a dyn ClientFactory) -> SeedFuture<'a> + Send + Sync>;

/// Seeding requested for a forward run.
///
/// When both are given, `seed_custom` wins over `seed_json_path`.
#[derive(Default)]
pub struct SeedOptions {
    pub seed_custom: Option<SeedFn>,
    pub seed_json_path: Option<PathBuf>,
}

impl SeedOptions {
    pub fn with_custom<F>(mut self, seed: F) -> Self
    where
        F: for<'a> Fn(&'a dyn DatabaseClient, &'a dyn ClientFactory) -> SeedFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.seed_custom = Some(Box::new(seed));
        self
    }

    pub fn with_json_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.seed_json_path = Some(path.into());
        self
    }
}

impl Debug for SeedOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedOptions")
            .field("seed_custom", &self.seed_custom.is_some())
            .field("seed_json_path", &self.seed_json_path)
            .finish()
    }
}

pub struct MigrationRunnerBuilder {
    group_label: String,
    client: Option<Arc<dyn DatabaseClient>>,
    client_factory: Option<Arc<dyn ClientFactory>>,
    logger: Option<Arc<dyn Logger>>,
    params: BTreeMap<String, String>,
    migrations_path: PathBuf,
    migrations_pattern: Option<String>,
    tracking_table: String,
    engine: Option<Box<dyn MigrationEngine>>,
}

impl MigrationRunnerBuilder {
    fn new(group_label: &str) -> Self {
        Self {
            group_label: group_label.to_string(),
            client: None,
            client_factory: None,
            logger: None,
            params: BTreeMap::new(),
            migrations_path: PathBuf::from("migrations"),
            migrations_pattern: None,
            tracking_table: "migrations".to_string(),
            engine: None,
        }
    }

    pub fn with_client(mut self, client: Arc<dyn DatabaseClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_client_factory(mut self, client_factory: Arc<dyn ClientFactory>) -> Self {
        self.client_factory = Some(client_factory);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Values substituted to the `{{name}}` placeholders of the migration files.
    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_migrations_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.migrations_path = path.into();
        self
    }

    pub fn with_migrations_pattern(mut self, pattern: &str) -> Self {
        self.migrations_pattern = Some(pattern.to_string());
        self
    }

    pub fn with_tracking_table(mut self, tracking_table: &str) -> Self {
        self.tracking_table = tracking_table.to_string();
        self
    }

    /// Replaces the file based engine. Path, pattern, params and tracking table are then ignored.
    pub fn with_engine(mut self, engine: Box<dyn MigrationEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<MigrationRunner> {
        let client = self
            .client
            .ok_or_else(|| Error::missing_collaborator("client"))?;
        let client_factory = self
            .client_factory
            .ok_or_else(|| Error::missing_collaborator("client factory"))?;
        let logger = self
            .logger
            .ok_or_else(|| Error::missing_collaborator("logger"))?;

        let engine = match self.engine {
            Some(engine) => engine,
            None => {
                let mut migrator = SqlMigrator::new(&self.migrations_path)
                    .with_tracking_table(&self.tracking_table)
                    .with_params(self.params);
                if let Some(pattern) = &self.migrations_pattern {
                    migrator = migrator.with_pattern(Regex::new(pattern)?);
                }

                Box::new(migrator)
            }
        };

        Ok(MigrationRunner {
            group_label: self.group_label,
            client,
            client_factory,
            logger,
            engine,
        })
    }
}

/// Runs the migrations of one group, seeds after a successful forward run and
/// logs a summary of what happened.
///
/// Both [`MigrationRunner::run_up`] and [`MigrationRunner::run_down`] return the
/// outcome in `Ok` when the migration phase succeeded and in `Err` otherwise.
/// A seed failure does not fail the run.
pub struct MigrationRunner {
    group_label: String,
    client: Arc<dyn DatabaseClient>,
    client_factory: Arc<dyn ClientFactory>,
    logger: Arc<dyn Logger>,
    engine: Box<dyn MigrationEngine>,
}

impl MigrationRunner {
    pub fn builder(group_label: &str) -> MigrationRunnerBuilder {
        MigrationRunnerBuilder::new(group_label)
    }

    pub fn group_label(&self) -> &str {
        &self.group_label
    }

    pub async fn run_up(
        &self,
        options: SeedOptions,
    ) -> std::result::Result<MigrationOutcome, MigrationOutcome> {
        self.run(Direction::Up, options).await
    }

    pub async fn run_down(&self) -> std::result::Result<MigrationOutcome, MigrationOutcome> {
        self.run(Direction::Down, SeedOptions::default()).await
    }

    async fn run(
        &self,
        direction: Direction,
        options: SeedOptions,
    ) -> std::result::Result<MigrationOutcome, MigrationOutcome> {
        debug!(target: "creed::migrate", "{}: starting {} migration", self.group_label, direction);

        let outcome = match self.client.authenticate().await {
            Ok(()) => self.migrate(direction, options).await,
            Err(e) => MigrationOutcome::failure(
                direction,
                vec![],
                vec![],
                e.with_kind(ErrorKind::ConnectionError),
            ),
        };

        if let Err(e) = self.client.close().await {
            self.logger.warning(&e);
        }

        log_result_summary(self.logger.as_ref(), &outcome);
        debug!(
            target: "creed::migrate",
            "{}: {} migration {}",
            self.group_label,
            direction,
            if outcome.is_success() { "succeeded" } else { "failed" }
        );

        outcome.into_result()
    }

    async fn migrate(&self, direction: Direction, options: SeedOptions) -> MigrationOutcome {
        let client = self.client.as_ref();
        let mut steps = StepLog::new(direction, self.logger.clone());
        let result = match direction {
            Direction::Up => self.engine.run_forward(client, &mut steps).await,
            Direction::Down => self.engine.run_reverse(client, &mut steps).await,
        };

        if let Err(error) = result {
            let failed_steps = steps.last().cloned().into_iter().collect();
            return MigrationOutcome::failure(direction, steps.into_names(), failed_steps, error);
        }

        let seed_info = match direction {
            Direction::Up => self.seed(options).await,
            Direction::Down => None,
        };

        MigrationOutcome::success(direction, steps.into_names(), seed_info)
    }

    async fn seed(&self, options: SeedOptions) -> Option<SeedInfo> {
        let client = self.client.as_ref();
        let result = if let Some(seed) = options.seed_custom {
            debug!(target: "creed::migrate", "{}: running custom seed", self.group_label);
            seed(client, self.client_factory.as_ref()).await
        } else if let Some(path) = options.seed_json_path {
            debug!(target: "creed::migrate", "{}: seeding from {}", self.group_label, path.display());
            seed_from_json(path, client, self.logger.as_ref()).await
        } else {
            return None;
        };

        Some(SeedInfo::from(result))
    }
}
