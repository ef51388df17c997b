use crate::driver::{ClientFactory, DatabaseClient, DsnClientFactory};
use crate::logger::Logger;
use crate::outcome::MigrationOutcome;
use crate::runner::{MigrationRunner, SeedOptions};
use crate::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Command line of the migration helper.
#[derive(Parser, Debug, Clone)]
#[command(name = "creed-migrate", about = "Runs SQL migrations and seeds the database")]
pub struct MigrateArgs {
    /// Reverts the last applied migration instead of applying the pending ones.
    #[arg(long)]
    pub down: bool,

    /// Directory of `<table>.json` seed files, loaded after a successful up migration.
    #[arg(long, value_name = "PATH")]
    pub seed_json: Option<PathBuf>,

    #[arg(long, env = "DATABASE_DSN")]
    pub dsn: String,

    #[arg(long, env = "MIGRATIONS_PATH", default_value = "migrations")]
    pub migrations_path: PathBuf,

    #[arg(long)]
    pub migrations_pattern: Option<String>,

    #[arg(long, default_value = "migrations")]
    pub tracking_table: String,

    /// Label of the migration group, used in debug output.
    #[arg(long, default_value = "Migration")]
    pub group: String,
}

/// Builds a runner connected to `args.dsn`.
pub fn build_runner(args: &MigrateArgs, logger: Arc<dyn Logger>) -> Result<MigrationRunner> {
    let factory = DsnClientFactory::create_from_dsn(&args.dsn)?;
    let client: Arc<dyn DatabaseClient> = Arc::from(factory.create_client()?);
    let factory: Arc<dyn ClientFactory> = Arc::new(factory);

    let mut builder = MigrationRunner::builder(&args.group)
        .with_client(client)
        .with_client_factory(factory)
        .with_logger(logger)
        .with_migrations_path(&args.migrations_path)
        .with_tracking_table(&args.tracking_table);
    if let Some(pattern) = &args.migrations_pattern {
        builder = builder.with_migrations_pattern(pattern);
    }

    builder.build()
}

/// Runs the direction selected by `args`.
///
/// `--seed-json` overrides the json path of `defaults`; a custom seed in `defaults` still wins.
pub async fn run_as_cli(
    runner: &MigrationRunner,
    args: &MigrateArgs,
    defaults: SeedOptions,
) -> std::result::Result<MigrationOutcome, MigrationOutcome> {
    if args.down {
        return runner.run_down().await;
    }

    let options = match &args.seed_json {
        Some(path) => defaults.with_json_path(path),
        None => defaults,
    };

    runner.run_up(options).await
}

pub fn exit_code(result: &std::result::Result<MigrationOutcome, MigrationOutcome>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
