use clap::Parser;
use creed_migrate::cli::{build_runner, exit_code, run_as_cli, MigrateArgs};
use creed_migrate::{LogLogger, SeedOptions};
use env_logger::Env;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = MigrateArgs::parse();
    let runner = match build_runner(&args, Arc::new(LogLogger::new())) {
        Ok(runner) => runner,
        Err(e) => {
            log::error!(target: "creed::migrate", "{}", e);
            std::process::exit(1);
        }
    };

    let result = run_as_cli(&runner, &args, SeedOptions::default()).await;
    std::process::exit(exit_code(&result));
}
