pub mod cli;
mod connection_options;
pub mod driver;
pub mod error;
mod logger;
pub mod migrate;
mod outcome;
pub mod platform;
mod report;
mod result;
mod rows;
mod runner;
pub mod seed;
mod sync;
mod value;

#[cfg(test)]
mod testing;

pub use connection_options::ConnectionOptions;
pub use error::Error;
pub use logger::{LogLogger, Logger};
pub use outcome::{MigrationOutcome, SeedFailure, SeedInfo, SeedOutcome, SeedResult};
pub use report::log_result_summary;
pub use result::{Async, AsyncResult, Result};
pub use rows::{ColumnIndex, Row};
pub use runner::{MigrationRunner, MigrationRunnerBuilder, SeedFn, SeedFuture, SeedOptions};
pub use value::Value;
