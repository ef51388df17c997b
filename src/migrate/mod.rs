mod execution_result;
pub mod metadata;
mod migration;
mod migrator;

pub use execution_result::ExecutionResult;
pub use migration::SqlMigration;
pub use migrator::SqlMigrator;

use crate::driver::DatabaseClient;
use crate::logger::Logger;
use crate::AsyncResult;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Migration direction: `Up` applies pending steps, `Down` reverts applied ones.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Up => "up",
                Self::Down => "down",
            }
        )
    }
}

/// Append-only record of the steps an engine started, in execution order.
///
/// A step is recorded when it begins, so a step failing mid-way is still listed.
pub struct StepLog {
    direction: Direction,
    names: Vec<String>,
    logger: Arc<dyn Logger>,
}

impl StepLog {
    pub fn new(direction: Direction, logger: Arc<dyn Logger>) -> Self {
        Self {
            direction,
            names: vec![],
            logger,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn record(&mut self, name: &str) {
        match self.direction {
            Direction::Up => self
                .logger
                .info(&format!("Running Migration \"{}\"", name)),
            Direction::Down => self
                .logger
                .info(&format!("Reverting Migration \"{}\"", name)),
        }

        self.names.push(name.to_string());
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn last(&self) -> Option<&String> {
        self.names.last()
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

impl Debug for StepLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepLog")
            .field("direction", &self.direction)
            .field("names", &self.names)
            .finish()
    }
}

/// Discovers, orders and executes migration steps.
///
/// Engines must call [`StepLog::record`] right before executing each step and stop
/// at the first failing step.
pub trait MigrationEngine: Send + Sync {
    /// Applies every pending step.
    fn run_forward<'a>(
        &'a self,
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()>;

    /// Reverts the last applied step.
    fn run_reverse<'a>(
        &'a self,
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()>;
}
