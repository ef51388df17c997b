//! Results of a runner invocation and of a seed run.

use crate::error::Error;
use crate::migrate::Direction;

/// Files visited and rows inserted by a successful seed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SeedOutcome {
    pub executed_files: Vec<String>,
    pub created_records: u64,
}

/// A failed seed, carrying the progress made before the error.
#[derive(Debug)]
pub struct SeedFailure {
    pub executed_files: Vec<String>,
    pub created_records: u64,
    pub error: Error,
}

impl From<Error> for SeedFailure {
    fn from(error: Error) -> Self {
        Self {
            executed_files: vec![],
            created_records: 0,
            error,
        }
    }
}

pub type SeedResult = std::result::Result<SeedOutcome, SeedFailure>;

/// Seed section of a [`MigrationOutcome`].
#[derive(Debug)]
pub struct SeedInfo {
    pub executed_files: Vec<String>,
    pub created_records: u64,
    pub seed_error: Option<Error>,
}

impl From<SeedResult> for SeedInfo {
    fn from(result: SeedResult) -> Self {
        match result {
            Ok(outcome) => Self {
                executed_files: outcome.executed_files,
                created_records: outcome.created_records,
                seed_error: None,
            },
            Err(failure) => Self {
                executed_files: failure.executed_files,
                created_records: failure.created_records,
                seed_error: Some(failure.error),
            },
        }
    }
}

/// The single result of a runner invocation.
///
/// Only constructed through [`MigrationOutcome::success`] and [`MigrationOutcome::failure`],
/// which guarantee seed information is never attached to a failed or reverse run.
#[derive(Debug)]
pub struct MigrationOutcome {
    direction: Direction,
    step_names: Vec<String>,
    failed_steps: Vec<String>,
    migration_error: Option<Error>,
    seed_info: Option<SeedInfo>,
}

impl MigrationOutcome {
    pub fn success(direction: Direction, step_names: Vec<String>, seed_info: Option<SeedInfo>) -> Self {
        Self {
            direction,
            step_names,
            failed_steps: vec![],
            migration_error: None,
            seed_info: if direction == Direction::Up {
                seed_info
            } else {
                None
            },
        }
    }

    pub fn failure(
        direction: Direction,
        step_names: Vec<String>,
        failed_steps: Vec<String>,
        migration_error: Error,
    ) -> Self {
        Self {
            direction,
            step_names,
            failed_steps,
            migration_error: Some(migration_error),
            seed_info: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_up_migration(&self) -> bool {
        self.direction == Direction::Up
    }

    pub fn step_names(&self) -> &[String] {
        &self.step_names
    }

    pub fn failed_steps(&self) -> &[String] {
        &self.failed_steps
    }

    pub fn migration_error(&self) -> Option<&Error> {
        self.migration_error.as_ref()
    }

    pub fn seed_info(&self) -> Option<&SeedInfo> {
        self.seed_info.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.migration_error.is_none()
    }

    pub fn has_seeded(&self) -> bool {
        self.seed_info.is_some()
    }

    pub fn is_seed_success(&self) -> bool {
        self.seed_info
            .as_ref()
            .is_some_and(|info| info.seed_error.is_none())
    }

    pub fn into_result(self) -> std::result::Result<Self, Self> {
        if self.is_success() { Ok(self) } else { Err(self) }
    }
}
