use crate::error::Error;
use crate::logger::Logger;
use crate::outcome::MigrationOutcome;
use itertools::Itertools;
use std::panic::{catch_unwind, AssertUnwindSafe};

fn quote_names(names: &[String]) -> String {
    names.iter().map(|name| format!("\"{}\"", name)).join(", ")
}

fn log_migration_info(logger: &dyn Logger, outcome: &MigrationOutcome) {
    if let Some(error) = outcome.migration_error() {
        logger.error(error);
        let names = if outcome.failed_steps().is_empty() {
            "\"Unknown\"".to_string()
        } else {
            quote_names(outcome.failed_steps())
        };
        let revert = if outcome.is_up_migration() { "" } else { "revert " };

        logger.error(&format!("Migration(s) {} {}failed", names, revert));
    } else if outcome.step_names().is_empty() {
        logger.info(&"No pending migrations were found");
    } else {
        let verb = if outcome.is_up_migration() {
            "completed"
        } else {
            "reverted"
        };

        logger.info(&format!(
            "Migration(s) {} {} successfully",
            quote_names(outcome.step_names()),
            verb
        ));
    }
}

fn log_seed_info(logger: &dyn Logger, outcome: &MigrationOutcome) {
    match outcome.seed_info() {
        Some(seed) => {
            if let Some(error) = &seed.seed_error {
                logger.error(error);
                logger.error(&"Seed failed");
            } else if seed.created_records > 0 {
                logger.info(&format!("Seed inserted {} rows", seed.created_records));
            } else {
                logger.info(&"Seed skipped - no seed files or records found");
            }
        }
        None if outcome.is_up_migration() => {
            logger.info(&"No seed was run - no seed options were specified");
        }
        None => {}
    }
}

/// Logs the human readable summary of a run.
///
/// Never panics: a failing logger is reported through [`Logger::warning`] and
/// otherwise ignored.
pub fn log_result_summary(logger: &dyn Logger, outcome: &MigrationOutcome) {
    let logged = catch_unwind(AssertUnwindSafe(|| {
        log_migration_info(logger, outcome);
        log_seed_info(logger, outcome);
    }));

    if let Err(payload) = logged {
        let reason = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("unknown panic");

        let _ = catch_unwind(AssertUnwindSafe(|| {
            logger.warning(&Error::reporting_failed(reason));
            logger.warning(&"Logging failed");
        }));
    }
}
