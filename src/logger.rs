use log::{error, info, warn};
use std::fmt::Display;

/// Sink for the human readable lines produced while migrating and seeding.
pub trait Logger: Send + Sync {
    fn info(&self, message: &dyn Display);
    fn error(&self, message: &dyn Display);
    fn warning(&self, message: &dyn Display);
}

/// [`Logger`] forwarding every line to the `log` facade.
#[derive(Clone, Debug)]
pub struct LogLogger {
    target: String,
}

impl LogLogger {
    pub fn new() -> Self {
        Self {
            target: "creed::migrate".to_string(),
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogLogger {
    fn default() -> Self {
        LogLogger::new()
    }
}

impl Logger for LogLogger {
    fn info(&self, message: &dyn Display) {
        info!(target: self.target.as_str(), "{}", message);
    }

    fn error(&self, message: &dyn Display) {
        error!(target: self.target.as_str(), "{}", message);
    }

    fn warning(&self, message: &dyn Display) {
        warn!(target: self.target.as_str(), "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::{LogLogger, Logger};

    #[test]
    fn forwards_to_log_facade() {
        let _ = env_logger::builder().is_test(true).try_init();

        let logger = LogLogger::default().with_target("creed::test");
        assert_eq!(logger.target(), "creed::test");

        logger.info(&"info line");
        logger.error(&"error line");
        logger.warning(&"warning line");
    }
}
