use std::backtrace::Backtrace;
use std::fmt::{Debug, Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    ConnectionError = 1,
    MigrationStepError = 2,
    SeedFileError = 3,
    ReportingError = 4,
    MissingCollaborator = 5,
    NotConnected = 6,
    UnknownDriver = 7,
    InvalidMigration = 8,

    UnknownError = -1,
}

pub struct Error {
    kind: ErrorKind,
    inner: Box<dyn std::error::Error + Send + Sync>,
    backtrace: Backtrace,
}

pub struct StdError(Error);

impl Display for StdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0.to_string(), f)
    }
}

impl Debug for StdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0.to_string(), f)
    }
}

impl std::error::Error for StdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.inner.as_ref())
    }
}

impl From<Error> for StdError {
    fn from(e: Error) -> Self {
        StdError(e)
    }
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            inner: error.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Re-tags the error, keeping the original message and backtrace.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn connection<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::ConnectionError, error)
    }

    pub fn migration_step<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::MigrationStepError, error)
    }

    pub fn seed_file<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::SeedFileError, error)
    }

    pub fn missing_collaborator(name: &str) -> Self {
        Self::new(
            ErrorKind::MissingCollaborator,
            format!("\"{}\" is required", name),
        )
    }

    pub fn not_connected() -> Self {
        Self::new(ErrorKind::NotConnected, "Client is not connected")
    }

    pub fn unknown_driver(scheme: &str) -> Self {
        Self::new(
            ErrorKind::UnknownDriver,
            format!("Unknown database driver \"{}\"", scheme),
        )
    }

    pub fn invalid_migration(name: &str, reason: &str) -> Self {
        Self::new(
            ErrorKind::InvalidMigration,
            format!("Invalid migration \"{}\": {}", name, reason),
        )
    }

    pub fn reporting_failed(reason: &str) -> Self {
        Self::new(
            ErrorKind::ReportingError,
            format!("Result summary could not be logged: {}", reason),
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}: {}\nBacktrace:\n{}",
            self.kind, self.inner, self.backtrace
        )
    }
}

impl<T> From<T> for Error
where
    T: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn from(err: T) -> Self {
        crate::error::Error::new(ErrorKind::UnknownError, err)
    }
}
