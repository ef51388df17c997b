use crate::platform::DatabasePlatform;
use crate::{AsyncResult, ConnectionOptions, Error, Result, Row, Value};
use std::fmt::Debug;
use std::sync::Arc;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// A database connection the runner and the seeder operate on.
///
/// Implementations own exactly one physical connection which is opened by
/// [`DatabaseClient::authenticate`] and released by [`DatabaseClient::close`].
pub trait DatabaseClient: Debug + Send + Sync {
    /// Opens the connection and verifies the credentials.
    fn authenticate(&self) -> AsyncResult<'_, ()>;

    /// Releases the connection.
    /// Must be idempotent and callable after a failed `authenticate`.
    fn close(&self) -> AsyncResult<'_, ()>;

    fn platform(&self) -> Arc<dyn DatabasePlatform>;

    /// Executes a statement with positional parameters, returning the affected row count.
    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64>;

    /// Executes a batch of statements separated by semicolons, without parameters.
    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()>;

    /// Executes a query without parameters and collects every returned row.
    fn fetch_all<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<Row>>;

    /// Starts a new transaction on this connection.
    fn transaction(&self) -> AsyncResult<'_, Box<dyn Transaction<'_> + '_>>;
}

/// An open transaction borrowing the client it has been started on.
/// Dropping it without committing leaves the rollback to the database.
pub trait Transaction<'conn>: Send {
    fn execute<'a>(&'a mut self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64>;
    fn commit(self: Box<Self>) -> AsyncResult<'conn, ()>;
    fn rollback(self: Box<Self>) -> AsyncResult<'conn, ()>;
}

/// Builds new, not yet connected, clients.
pub trait ClientFactory: Debug + Send + Sync {
    fn create_client(&self) -> Result<Box<dyn DatabaseClient>>;
}

/// [`ClientFactory`] choosing the driver from the scheme of the connection options.
#[derive(Debug, Clone)]
pub struct DsnClientFactory {
    connection_options: ConnectionOptions,
}

impl DsnClientFactory {
    pub fn new(connection_options: ConnectionOptions) -> Self {
        Self { connection_options }
    }

    pub fn create_from_dsn(dsn: &str) -> Result<Self> {
        Ok(Self::new(ConnectionOptions::try_from(dsn)?))
    }

    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.connection_options
    }
}

impl ClientFactory for DsnClientFactory {
    fn create_client(&self) -> Result<Box<dyn DatabaseClient>> {
        let scheme = self.connection_options.scheme.as_deref().unwrap_or_default();
        match scheme {
            #[cfg(feature = "postgres")]
            "psql" => Ok(Box::new(postgres::PostgresClient::new(
                postgres::ConnectionOptions::from(&self.connection_options),
            ))),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(Box::new(sqlite::SqliteClient::new(
                sqlite::ConnectionOptions::from(&self.connection_options),
            ))),
            proto => Err(Error::unknown_driver(proto)),
        }
    }
}
