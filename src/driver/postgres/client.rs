use crate::driver::{DatabaseClient, Transaction};
use crate::error::Error;
use crate::platform::{DatabasePlatform, PostgreSQLPlatform};
use crate::sync::Mutex;
use crate::{AsyncResult, Row, Value};
use log::error;
use std::fmt::{Debug, Formatter, Write};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_postgres::types::private::BytesMut;
use tokio_postgres::types::{to_sql_checked, Format, IsNull, ToSql, Type};
use tokio_postgres::{Client, Config, NoTls, SimpleQueryMessage};

#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: String,
    pub password: Option<String>,
    pub db_name: Option<String>,
    pub application_name: Option<String>,
}

impl From<&crate::ConnectionOptions> for ConnectionOptions {
    fn from(options: &crate::ConnectionOptions) -> Self {
        Self {
            host: options.host.clone(),
            port: options.port,
            user: options
                .username
                .clone()
                .unwrap_or_else(|| "postgres".to_string()),
            password: options.password.clone(),
            db_name: options.database_name.clone(),
            application_name: options.application_name.clone(),
        }
    }
}

impl ConnectionOptions {
    fn build_config(&self) -> Config {
        let mut config = Config::new();
        if let Some(host) = self.host.as_deref().filter(|h| !h.is_empty()) {
            config.host(host);
        }

        if let Some(port) = self.port {
            config.port(port);
        }

        config.user(&self.user);
        if let Some(password) = &self.password {
            config.password(password);
        }

        config.dbname(self.db_name.as_deref().unwrap_or("postgres"));
        if let Some(application_name) = self.application_name.as_deref().filter(|n| !n.is_empty())
        {
            config.application_name(application_name);
        }

        config
    }
}

/// Every parameter travels in text format, leaving the conversion to the column type
/// to the server exactly as it happens for quoted literals.
impl ToSql for Value {
    fn to_sql(
        &self,
        _: &Type,
        out: &mut BytesMut,
    ) -> core::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        if self.is_null() {
            return Ok(IsNull::Yes);
        }

        out.write_str(&self.to_string())?;
        Ok(IsNull::No)
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    fn encode_format(&self, _ty: &Type) -> Format {
        Format::Text
    }

    to_sql_checked!();
}

struct Connected {
    client: Client,
    handle: JoinHandle<()>,
}

impl Drop for Connected {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct PostgresClient {
    options: ConnectionOptions,
    connection: Mutex<Option<Connected>>,
    platform: Arc<dyn DatabasePlatform>,
}

impl PostgresClient {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            connection: Mutex::new(None),
            platform: Arc::new(PostgreSQLPlatform),
        }
    }
}

impl Debug for PostgresClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresClient")
            .field("host", &self.options.host)
            .field("port", &self.options.port)
            .field("db_name", &self.options.db_name)
            .finish()
    }
}

macro_rules! with_client {
    ($self:ident, $client:ident => $body:expr) => {{
        let guard = $self.connection.lock().await;
        let $client = &guard.as_ref().ok_or_else(Error::not_connected)?.client;
        $body
    }};
}

impl DatabaseClient for PostgresClient {
    fn authenticate(&self) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            let mut guard = self.connection.lock().await;
            if guard.is_some() {
                return Ok(());
            }

            let (client, connection) = self
                .options
                .build_config()
                .connect(NoTls)
                .await
                .map_err(Error::connection)?;
            let handle = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!(target: "creed::driver", "connection error: {}", e);
                }
            });

            let _ = guard.insert(Connected { client, handle });
            Ok(())
        })
    }

    fn close(&self) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            let connected = self.connection.lock().await.take();
            drop(connected);

            Ok(())
        })
    }

    fn platform(&self) -> Arc<dyn DatabasePlatform> {
        self.platform.clone()
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64> {
        Box::pin(async move {
            let params: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

            with_client!(self, client => Ok(client.execute(sql, &params).await?))
        })
    }

    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move { with_client!(self, client => Ok(client.batch_execute(sql).await?)) })
    }

    fn fetch_all<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move {
            let messages = with_client!(self, client => client.simple_query(sql).await?);

            let mut rows = vec![];
            for message in messages {
                if let SimpleQueryMessage::Row(row) = message {
                    let columns = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect::<Vec<_>>();
                    let values = (0..row.len())
                        .map(|i| row.get(i).map(Value::from).unwrap_or_default())
                        .collect();

                    rows.push(Row::new(columns, values));
                }
            }

            Ok(rows)
        })
    }

    fn transaction(&self) -> AsyncResult<'_, Box<dyn Transaction<'_> + '_>> {
        Box::pin(async move {
            self.execute_batch("BEGIN").await?;
            let transaction: Box<dyn Transaction<'_> + '_> = Box::new(PostgresTransaction { client: self });
            Ok(transaction)
        })
    }
}

struct PostgresTransaction<'conn> {
    client: &'conn PostgresClient,
}

impl<'conn> Transaction<'conn> for PostgresTransaction<'conn> {
    fn execute<'a>(&'a mut self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64> {
        self.client.execute(sql, params)
    }

    fn commit(self: Box<Self>) -> AsyncResult<'conn, ()> {
        self.client.execute_batch("COMMIT")
    }

    fn rollback(self: Box<Self>) -> AsyncResult<'conn, ()> {
        self.client.execute_batch("ROLLBACK")
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionOptions;
    use crate::driver::postgres::PostgresClient;
    use crate::driver::DatabaseClient;
    use crate::error::ErrorKind;

    fn options() -> ConnectionOptions {
        ConnectionOptions::from(
            &crate::ConnectionOptions::try_from("postgres://app@localhost:5432/app").unwrap(),
        )
    }

    #[test]
    fn converts_generic_options() {
        let options = options();
        assert_eq!(options.user, "app");
        assert_eq!(options.host.as_deref(), Some("localhost"));
        assert_eq!(options.db_name.as_deref(), Some("app"));
    }

    #[tokio::test]
    async fn requires_a_connection() {
        let client = PostgresClient::new(options());
        let error = client.execute("SELECT 1", &[]).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let client = PostgresClient::new(options());
        assert!(client.close().await.is_ok());
        assert!(client.close().await.is_ok());
    }

    #[cfg(feature = "functional-tests")]
    #[tokio::test]
    async fn can_connect() {
        let options = crate::ConnectionOptions::try_from(
            std::env::var("DATABASE_DSN").unwrap().as_str(),
        )
        .unwrap();
        let client = PostgresClient::new(ConnectionOptions::from(&options));
        client.authenticate().await.expect("Must be connected");

        let rows = client.fetch_all("SELECT 1 + 1").await.unwrap();
        assert_eq!(rows[0].get(0).unwrap(), &crate::Value::from("2"));

        client.close().await.unwrap();
    }
}
