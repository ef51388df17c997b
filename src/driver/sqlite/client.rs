use crate::driver::{DatabaseClient, Transaction};
use crate::error::Error;
use crate::platform::{DatabasePlatform, SqlitePlatform};
use crate::sync::Mutex;
use crate::{AsyncResult, Result, Row, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    path: Option<String>,
    memory: bool,
}

impl ConnectionOptions {
    pub fn new_with_path<T: Into<String>>(path: T) -> Self {
        ConnectionOptions {
            path: Some(path.into()),
            memory: false,
        }
    }

    pub fn new_from_memory() -> Self {
        ConnectionOptions {
            path: None,
            memory: true,
        }
    }
}

impl From<&crate::ConnectionOptions> for ConnectionOptions {
    fn from(options: &crate::ConnectionOptions) -> Self {
        match options.file_path.as_deref() {
            Some(path) if !path.is_empty() && path != ":memory:" => Self::new_with_path(path),
            _ => Self::new_from_memory(),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::NULL => ToSqlOutput::from(rusqlite::types::Null),
            Value::Int(value) => ToSqlOutput::from(*value),
            Value::UInt(value) => match i64::try_from(*value) {
                Ok(value) => ToSqlOutput::from(value),
                Err(_) => ToSqlOutput::from(value.to_string()),
            },
            Value::Float(value) => ToSqlOutput::from(*value),
            Value::String(value) => ToSqlOutput::from(value.as_str()),
            Value::Json(value) => ToSqlOutput::from(value.to_string()),
        })
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::NULL,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

/// SQLite client. Statements run synchronously on the owned connection.
pub struct SqliteClient {
    options: ConnectionOptions,
    connection: Mutex<Option<rusqlite::Connection>>,
    platform: Arc<dyn DatabasePlatform>,
}

impl SqliteClient {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            connection: Mutex::new(None),
            platform: Arc::new(SqlitePlatform),
        }
    }

    fn open(&self) -> Result<rusqlite::Connection> {
        let connection = if self.options.memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(self.options.path.as_deref().unwrap_or_default())
        };

        connection.map_err(Error::connection)
    }
}

impl Debug for SqliteClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteClient")
            .field("options", &self.options)
            .finish()
    }
}

impl DatabaseClient for SqliteClient {
    fn authenticate(&self) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            let mut guard = self.connection.lock().await;
            if guard.is_none() {
                let _ = guard.insert(self.open()?);
            }

            Ok(())
        })
    }

    fn close(&self) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            if let Some(connection) = self.connection.lock().await.take() {
                connection.close().map_err(|(_, e)| e)?;
            }

            Ok(())
        })
    }

    fn platform(&self) -> Arc<dyn DatabasePlatform> {
        self.platform.clone()
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64> {
        Box::pin(async move {
            let guard = self.connection.lock().await;
            let connection = guard.as_ref().ok_or_else(Error::not_connected)?;
            let affected = connection.execute(sql, rusqlite::params_from_iter(params.iter()))?;

            Ok(affected as u64)
        })
    }

    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            let guard = self.connection.lock().await;
            let connection = guard.as_ref().ok_or_else(Error::not_connected)?;
            connection.execute_batch(sql)?;

            Ok(())
        })
    }

    fn fetch_all<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move {
            let guard = self.connection.lock().await;
            let connection = guard.as_ref().ok_or_else(Error::not_connected)?;

            let mut statement = connection.prepare(sql)?;
            let columns = statement
                .column_names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>();
            let column_count = columns.len();

            let mut result = vec![];
            let mut rows = statement.query([])?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(value_from_ref(row.get_ref(i)?));
                }

                result.push(Row::new(columns.clone(), values));
            }

            Ok(result)
        })
    }

    fn transaction(&self) -> AsyncResult<'_, Box<dyn Transaction<'_> + '_>> {
        Box::pin(async move {
            self.execute_batch("BEGIN").await?;
            let transaction: Box<dyn Transaction<'_> + '_> = Box::new(SqliteTransaction { client: self });
            Ok(transaction)
        })
    }
}

struct SqliteTransaction<'conn> {
    client: &'conn SqliteClient,
}

impl<'conn> Transaction<'conn> for SqliteTransaction<'conn> {
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
    use super::{ConnectionOptions, SqliteClient};
    use crate::driver::DatabaseClient;
    use crate::error::ErrorKind;
    use crate::Value;

    #[tokio::test]
    async fn requires_authentication() {
        let client = SqliteClient::new(ConnectionOptions::new_from_memory());
        let error = client.execute_batch("SELECT 1").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn executes_statements_and_fetches_rows() {
        let client = SqliteClient::new(ConnectionOptions::new_from_memory());
        client.authenticate().await.unwrap();

        client
            .execute_batch(r#"CREATE TABLE "items" ("id" INTEGER, "name" TEXT, "meta" TEXT)"#)
            .await
            .unwrap();
        let affected = client
            .execute(
                r#"INSERT INTO "items" ("id", "name", "meta") VALUES (?1, ?2, ?3)"#,
                &[
                    Value::Int(1),
                    Value::from("first"),
                    Value::Json(serde_json::json!({"a": 1})),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = client
            .fetch_all(r#"SELECT "id", "name", "meta" FROM "items""#)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap(), &Value::Int(1));
        assert_eq!(rows[0].get("name").unwrap(), &Value::from("first"));
        assert_eq!(rows[0].get("meta").unwrap(), &Value::from(r#"{"a":1}"#));

        client.close().await.unwrap();
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn rolls_back_transactions() {
        let client = SqliteClient::new(ConnectionOptions::new_from_memory());
        client.authenticate().await.unwrap();
        client
            .execute_batch(r#"CREATE TABLE "items" ("id" INTEGER)"#)
            .await
            .unwrap();

        let mut transaction = client.transaction().await.unwrap();
        transaction
            .execute(r#"INSERT INTO "items" ("id") VALUES (?1)"#, &[Value::Int(1)])
            .await
            .unwrap();
        transaction.rollback().await.unwrap();

        let rows = client
            .fetch_all(r#"SELECT "id" FROM "items""#)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
