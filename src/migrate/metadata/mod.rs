mod executed_migration;

use crate::driver::DatabaseClient;
use crate::migrate::{Direction, ExecutionResult};
use crate::{AsyncResult, Value};
pub use executed_migration::{ExecutedMigration, ExecutedMigrationList};
use std::sync::atomic::{AtomicBool, Ordering};

/// Persists which steps have already been applied.
pub trait MetadataStorage {
    fn get_executed_migration(&self) -> AsyncResult<'_, ExecutedMigrationList>;
    fn complete(&self, execution_result: ExecutionResult) -> AsyncResult<'_, ()>;
}

/// Stores the applied step names into a tracking table.
pub struct TableMetadataStorage<'conn> {
    client: &'conn dyn DatabaseClient,
    is_initialized: AtomicBool,
    table_name: String,
    name_column_name: String,
    executed_at_column_name: String,
}

impl<'conn> TableMetadataStorage<'conn> {
    pub fn new(client: &'conn dyn DatabaseClient) -> Self {
        Self {
            client,
            is_initialized: AtomicBool::new(false),
            table_name: "migrations".to_string(),
            name_column_name: "name".to_string(),
            executed_at_column_name: "executed_at".to_string(),
        }
    }

    pub fn with_table_name(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    async fn ensure_initialized(&self) -> crate::Result<()> {
        if self.is_initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        let platform = self.client.platform();
        self.client
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR(255) NOT NULL PRIMARY KEY, {} VARCHAR(64))",
                platform.quote_identifier(&self.table_name),
                platform.quote_single_identifier(&self.name_column_name),
                platform.quote_single_identifier(&self.executed_at_column_name),
            ))
            .await?;

        self.is_initialized.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MetadataStorage for TableMetadataStorage<'_> {
    fn get_executed_migration(&self) -> AsyncResult<'_, ExecutedMigrationList> {
        Box::pin(async move {
            self.ensure_initialized().await?;
            let platform = self.client.platform();

            let rows = self
                .client
                .fetch_all(&format!(
                    "SELECT {} FROM {} ORDER BY {}",
                    platform.quote_single_identifier(&self.name_column_name),
                    platform.quote_identifier(&self.table_name),
                    platform.quote_single_identifier(&self.name_column_name),
                ))
                .await?;

            let mut migrations = vec![];
            for row in rows {
                let name = row.get(self.name_column_name.as_str())?.to_string();
                migrations.push(ExecutedMigration { name });
            }

            Ok(ExecutedMigrationList { items: migrations })
        })
    }

    fn complete(&self, execution_result: ExecutionResult) -> AsyncResult<'_, ()> {
        Box::pin(async move {
            self.ensure_initialized().await?;
            let platform = self.client.platform();

            if execution_result.direction == Direction::Up {
                let sql = platform.get_insert_sql(
                    &platform.quote_identifier(&self.table_name),
                    &[
                        self.name_column_name.as_str(),
                        self.executed_at_column_name.as_str(),
                    ],
                );
                self.client
                    .execute(
                        &sql,
                        &[
                            Value::from(execution_result.name),
                            Value::from(execution_result.executed_at.to_rfc3339()),
                        ],
                    )
                    .await?;
            } else {
                let sql = format!(
                    "DELETE FROM {} WHERE {} = {}",
                    platform.quote_identifier(&self.table_name),
                    platform.quote_single_identifier(&self.name_column_name),
                    platform.placeholder(1),
                );
                self.client
                    .execute(&sql, &[Value::from(execution_result.name)])
                    .await?;
            }

            Ok(())
        })
    }
}
