//! Transactional seeding of tables from a directory of JSON files.
//!
//! Every `<table>.json` file holds an array of row objects. The target table is
//! truncated and each row is inserted with its own parameterized statement, all in
//! a single transaction spanning the whole directory.

use crate::driver::{DatabaseClient, Transaction};
use crate::error::{Error, ErrorKind};
use crate::logger::Logger;
use crate::outcome::{SeedFailure, SeedOutcome, SeedResult};
use crate::platform::DatabasePlatform;
use crate::{Result, Value};
use log::{debug, warn};
use serde_json::Map;
use std::path::Path;

const SEED_FILE_EXTENSION: &str = ".json";

type SeedRow = Map<String, serde_json::Value>;

/// Lists the seed files of `base_path`, sorted by file name.
pub async fn list_seed_files(base_path: &Path) -> Result<Vec<String>> {
    let mut files = vec![];
    let mut entries = tokio::fs::read_dir(base_path)
        .await
        .map_err(Error::seed_file)?;
    while let Some(entry) = entries.next_entry().await.map_err(Error::seed_file)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(SEED_FILE_EXTENSION) {
            files.push(name);
        }
    }

    files.sort();
    Ok(files)
}

/// Seeds the database from the JSON files found in `base_path`.
///
/// No transaction is opened when the directory holds no seed file. On failure the
/// transaction is rolled back and the progress made so far is returned in the
/// [`SeedFailure`].
pub async fn seed_from_json<P: AsRef<Path>>(
    base_path: P,
    client: &dyn DatabaseClient,
    logger: &dyn Logger,
) -> SeedResult {
    let base_path = base_path.as_ref();
    let files = list_seed_files(base_path).await?;
    if files.is_empty() {
        return Ok(SeedOutcome::default());
    }

    let platform = client.platform();
    let mut transaction = client
        .transaction()
        .await
        .map_err(|e| e.with_kind(ErrorKind::SeedFileError))?;
    let mut outcome = SeedOutcome::default();

    let result = seed_files(
        base_path,
        &files,
        platform.as_ref(),
        transaction.as_mut(),
        logger,
        &mut outcome,
    )
    .await;

    let result = match result {
        Ok(()) => transaction.commit().await,
        Err(error) => {
            if let Err(e) = transaction.rollback().await {
                warn!(target: "creed::seed", "Rollback failed: {}", e);
            }

            Err(error)
        }
    };

    match result {
        Ok(()) => {
            debug!(target: "creed::seed", "Seeded {} rows from {} files", outcome.created_records, outcome.executed_files.len());
            Ok(outcome)
        }
        Err(error) => Err(SeedFailure {
            executed_files: outcome.executed_files,
            created_records: outcome.created_records,
            error: error.with_kind(ErrorKind::SeedFileError),
        }),
    }
}

async fn seed_files(
    base_path: &Path,
    files: &[String],
    platform: &dyn DatabasePlatform,
    transaction: &mut (dyn Transaction<'_> + '_),
    logger: &dyn Logger,
    outcome: &mut SeedOutcome,
) -> Result<()> {
    for file in files {
        outcome.executed_files.push(file.clone());

        let contents = tokio::fs::read_to_string(base_path.join(file)).await?;
        let rows: Vec<SeedRow> = serde_json::from_str(&contents)?;
        if rows.is_empty() {
            continue;
        }

        let table_name = file.strip_suffix(SEED_FILE_EXTENSION).unwrap_or(file);
        let table_name = platform.quote_single_identifier(table_name);
        transaction
            .execute(&platform.get_truncate_table_sql(&table_name), &[])
            .await?;

        logger.info(&format!("Seed starting for file \"{}\"", file));
        for row in rows {
            let columns = row.keys().map(String::as_str).collect::<Vec<_>>();
            let sql = platform.get_insert_sql(&table_name, &columns);
            let values = row
                .values()
                .cloned()
                .map(Value::from_seed_json)
                .collect::<Vec<_>>();

            transaction.execute(&sql, &values).await?;
            outcome.created_records += 1;
        }
    }

    Ok(())
}
