use crate::driver::{ClientFactory, DatabaseClient, Transaction};
use crate::error::ErrorKind;
use crate::logger::Logger;
use crate::migrate::{MigrationEngine, StepLog};
use crate::platform::{DatabasePlatform, PostgreSQLPlatform};
use crate::{AsyncResult, Error, Result, Row, Value};
use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Info,
    Error,
    Warning,
}

#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
    panic_on_info: bool,
}

impl RecordingLogger {
    /// A logger whose `info` panics, to simulate a broken sink.
    pub fn panicking() -> Self {
        Self {
            lines: Mutex::default(),
            panic_on_info: true,
        }
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    fn of_level(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.of_level(Level::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.of_level(Level::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.of_level(Level::Warning)
    }

    fn push(&self, level: Level, message: &dyn Display) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &dyn Display) {
        if self.panic_on_info {
            panic!("FAKE LOGGER ERROR");
        }

        self.push(Level::Info, message)
    }

    fn error(&self, message: &dyn Display) {
        self.push(Level::Error, message)
    }

    fn warning(&self, message: &dyn Display) {
        self.push(Level::Warning, message)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    Authenticate,
    Query,
    Begin,
    Commit,
    Rollback,
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<Call>,
    queries: Vec<(String, Vec<Value>)>,
}

/// In-memory client recording every interaction.
#[derive(Debug)]
pub struct MockClient {
    state: Mutex<MockState>,
    platform: Arc<dyn DatabasePlatform>,
    fail_query_at: Option<usize>,
    fail_authenticate: bool,
    fail_close: bool,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::default(),
            platform: Arc::new(PostgreSQLPlatform),
            fail_query_at: None,
            fail_authenticate: false,
            fail_close: false,
        }
    }

    /// Makes the query at the given zero-based position fail with "FAKE ERROR".
    pub fn fail_query_at(mut self, index: usize) -> Self {
        self.fail_query_at = Some(index);
        self
    }

    pub fn fail_authenticate(mut self) -> Self {
        self.fail_authenticate = true;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn queries(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().queries.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let index = state.queries.len();
        state.calls.push(Call::Query);
        state.queries.push((sql.to_string(), params.to_vec()));

        if self.fail_query_at == Some(index) {
            Err(Error::new(ErrorKind::UnknownError, "FAKE ERROR"))
        } else {
            Ok(1)
        }
    }
}

impl DatabaseClient for MockClient {
    fn authenticate(&self) -> AsyncResult<'_, ()> {
        self.record(Call::Authenticate);
        let result = if self.fail_authenticate {
            Err(Error::new(ErrorKind::UnknownError, "FAKE AUTH ERROR"))
        } else {
            Ok(())
        };

        Box::pin(async move { result })
    }

    fn close(&self) -> AsyncResult<'_, ()> {
        self.record(Call::Close);
        let result = if self.fail_close {
            Err(Error::new(ErrorKind::UnknownError, "FAKE CLOSE ERROR"))
        } else {
            Ok(())
        };

        Box::pin(async move { result })
    }

    fn platform(&self) -> Arc<dyn DatabasePlatform> {
        self.platform.clone()
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64> {
        Box::pin(async move { self.query(sql, params) })
    }

    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move { self.query(sql, &[]).map(|_| ()) })
    }

    fn fetch_all<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move { self.query(sql, &[]).map(|_| vec![]) })
    }

    fn transaction(&self) -> AsyncResult<'_, Box<dyn Transaction<'_> + '_>> {
        self.record(Call::Begin);
        let transaction: Box<dyn Transaction<'_> + '_> = Box::new(MockTransaction { client: self });
        Box::pin(async move { Ok(transaction) })
    }
}

struct MockTransaction<'conn> {
    client: &'conn MockClient,
}

impl<'conn> Transaction<'conn> for MockTransaction<'conn> {
    fn execute<'a>(&'a mut self, sql: &'a str, params: &'a [Value]) -> AsyncResult<'a, u64> {
        self.client.execute(sql, params)
    }

    fn commit(self: Box<Self>) -> AsyncResult<'conn, ()> {
        self.client.record(Call::Commit);
        Box::pin(async move { Ok(()) })
    }

    fn rollback(self: Box<Self>) -> AsyncResult<'conn, ()> {
        self.client.record(Call::Rollback);
        Box::pin(async move { Ok(()) })
    }
}

#[derive(Debug, Default)]
pub struct MockClientFactory {
    created: AtomicUsize,
}

impl MockClientFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockClientFactory {
    fn create_client(&self) -> Result<Box<dyn DatabaseClient>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockClient::new()))
    }
}

/// Engine recording a fixed list of steps, optionally failing after the last one.
pub struct ScriptedEngine {
    forward: Vec<String>,
    reverse: Vec<String>,
    error: Option<String>,
}

impl ScriptedEngine {
    pub fn new(forward: &[&str], reverse: &[&str]) -> Self {
        Self {
            forward: forward.iter().map(ToString::to_string).collect(),
            reverse: reverse.iter().map(ToString::to_string).collect(),
            error: None,
        }
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    fn run<'a>(
        &'a self,
        names: &'a [String],
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            for name in names {
                steps.record(name);
                client.execute_batch(&format!("-- {}", name)).await?;
            }

            match &self.error {
                Some(message) => Err(Error::migration_step(message.clone())),
                None => Ok(()),
            }
        })
    }
}

impl MigrationEngine for ScriptedEngine {
    fn run_forward<'a>(
        &'a self,
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()> {
        self.run(&self.forward, client, steps)
    }

    fn run_reverse<'a>(
        &'a self,
        client: &'a dyn DatabaseClient,
        steps: &'a mut StepLog,
    ) -> AsyncResult<'a, ()> {
        self.run(&self.reverse, client, steps)
    }
}

pub fn write_seed_file(dir: &TempDir, name: &str, contents: &str) {
    std::fs::write(dir.path().join(name), contents).unwrap();
}

/// Two seed files of ten rows each: `table_a` with `id, col1`, `table_b` with `id, col1, col2`.
pub fn seed_fixtures() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let table_a = (0..10)
        .map(|i| serde_json::json!({ "id": i, "col1": i.to_string() }))
        .collect::<Vec<_>>();
    let table_b = (0..10)
        .map(|i| serde_json::json!({ "id": i, "col1": i.to_string(), "col2": i.to_string() }))
        .collect::<Vec<_>>();

    write_seed_file(&dir, "table_a.json", &serde_json::to_string(&table_a).unwrap());
    write_seed_file(&dir, "table_b.json", &serde_json::to_string(&table_b).unwrap());
    dir
}
