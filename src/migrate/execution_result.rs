use crate::migrate::Direction;

/// Bookkeeping of a single executed step, handed to the metadata storage.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub name: String,
    pub direction: Direction,
    pub executed_at: chrono::DateTime<chrono::Utc>,
    pub execution_time: i64,
}
