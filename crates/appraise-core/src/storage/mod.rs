use crate::model::EvaluationRecord;

pub mod schema;
pub mod sqlite;
pub mod store;

pub use sqlite::SqliteBackend;
pub use store::Store;

/// Storage medium for the evaluation table.
///
/// Backends are dumb: they report the column set, read every row in
/// insertion order, and replace the whole table on write. `write` must be
/// atomic; a failed write leaves the previous contents in place.
pub trait TableBackend: Send {
    /// Column names of the table, or `None` when it does not exist yet.
    fn columns(&mut self) -> anyhow::Result<Option<Vec<String>>>;
    fn read(&mut self) -> anyhow::Result<Vec<EvaluationRecord>>;
    fn write(&mut self, records: &[EvaluationRecord]) -> anyhow::Result<()>;
    fn describe(&self) -> String;
}
