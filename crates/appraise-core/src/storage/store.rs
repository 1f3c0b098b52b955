use super::schema::check_columns;
use super::{SqliteBackend, TableBackend};
use crate::errors::{EvalError, Result};
use crate::model::{EvaluationRecord, EvaluationTable, PendingEvaluation};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only evaluation table with an in-memory copy and a durable backend.
///
/// Clones share the same table; `commit_pending` holds the lock across
/// append and persist so concurrent workflows keep append order.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreState>>,
}

struct StoreState {
    backend: Box<dyn TableBackend>,
    table: EvaluationTable,
    unflushed: bool,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let backend = SqliteBackend::open(path)
            .map_err(|e| EvalError::Persistence(format!("{:#}", e)))?;
        Self::with_backend(Box::new(backend))
    }

    pub fn in_memory() -> Result<Self> {
        let backend =
            SqliteBackend::in_memory().map_err(|e| EvalError::Persistence(format!("{:#}", e)))?;
        Self::with_backend(Box::new(backend))
    }

    /// Opens a store on `backend` and loads its table.
    pub fn with_backend(backend: Box<dyn TableBackend>) -> Result<Self> {
        let store = Self {
            inner: Arc::new(Mutex::new(StoreState {
                backend,
                table: EvaluationTable::new(),
                unflushed: false,
            })),
        };
        store.load()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the full table from the backend, replacing the in-memory copy.
    ///
    /// A missing table is created empty. A table with a different column set
    /// fails with `CorruptTable`. Refused with `Persistence` while appended
    /// rows are still unflushed; call [`Store::persist`] first.
    pub fn load(&self) -> Result<EvaluationTable> {
        let mut state = self.lock();
        let location = state.backend.describe();
        if state.unflushed {
            tracing::warn!(event = "load_refused", store = %location, rows = state.table.len());
            return Err(EvalError::Persistence(format!(
                "{}: in-memory table has unflushed rows; persist before reloading",
                location
            )));
        }

        let columns = state
            .backend
            .columns()
            .map_err(|e| EvalError::CorruptTable(format!("{}: {:#}", location, e)))?;

        let table = match columns {
            None => {
                state
                    .backend
                    .write(&[])
                    .map_err(|e| EvalError::Persistence(format!("{}: {:#}", location, e)))?;
                tracing::info!(event = "table_initialized", store = %location);
                EvaluationTable::new()
            }
            Some(cols) => {
                check_columns(&cols)
                    .map_err(|msg| EvalError::CorruptTable(format!("{}: {}", location, msg)))?;
                let records = state
                    .backend
                    .read()
                    .map_err(|e| EvalError::CorruptTable(format!("{}: {:#}", location, e)))?;
                tracing::info!(event = "table_loaded", store = %location, rows = records.len());
                EvaluationTable::from_records(records)
            }
        };

        state.table = table.clone();
        state.unflushed = false;
        Ok(table)
    }

    /// Appends to the in-memory table only.
    pub fn append(&self, pending: &PendingEvaluation) -> EvaluationRecord {
        let mut state = self.lock();
        Self::append_locked(&mut state, pending)
    }

    /// Flushes the in-memory table to the backend. Safe to repeat.
    pub fn persist(&self) -> Result<()> {
        let mut state = self.lock();
        Self::persist_locked(&mut state)
    }

    /// Appends and persists under one lock. On flush failure the row stays
    /// in memory and a later [`Store::persist`] writes it without re-appending.
    pub fn commit_pending(&self, pending: &PendingEvaluation) -> Result<EvaluationRecord> {
        let mut state = self.lock();
        let record = Self::append_locked(&mut state, pending);
        Self::persist_locked(&mut state)?;
        Ok(record)
    }

    fn append_locked(state: &mut StoreState, pending: &PendingEvaluation) -> EvaluationRecord {
        let before = state.table.len();
        let record = state.table.append(pending);
        state.unflushed = true;
        tracing::info!(
            event = "evaluation_appended",
            rows_before = before,
            rows_after = state.table.len(),
            position = record.position
        );
        record
    }

    fn persist_locked(state: &mut StoreState) -> Result<()> {
        let location = state.backend.describe();
        match state.backend.write(state.table.records()) {
            Ok(()) => {
                state.unflushed = false;
                tracing::info!(event = "table_persisted", store = %location, rows = state.table.len());
                Ok(())
            }
            Err(e) => {
                tracing::error!(event = "persist_failed", store = %location, error = %format!("{:#}", e));
                Err(EvalError::Persistence(format!("{}: {:#}", location, e)))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when rows were appended since the last successful flush.
    pub fn has_unflushed(&self) -> bool {
        self.lock().unflushed
    }

    /// Snapshot of the in-memory table.
    pub fn table(&self) -> EvaluationTable {
        self.lock().table.clone()
    }

    pub fn describe(&self) -> String {
        self.lock().backend.describe()
    }
}
