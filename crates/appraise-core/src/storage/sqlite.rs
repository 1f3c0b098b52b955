use super::schema::{DDL, TABLE};
use super::TableBackend;
use crate::model::EvaluationRecord;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQLite file holding the evaluation table. Every write replaces the full
/// table inside one transaction.
pub struct SqliteBackend {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }
}

type RawRow = (
    String,
    Option<f64>,
    Option<f64>,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

impl TableBackend for SqliteBackend {
    fn columns(&mut self) -> anyhow::Result<Option<Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1)")?;
        let names = stmt
            .query_map(params![TABLE], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        if names.is_empty() {
            Ok(None)
        } else {
            Ok(Some(names))
        }
    }

    fn read(&mut self) -> anyhow::Result<Vec<EvaluationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT statement, model_score, reviewer_score, justification, award, tier, wing,
                    squadron, reviewer_identity, timestamp
             FROM evaluations ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| -> rusqlite::Result<RawRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .enumerate()
            .map(|(position, raw)| -> anyhow::Result<EvaluationRecord> {
                let timestamp = DateTime::parse_from_rfc3339(&raw.9)
                    .with_context(|| format!("row {}: bad timestamp {:?}", position, raw.9))?
                    .with_timezone(&Utc);
                Ok(EvaluationRecord {
                    position,
                    statement: raw.0,
                    model_score: raw.1,
                    reviewer_score: raw.2,
                    justification: raw.3,
                    award: raw.4,
                    tier: raw.5,
                    wing: raw.6,
                    squadron: raw.7,
                    reviewer_identity: raw.8,
                    timestamp,
                })
            })
            .collect()
    }

    fn write(&mut self, records: &[EvaluationRecord]) -> anyhow::Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(DDL)?;
        tx.execute("DELETE FROM evaluations", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO evaluations (statement, model_score, reviewer_score, justification,
                    award, tier, wing, squadron, reviewer_identity, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.statement,
                    r.model_score,
                    r.reviewer_score,
                    r.justification,
                    r.award,
                    r.tier,
                    r.wing,
                    r.squadron,
                    r.reviewer_identity,
                    r.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}
