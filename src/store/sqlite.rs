//! `SQLite` issue store implementation.

use super::schema::apply_schema;
use super::{IssueStore, flags};
use crate::error::{QueryError, Result};
use crate::model::Issue;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::warn;

/// SQLite-backed [`IssueStore`], one database file per repository.
///
/// The connection is serialized behind a mutex; refresh traffic is a
/// single writer with occasional readers, so contention is not a concern.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or
    /// schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(5000))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if schema application fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record archived ids for a query, replacing any previous set.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    pub fn record_archived_ids(&self, query_name: &str, ids: &HashSet<String>) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM query_ids WHERE query_name = ?1 AND archived = 1",
            params![query_name],
        )?;
        for id in ids {
            tx.execute(
                "INSERT OR IGNORE INTO query_ids (query_name, issue_id, archived) VALUES (?1, ?2, 1)",
                params![query_name, id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_ids(&self, query_name: &str, archived: bool) -> Result<HashSet<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT issue_id FROM query_ids WHERE query_name = ?1 AND archived = ?2",
        )?;
        let rows = stmt.query_map(params![query_name, i32::from(archived)], |row| {
            row.get::<_, String>(0)
        })?;
        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    fn persistence_error(id: &str, source: impl std::error::Error + Send + Sync + 'static) -> QueryError {
        QueryError::Persistence {
            id: id.to_string(),
            source: std::io::Error::other(source),
        }
    }
}

impl IssueStore for SqliteStore {
    fn read_persisted_ids(&self, query_name: &str) -> HashSet<String> {
        self.read_ids(query_name, false).unwrap_or_else(|e| {
            warn!(query = query_name, error = %e, "failed to read persisted ids");
            HashSet::new()
        })
    }

    fn read_archived_ids(&self, query_name: &str) -> HashSet<String> {
        self.read_ids(query_name, true).unwrap_or_else(|e| {
            warn!(query = query_name, error = %e, "failed to read archived ids");
            HashSet::new()
        })
    }

    fn write_persisted_ids(&self, query_name: &str, ids: &HashSet<String>) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM query_ids WHERE query_name = ?1 AND archived = 0",
            params![query_name],
        )?;
        for id in ids {
            tx.execute(
                "INSERT OR IGNORE INTO query_ids (query_name, issue_id, archived) VALUES (?1, ?2, 0)",
                params![query_name, id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_issue(&self, id: &str, issue: &Issue) -> Result<Issue> {
        let record =
            serde_json::to_string(issue).map_err(|e| Self::persistence_error(id, e))?;
        let conn = self.lock();
        let existing: Option<String> = conn
            .query_row(
                "SELECT record FROM issues WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Self::persistence_error(id, e))?;
        let status = match existing {
            None => flags::NEW,
            Some(old) if old != record => flags::MODIFIED,
            Some(_) => flags::SEEN,
        };
        conn.execute(
            "INSERT INTO issues (id, record, status_flags, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET record = ?2, status_flags = ?3, updated_at = ?4",
            params![id, record, status, Utc::now().to_rfc3339()],
        )
        .map_err(|e| Self::persistence_error(id, e))?;
        Ok(issue.clone())
    }

    fn status_flags(&self, id: &str) -> u32 {
        let conn = self.lock();
        conn.query_row(
            "SELECT status_flags FROM issues WHERE id = ?1",
            params![id],
            |row| row.get::<_, u32>(0),
        )
        .optional()
        .ok()
        .flatten()
        .unwrap_or(flags::SEEN)
    }

    fn lookup_issue(&self, id: &str) -> Option<Issue> {
        let conn = self.lock();
        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM issues WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten();
        record.and_then(|r| {
            serde_json::from_str(&r)
                .map_err(|e| warn!(id, error = %e, "corrupt issue record"))
                .ok()
        })
    }
}
