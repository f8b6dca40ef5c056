//! In-process issue store.

use super::{IssueStore, flags};
use crate::error::Result;
use crate::model::Issue;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
struct Inner {
    issues: HashMap<String, (Issue, u32)>,
    persisted: HashMap<String, HashSet<String>>,
    archived: HashMap<String, HashSet<String>>,
}

/// HashMap-backed [`IssueStore`]. Nothing survives the process; useful
/// for tests and for unsaved throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record archived ids for a query, as the owning repository does
    /// when it retires issues a query no longer matches.
    pub fn record_archived_ids(&self, query_name: &str, ids: HashSet<String>) {
        let mut inner = self.lock();
        inner.archived.insert(query_name.to_string(), ids);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IssueStore for MemoryStore {
    fn read_persisted_ids(&self, query_name: &str) -> HashSet<String> {
        self.lock().persisted.get(query_name).cloned().unwrap_or_default()
    }

    fn read_archived_ids(&self, query_name: &str) -> HashSet<String> {
        self.lock().archived.get(query_name).cloned().unwrap_or_default()
    }

    fn write_persisted_ids(&self, query_name: &str, ids: &HashSet<String>) -> Result<()> {
        let mut inner = self.lock();
        inner.persisted.insert(query_name.to_string(), ids.clone());
        Ok(())
    }

    fn upsert_issue(&self, id: &str, issue: &Issue) -> Result<Issue> {
        let mut inner = self.lock();
        let status = match inner.issues.get(id) {
            None => flags::NEW,
            Some((existing, _)) if existing != issue => flags::MODIFIED,
            Some(_) => flags::SEEN,
        };
        inner
            .issues
            .insert(id.to_string(), (issue.clone(), status));
        Ok(issue.clone())
    }

    fn status_flags(&self, id: &str) -> u32 {
        self.lock()
            .issues
            .get(id)
            .map_or(flags::SEEN, |(_, status)| *status)
    }

    fn lookup_issue(&self, id: &str) -> Option<Issue> {
        self.lock().issues.get(id).map(|(issue, _)| issue.clone())
    }
}
