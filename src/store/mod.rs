//! Persisted issue store contract and backends.
//!
//! The store holds the canonical issue records a refresh reconciles
//! against, plus the per-query id sets that make a saved query survive
//! process restarts. Two backends ship with the crate:
//!
//! - [`MemoryStore`] - in-process, for tests and throwaway sessions
//! - [`SqliteStore`] - durable, one database file per repository

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::Issue;
use std::collections::HashSet;

/// Per-issue status bitmask values, AND-matched by
/// [`crate::session::QuerySession::issues`].
pub mod flags {
    /// Issue was seen before and is unchanged since.
    pub const SEEN: u32 = 1 << 0;
    /// Issue appeared for the first time in the latest refresh.
    pub const NEW: u32 = 1 << 1;
    /// Issue changed since it was last seen.
    pub const MODIFIED: u32 = 1 << 2;
    /// Issue no longer matches the query but is still recorded.
    pub const OBSOLETE: u32 = 1 << 3;
    /// Matches any status.
    pub const ALL: u32 = !0;
}

/// External key-value issue store collaborator.
///
/// Read methods are infallible by contract: a backend that cannot read
/// returns empty sets and logs, since a missing persisted id set is
/// indistinguishable from a never-saved query.
pub trait IssueStore: Send + Sync {
    /// Ids persisted for a saved query under its stored name.
    fn read_persisted_ids(&self, query_name: &str) -> HashSet<String>;

    /// Ids recorded as archived (matched by some earlier run, since
    /// dropped) for a saved query.
    fn read_archived_ids(&self, query_name: &str) -> HashSet<String>;

    /// Replace the persisted id set for a saved query.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot write; the caller
    /// decides whether that aborts anything.
    fn write_persisted_ids(&self, query_name: &str, ids: &HashSet<String>) -> Result<()>;

    /// Create or update the canonical record for a fetched issue and
    /// return the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::Persistence`] when the write fails.
    fn upsert_issue(&self, id: &str, issue: &Issue) -> Result<Issue>;

    /// The status bitmask for an issue; [`flags::SEEN`] for unknown ids.
    fn status_flags(&self, id: &str) -> u32;

    /// Look up the canonical record for an id.
    fn lookup_issue(&self, id: &str) -> Option<Issue>;
}
