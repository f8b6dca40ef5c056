//! Remote issue-tracker client contract.
//!
//! The engine never opens a network connection itself; a concrete client
//! (REST, fixture, recording proxy) implements [`RemoteClient`] and is
//! handed to the session at construction time.

use crate::error::Result;
use crate::model::Issue;
use std::collections::BTreeMap;

/// One tracker-native search call.
///
/// Implementations should honor [`crate::config::QueryConfig::remote_timeout`]
/// when one is configured; the engine itself does not enforce a deadline.
pub trait RemoteClient: Send + Sync {
    /// Fetch all issues matching the exact-match request map, order
    /// preserved as returned by the tracker.
    ///
    /// # Errors
    ///
    /// - [`crate::QueryError::Authentication`] when credentials are rejected
    /// - [`crate::QueryError::NotFound`] when the project or endpoint is missing
    /// - [`crate::QueryError::Transport`] for network/HTTP failures
    /// - [`crate::QueryError::Search`] for other protocol-level failures
    fn fetch_issues(&self, request: &BTreeMap<String, String>) -> Result<Vec<Issue>>;
}
