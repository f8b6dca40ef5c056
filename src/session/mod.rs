//! Query session: one fetch-filter-reconcile cycle per refresh.
//!
//! A session is bound at construction to one repository connection (the
//! remote client + issue store pair), one project, and one parameter
//! set. Each [`QuerySession::refresh`] snapshots the previously known
//! ids, runs the filter engine, streams every fetched issue through the
//! store and the listener registry, and finishes with the lifecycle
//! events and an analytics record - on every exit path.
//!
//! Refreshes are explicitly serialized: a second `refresh` while one is
//! in flight is rejected with [`QueryError::RefreshInProgress`] rather
//! than left to race.

use crate::config::{ErrorPolicy, QueryConfig};
use crate::error::{QueryError, Result};
use crate::filter::{self, QueryPlan, SearchContext};
use crate::model::Issue;
use crate::notify::{LifecycleEvent, ListenerRegistry, QueryListener};
use crate::param::ParameterMap;
use crate::remote::RemoteClient;
use crate::store::{IssueStore, flags};
use crate::telemetry::{QueryEventSink, TracingEventSink};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, warn};

/// Typed result of one refresh cycle.
///
/// Distinguishes "the query matched nothing" from "the search failed",
/// which the historical swallow-and-log behavior conflated.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Every fetched issue was stored and notified.
    Completed {
        total: usize,
        /// Ids known before this refresh that the query no longer matches.
        stale: Vec<String>,
    },
    /// A store write failed mid-iteration; the issues stored before the
    /// failure stand, the rest of the fetch was dropped.
    Partial {
        stored: usize,
        stale: Vec<String>,
        error: QueryError,
    },
    /// The search itself failed (reported only under
    /// [`ErrorPolicy::FailSoft`]; `FailLoud` returns `Err` instead).
    Failed { error: QueryError },
}

impl RefreshOutcome {
    /// Number of issues in the matched set after this cycle.
    #[must_use]
    pub const fn issue_count(&self) -> usize {
        match self {
            Self::Completed { total, .. } => *total,
            Self::Partial { stored, .. } => *stored,
            Self::Failed { .. } => 0,
        }
    }
}

/// One named query against one repository connection.
pub struct QuerySession {
    name: Mutex<String>,
    context: SearchContext,
    parameters: Mutex<ParameterMap>,
    client: Arc<dyn RemoteClient>,
    store: Arc<dyn IssueStore>,
    sink: Arc<dyn QueryEventSink>,
    config: QueryConfig,
    listeners: ListenerRegistry,
    // Matched-issue ids, replaced wholesale each refresh. Guarded by its
    // own lock, never held across a listener callback.
    known_ids: Mutex<HashSet<String>>,
    saved: AtomicBool,
    first_run: AtomicBool,
    removed: AtomicBool,
    running: AtomicBool,
    last_refresh_ms: AtomicI64,
}

impl QuerySession {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        context: SearchContext,
        parameters: ParameterMap,
        client: Arc<dyn RemoteClient>,
        store: Arc<dyn IssueStore>,
        config: QueryConfig,
    ) -> Self {
        Self {
            name: Mutex::new(name.into()),
            context,
            parameters: Mutex::new(parameters),
            client,
            store,
            sink: Arc::new(TracingEventSink),
            config,
            listeners: ListenerRegistry::new(),
            known_ids: Mutex::new(HashSet::new()),
            saved: AtomicBool::new(false),
            first_run: AtomicBool::new(true),
            removed: AtomicBool::new(false),
            running: AtomicBool::new(false),
            last_refresh_ms: AtomicI64::new(0),
        }
    }

    /// Replace the default tracing analytics sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn QueryEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The query's display name, which doubles as its stored name in
    /// the issue store.
    #[must_use]
    pub fn name(&self) -> String {
        lock(&self.name).clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *lock(&self.name) = name.into();
    }

    /// Replace the search parameters; takes effect on the next refresh.
    pub fn set_parameters(&self, parameters: ParameterMap) {
        *lock(&self.parameters) = parameters;
    }

    pub fn subscribe(&self, listener: Arc<dyn QueryListener>) {
        self.listeners.subscribe(listener);
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn QueryListener>) {
        self.listeners.unsubscribe(listener);
    }

    /// Run one refresh cycle.
    ///
    /// # Errors
    ///
    /// - [`QueryError::SessionRemoved`] after [`Self::remove`]
    /// - [`QueryError::RefreshInProgress`] while another refresh runs
    /// - the search error itself under [`ErrorPolicy::FailLoud`]
    pub fn refresh(&self, automatic: bool) -> Result<RefreshOutcome> {
        let name = self.name();
        if self.removed.load(Ordering::SeqCst) {
            return Err(QueryError::SessionRemoved { name });
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(QueryError::RefreshInProgress { name });
        }

        // The finish phase must run however the cycle leaves the running
        // state, including a panic unwinding out of a listener callback.
        let finish = FinishGuard {
            session: self,
            name: &name,
            automatic,
            count: Cell::new(0),
        };

        debug!(query = %name, "refresh start");
        self.listeners.emit_started();
        let result = self.run_cycle(&name);

        if let Ok(outcome) = &result {
            finish.count.set(outcome.issue_count());
        }
        drop(finish);
        result
    }

    fn run_cycle(&self, name: &str) -> Result<RefreshOutcome> {
        // Snapshot of everything previously known: the live set, and for
        // a saved query whatever the store remembers across restarts.
        let mut previous = {
            let mut ids = lock(&self.known_ids);
            let snapshot = ids.clone();
            ids.clear();
            snapshot
        };
        if self.is_saved() {
            previous.extend(self.store.read_persisted_ids(name));
            previous.extend(self.store.read_archived_ids(name));
        }

        let plan = QueryPlan::build(&lock(&self.parameters).clone(), &self.context);
        let search_result = filter::search(self.client.as_ref(), &plan);

        match search_result {
            Ok(issues) => {
                let mut stored = 0usize;
                let mut write_error = None;
                for issue in issues {
                    let id = issue.cache_id();
                    match self.store.upsert_issue(&id, &issue) {
                        Ok(updated) => {
                            lock(&self.known_ids).insert(id);
                            stored += 1;
                            self.listeners.emit_item(&updated);
                        }
                        Err(e) => {
                            // Abort the rest of the fetch; what is
                            // already committed stands.
                            error!(query = %name, issue = %id, error = %e, "issue store write failed");
                            write_error = Some(e);
                            break;
                        }
                    }
                }

                let current = lock(&self.known_ids).clone();
                if self.is_saved() {
                    if let Err(e) = self.store.write_persisted_ids(name, &current) {
                        warn!(query = %name, error = %e, "failed to persist query ids");
                    }
                }
                self.first_run.store(false, Ordering::SeqCst);

                let mut stale: Vec<String> = previous.difference(&current).cloned().collect();
                stale.sort_unstable();

                Ok(write_error.map_or(
                    RefreshOutcome::Completed {
                        total: stored,
                        stale: stale.clone(),
                    },
                    |error| RefreshOutcome::Partial {
                        stored,
                        stale,
                        error,
                    },
                ))
            }
            Err(e) => match self.config.error_policy {
                ErrorPolicy::FailLoud => Err(e),
                ErrorPolicy::FailSoft => {
                    error!(query = %name, error = %e, "search failed");
                    Ok(RefreshOutcome::Failed { error: e })
                }
            },
        }
    }

    /// Issues in the matched set whose store status bitmask intersects
    /// `mask`. Takes a point-in-time copy of the id set before touching
    /// the store, so a concurrent refresh cannot tear the iteration.
    #[must_use]
    pub fn issues(&self, mask: u32) -> Vec<Issue> {
        let ids: Vec<String> = lock(&self.known_ids).iter().cloned().collect();
        ids.into_iter()
            .filter(|id| self.store.status_flags(id) & mask != 0)
            .filter_map(|id| self.store.lookup_issue(&id))
            .collect()
    }

    /// All matched issues regardless of status.
    #[must_use]
    pub fn all_issues(&self) -> Vec<Issue> {
        self.issues(flags::ALL)
    }

    /// Point-in-time copy of the matched id set.
    #[must_use]
    pub fn known_ids(&self) -> HashSet<String> {
        lock(&self.known_ids).clone()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        lock(&self.known_ids).contains(id)
    }

    /// The store's status bitmask for one issue.
    #[must_use]
    pub fn issue_status(&self, id: &str) -> u32 {
        self.store.status_flags(id)
    }

    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.saved.load(Ordering::SeqCst)
    }

    /// Toggle the saved flag. Fires [`LifecycleEvent::Saved`]; the id
    /// set is persisted on the next refresh, not here.
    pub fn set_saved(&self, saved: bool) {
        self.saved.store(saved, Ordering::SeqCst);
        self.listeners.emit_lifecycle(LifecycleEvent::Saved);
    }

    /// Has any refresh completed an iteration yet?
    #[must_use]
    pub fn was_run(&self) -> bool {
        !self.first_run.load(Ordering::SeqCst)
    }

    /// Timestamp of the last finished refresh cycle, success or failure.
    #[must_use]
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        let ms = self.last_refresh_ms.load(Ordering::SeqCst);
        (ms != 0)
            .then(|| DateTime::from_timestamp_millis(ms))
            .flatten()
    }

    /// Raw epoch-milliseconds form of [`Self::last_refresh`]; 0 = never.
    #[must_use]
    pub fn last_refresh_millis(&self) -> i64 {
        self.last_refresh_ms.load(Ordering::SeqCst)
    }

    /// Detach the session from its owner. Fires
    /// [`LifecycleEvent::Removed`]; further refreshes are rejected.
    /// Persisted state stays in the store until the owner purges it.
    pub fn remove(&self) {
        self.removed.store(true, Ordering::SeqCst);
        self.listeners.emit_lifecycle(LifecycleEvent::Removed);
    }
}

impl std::fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySession")
            .field("name", &self.name())
            .field("project_id", &self.context.project_id)
            .field("saved", &self.is_saved())
            .field("was_run", &self.was_run())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs the leave-Running phase when dropped: `finished` and
/// `issues-changed` events, the refresh timestamp, the analytics record,
/// and the release of the run guard. Being a drop guard, it fires even
/// when a listener callback panics mid-cycle.
struct FinishGuard<'a> {
    session: &'a QuerySession,
    name: &'a str,
    automatic: bool,
    count: Cell<usize>,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let session = self.session;
        let count = self.count.get();
        session.listeners.emit_finished();
        session.listeners.emit_lifecycle(LifecycleEvent::IssuesChanged);
        session
            .last_refresh_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
        session.sink.record_query_event(
            &session.config.connector,
            self.name,
            count,
            !self.automatic,
            self.automatic,
        );
        debug!(query = %self.name, results = count, "refresh finish");
        session.running.store(false, Ordering::SeqCst);
    }
}
