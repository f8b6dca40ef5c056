//! Listener registry for query lifecycle events.
//!
//! The registry is owned by its session; there is no ambient global
//! listener state. Emission iterates a point-in-time snapshot of the
//! subscriber list, so listeners may subscribe or unsubscribe from
//! inside a callback without deadlocking or invalidating the iteration.

use crate::model::Issue;
use std::sync::{Arc, Mutex};

/// Query-level lifecycle events, distinct from refresh progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The query's saved flag was toggled.
    Saved,
    /// The query was detached from its repository.
    Removed,
    /// The matched-issue set changed (end of every refresh).
    IssuesChanged,
}

/// Observer of one query session.
///
/// All methods default to no-ops so a listener implements only what it
/// cares about. Callbacks run on the refreshing thread and must not
/// block it.
pub trait QueryListener: Send + Sync {
    /// A refresh cycle began.
    fn started(&self) {}

    /// One issue was fetched, stored, and added to the matched set.
    fn item_notified(&self, _issue: &Issue) {}

    /// The refresh cycle ended, successfully or not.
    fn finished(&self) {}

    /// A query-level lifecycle event fired.
    fn lifecycle(&self, _event: LifecycleEvent) {}
}

/// Subscriber list with snapshot-based emission.
#[derive(Default)]
pub struct ListenerRegistry {
    // Guarded separately from any session state so a callback may
    // re-enter the session without lock-order trouble.
    listeners: Mutex<Vec<Arc<dyn QueryListener>>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn QueryListener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.push(listener);
    }

    /// Remove a previously subscribed listener, matched by `Arc` identity.
    pub fn unsubscribe(&self, listener: &Arc<dyn QueryListener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    fn snapshot(&self) -> Vec<Arc<dyn QueryListener>> {
        let listeners = self.listeners.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        listeners.clone()
    }

    pub fn emit_started(&self) {
        for listener in self.snapshot() {
            listener.started();
        }
    }

    pub fn emit_item(&self, issue: &Issue) {
        for listener in self.snapshot() {
            listener.item_notified(issue);
        }
    }

    pub fn emit_finished(&self) {
        for listener in self.snapshot() {
            listener.finished();
        }
    }

    pub fn emit_lifecycle(&self, event: LifecycleEvent) {
        for listener in self.snapshot() {
            listener.lifecycle(event);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .listeners
            .lock()
            .map(|l| l.len())
            .unwrap_or_default();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &count)
            .finish()
    }
}
