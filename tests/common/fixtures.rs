//! Shared test fixtures: issue builder, scripted remote client,
//! failure-injecting store, recording listener.

use redquery::error::{QueryError, Result};
use redquery::model::{Issue, NamedRef};
use redquery::notify::{LifecycleEvent, QueryListener};
use redquery::remote::RemoteClient;
use redquery::store::{IssueStore, MemoryStore};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fluent builder for remote issue fixtures.
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(id: u32, subject: &str) -> Self {
        Self {
            issue: Issue::new(id, subject),
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.issue.description = Some(text.to_string());
        self
    }

    pub fn status(mut self, id: u32) -> Self {
        self.issue.status = Some(NamedRef::new(id));
        self
    }

    pub fn priority(mut self, id: u32) -> Self {
        self.issue.priority = Some(NamedRef::new(id));
        self
    }

    pub fn assignee(mut self, id: u32) -> Self {
        self.issue.assignee = Some(NamedRef::new(id));
        self
    }

    pub fn tracker(mut self, id: u32) -> Self {
        self.issue.tracker = Some(NamedRef::new(id));
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}

/// Remote client returning a fixed response and recording every request
/// map it receives.
pub struct ScriptedClient {
    response: Mutex<Result<Vec<Issue>>>,
    requests: Mutex<Vec<BTreeMap<String, String>>>,
}

impl ScriptedClient {
    pub fn returning(issues: Vec<Issue>) -> Self {
        Self {
            response: Mutex::new(Ok(issues)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: QueryError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_response(&self, issues: Vec<Issue>) {
        *self.response.lock().unwrap() = Ok(issues);
    }

    pub fn requests(&self) -> Vec<BTreeMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> BTreeMap<String, String> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl RemoteClient for ScriptedClient {
    fn fetch_issues(&self, request: &BTreeMap<String, String>) -> Result<Vec<Issue>> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self.response.lock().unwrap();
        match &*response {
            Ok(issues) => Ok(issues.clone()),
            // Rebuild the scripted error so remote variants survive.
            Err(QueryError::Transport { message }) => Err(QueryError::transport(message.clone())),
            Err(QueryError::Authentication { message }) => {
                Err(QueryError::authentication(message.clone()))
            }
            Err(QueryError::NotFound { message }) => Err(QueryError::not_found(message.clone())),
            Err(e) => Err(QueryError::search(e.to_string())),
        }
    }
}

/// Store wrapper that fails the Nth upsert (1-based) with an I/O error,
/// and counts calls to `write_persisted_ids`.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_on_upsert: Option<usize>,
    upserts: AtomicUsize,
    persist_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn reliable() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on_upsert: None,
            upserts: AtomicUsize::new(0),
            persist_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(nth: usize) -> Self {
        Self {
            fail_on_upsert: Some(nth),
            ..Self::reliable()
        }
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }
}

impl IssueStore for FlakyStore {
    fn read_persisted_ids(&self, query_name: &str) -> HashSet<String> {
        self.inner.read_persisted_ids(query_name)
    }

    fn read_archived_ids(&self, query_name: &str) -> HashSet<String> {
        self.inner.read_archived_ids(query_name)
    }

    fn write_persisted_ids(&self, query_name: &str, ids: &HashSet<String>) -> Result<()> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.write_persisted_ids(query_name, ids)
    }

    fn upsert_issue(&self, id: &str, issue: &Issue) -> Result<Issue> {
        let n = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_upsert == Some(n) {
            return Err(QueryError::Persistence {
                id: id.to_string(),
                source: std::io::Error::other("injected write failure"),
            });
        }
        self.inner.upsert_issue(id, issue)
    }

    fn status_flags(&self, id: &str) -> u32 {
        self.inner.status_flags(id)
    }

    fn lookup_issue(&self, id: &str) -> Option<Issue> {
        self.inner.lookup_issue(id)
    }
}

/// Listener recording the ordered event stream it observes.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl QueryListener for RecordingListener {
    fn started(&self) {
        self.push("started");
    }

    fn item_notified(&self, issue: &Issue) {
        self.push(format!("item:{}", issue.id));
    }

    fn finished(&self) {
        self.push("finished");
    }

    fn lifecycle(&self, event: LifecycleEvent) {
        self.push(match event {
            LifecycleEvent::Saved => "saved",
            LifecycleEvent::Removed => "removed",
            LifecycleEvent::IssuesChanged => "issues-changed",
        });
    }
}
