//! Query execution and post-filtering engine for Redmine-style issue trackers.
//!
//! The remote search API cannot express every criterion a query carries:
//! free-text search across fields and "one of N values" matching have no
//! native protocol form. This crate translates a declarative parameter set
//! into a remote request, applies the missing semantics as local
//! post-filter passes, reconciles results against a persisted issue store,
//! and notifies listeners of refresh progress.
//!
//! # Architecture
//!
//! - [`param`] - named search criteria with one or more typed values
//! - [`filter`] - remote/local split planning and the post-filter passes
//! - [`session`] - one refresh cycle: fetch, filter, reconcile, notify
//! - [`notify`] - listener registry for query lifecycle events
//! - [`remote`] - the remote tracker client contract
//! - [`store`] - the persisted issue store contract and backends
//!
//! The remote client and the issue store are trait collaborators; this
//! crate never opens a network connection itself.

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod notify;
pub mod param;
pub mod remote;
pub mod session;
pub mod store;
pub mod telemetry;

pub use config::{ErrorPolicy, QueryConfig};
pub use error::{QueryError, Result};
pub use filter::{QueryPlan, SearchContext};
pub use model::{Issue, NamedRef};
pub use notify::{LifecycleEvent, QueryListener};
pub use param::{ParameterValue, SearchParameter};
pub use remote::RemoteClient;
pub use session::{QuerySession, RefreshOutcome};
pub use store::IssueStore;
