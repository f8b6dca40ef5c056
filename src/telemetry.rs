//! Query analytics sink.
//!
//! Every refresh records one event with the resulting issue count and
//! whether the refresh was automatic. Hosts that aggregate usage metrics
//! implement [`QueryEventSink`]; everyone else gets the tracing-backed
//! default.

use tracing::info;

/// Receiver for per-refresh analytics events.
pub trait QueryEventSink: Send + Sync {
    fn record_query_event(
        &self,
        connector: &str,
        query_name: &str,
        result_count: usize,
        is_manual: bool,
        is_automatic: bool,
    );
}

/// Default sink: structured log line per refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl QueryEventSink for TracingEventSink {
    fn record_query_event(
        &self,
        connector: &str,
        query_name: &str,
        result_count: usize,
        is_manual: bool,
        is_automatic: bool,
    ) {
        info!(
            connector,
            query = query_name,
            results = result_count,
            manual = is_manual,
            automatic = is_automatic,
            "query refresh"
        );
    }
}
