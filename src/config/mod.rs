//! Configuration for `redquery` sessions.
//!
//! Configuration sources and precedence (highest wins):
//! 1. Values set programmatically by the host
//! 2. Environment variables (`REDQUERY_TIMEOUT_MS`, `REDQUERY_ERROR_POLICY`)
//! 3. Defaults

use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Connector name used in analytics events when the host sets none.
const DEFAULT_CONNECTOR: &str = "redmine";

/// What a session does with a generic search failure during refresh.
///
/// The historical behavior is to log the error and report the refresh
/// as finished with zero issues; `FailLoud` surfaces it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the search error and report a `Failed` outcome.
    #[default]
    FailSoft,
    /// Return the search error to the refresh caller.
    FailLoud,
}

impl FromStr for ErrorPolicy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail_soft" | "soft" => Ok(Self::FailSoft),
            "fail_loud" | "loud" => Ok(Self::FailLoud),
            other => Err(QueryError::Config(format!(
                "unknown error policy '{other}' (use fail_soft or fail_loud)"
            ))),
        }
    }
}

/// Per-session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Connector name reported to the analytics sink.
    pub connector: String,
    /// Deadline for one remote fetch. The engine hands this to the
    /// remote client; it does not enforce it itself.
    #[serde(default)]
    pub remote_timeout: Option<Duration>,
    /// Search-failure policy during refresh.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            connector: DEFAULT_CONNECTOR.to_string(),
            remote_timeout: None,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl QueryConfig {
    /// Defaults overlaid with any environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when an override is present but unparseable.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(ms) = env::var("REDQUERY_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| QueryError::Config(format!("invalid REDQUERY_TIMEOUT_MS '{ms}'")))?;
            config.remote_timeout = Some(Duration::from_millis(ms));
        }
        if let Ok(policy) = env::var("REDQUERY_ERROR_POLICY") {
            config.error_policy = policy.parse()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.connector, "redmine");
        assert_eq!(config.error_policy, ErrorPolicy::FailSoft);
        assert!(config.remote_timeout.is_none());
    }

    #[test]
    fn test_error_policy_parsing() {
        assert_eq!("fail_loud".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::FailLoud);
        assert_eq!("SOFT".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::FailSoft);
        assert!("whatever".parse::<ErrorPolicy>().is_err());
    }
}
