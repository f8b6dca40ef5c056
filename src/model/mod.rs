//! Core data types for `redquery`.
//!
//! This module defines the issue shape as fetched from the remote tracker:
//! - `Issue` - a remote issue record
//! - `NamedRef` - an entity-with-id reference field (tracker, status, ...)
//!
//! The filter engine only reads these fields; it never mutates an issue.
//! Canonical issue records live in the [`crate::store`] and are updated
//! from fetched issues during a refresh.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a named tracker entity (status, priority, user, ...).
///
/// The remote protocol identifies these by numeric id; the display name
/// travels alongside when the tracker supplies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NamedRef {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self { id, name: None }
    }

    #[must_use]
    pub fn named(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} (#{})", self.id),
            None => write!(f, "#{}", self.id),
        }
    }
}

/// An issue as returned by the remote tracker.
///
/// Reference fields are optional: the tracker omits them when the field
/// is unset (no assignee, no category, no target version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u32,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<NamedRef>,
}

impl Issue {
    /// Create a bare issue with only id and subject set.
    #[must_use]
    pub fn new(id: u32, subject: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            description: None,
            tracker: None,
            status: None,
            priority: None,
            assignee: None,
            category: None,
            target_version: None,
        }
    }

    /// The canonical string identifier used as the store key and in the
    /// session's known-id set.
    #[must_use]
    pub fn cache_id(&self) -> String {
        self.id.to_string()
    }

    /// Short display form for progress reporting.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("#{} - {}", self.id, self.subject)
    }
}
