//! Error types and handling for `redquery`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for collaborator implementations
//! - Remote failures keep distinct variants so a caller can tell
//!   "re-authenticate" apart from "fix the configuration"

use thiserror::Error;

/// Primary error type for `redquery` operations.
#[derive(Error, Debug)]
pub enum QueryError {
    // === Remote fetch errors ===
    /// Network or HTTP-level failure talking to the tracker.
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The tracker rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The requested project or endpoint does not exist.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Generic search failure reported by the remote protocol.
    #[error("Search failed: {message}")]
    Search { message: String },

    // === Persistence errors ===
    /// Writing an issue into the store failed mid-refresh.
    #[error("Failed to persist issue '{id}': {source}")]
    Persistence {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// `SQLite` store error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Session errors ===
    /// A refresh is already in flight for this session.
    #[error("Refresh already in progress for query '{name}'")]
    RefreshInProgress { name: String },

    /// The session was removed and no longer accepts refreshes.
    #[error("Query '{name}' was removed")]
    SessionRemoved { name: String },

    // === Configuration errors ===
    /// Configuration value could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wrapped anyhow error for collaborator implementations.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QueryError {
    /// Build a transport error from any displayable cause.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Build an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Build a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Build a generic search error.
    #[must_use]
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    /// Can the user fix this by re-entering credentials or correcting
    /// the repository configuration?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::NotFound { .. } | Self::Config(_)
        )
    }

    /// Did the remote fetch itself fail (as opposed to local persistence
    /// or session bookkeeping)?
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Authentication { .. }
                | Self::NotFound { .. }
                | Self::Search { .. }
        )
    }
}

/// Result type using `QueryError`.
pub type Result<T> = std::result::Result<T, QueryError>;
