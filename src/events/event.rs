use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::SaveStatus;

/// Event emitted by the synchronization engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncEvent {
    Status(StatusEvent),
    Remote(RemoteEvent),
    Diagnostic(DiagnosticEvent),
}

/// Save-status transition on the write path.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEvent {
    pub status: SaveStatus,
    /// Monotonic save-attempt sequence number the transition belongs to.
    pub attempt: u64,
    pub when: DateTime<Utc>,
}

/// A remote snapshot overwrote the local graph.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEvent {
    /// True when unsaved local edits were discarded by the overwrite, a
    /// known risk of the last-remote-write-wins policy that is surfaced
    /// rather than hidden.
    pub discarded_local_edits: bool,
    pub when: DateTime<Utc>,
}

/// Free-form diagnostic with a scope label.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub scope: String,
    pub message: String,
}

impl SyncEvent {
    pub fn status(status: SaveStatus, attempt: u64) -> Self {
        SyncEvent::Status(StatusEvent {
            status,
            attempt,
            when: Utc::now(),
        })
    }

    pub fn remote_overwrite(discarded_local_edits: bool) -> Self {
        SyncEvent::Remote(RemoteEvent {
            discarded_local_edits,
            when: Utc::now(),
        })
    }

    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        SyncEvent::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn scope_label(&self) -> &str {
        match self {
            SyncEvent::Status(_) => "save",
            SyncEvent::Remote(_) => "remote",
            SyncEvent::Diagnostic(diag) => &diag.scope,
        }
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        match self {
            SyncEvent::Status(s) => format!("status={} attempt={}", s.status, s.attempt),
            SyncEvent::Remote(r) => {
                if r.discarded_local_edits {
                    "remote overwrite (unsaved local edits discarded)".to_string()
                } else {
                    "remote overwrite".to_string()
                }
            }
            SyncEvent::Diagnostic(d) => d.message.clone(),
        }
    }

    /// Convert to a structured JSON value with a normalized schema:
    /// `{"type", "scope", "message", "metadata"}`.
    pub fn to_json_value(&self) -> Value {
        let (event_type, metadata) = match self {
            SyncEvent::Status(s) => (
                "status",
                json!({"status": s.status, "attempt": s.attempt, "when": s.when.to_rfc3339()}),
            ),
            SyncEvent::Remote(r) => (
                "remote",
                json!({"discarded_local_edits": r.discarded_local_edits, "when": r.when.to_rfc3339()}),
            ),
            SyncEvent::Diagnostic(_) => ("diagnostic", json!({})),
        };
        json!({
            "type": event_type,
            "scope": self.scope_label(),
            "message": self.summary(),
            "metadata": metadata,
        })
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scope_label(), self.summary())
    }
}
