//! Core identifier and status types for the flowsync engine.
//!
//! This module defines the fundamental types used throughout the crate for
//! identifying nodes, edges, and the flowchart document itself, plus the
//! small enums that describe the engine's externally observable state.
//!
//! # Key Types
//!
//! - [`NodeId`] / [`EdgeId`]: opaque, immutable, never-reused identifiers
//! - [`FlowchartKey`]: the fixed process-wide document identifier
//! - [`Role`]: the gating predicate for the write path
//! - [`SaveStatus`]: tri-state persistence indicator surfaced to observers
//!
//! # Examples
//!
//! ```rust
//! use flowsync::types::{NodeId, Role, SaveStatus};
//!
//! let id = NodeId::new("n-1878");
//! assert_eq!(id.as_str(), "n-1878");
//!
//! // Generated ids are unique
//! assert_ne!(NodeId::generate(), NodeId::generate());
//!
//! assert!(Role::Editor.is_editor());
//! assert_eq!(SaveStatus::Saved.to_string(), "saved");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier of a flowchart node.
///
/// Ids are immutable once created and never reused. Ids minted by the
/// engine itself (e.g. [`NodeId::generate`]) are UUID v4 strings; ids
/// arriving from a remote snapshot are accepted verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh, globally unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque unique identifier of a flowchart edge.
///
/// Same contract as [`NodeId`]; node and edge id spaces are independent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh, globally unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of the single flowchart document a deployment manages.
///
/// The key is injected through [`SyncConfig`](crate::config::SyncConfig)
/// rather than hard-coded inside any gateway, so multi-document support is
/// a pure extension of the configuration surface.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowchartKey(String);

impl FlowchartKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FlowchartKey {
    fn default() -> Self {
        Self("main-flowchart".to_string())
    }
}

impl fmt::Display for FlowchartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FlowchartKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Permission level of the current session.
///
/// The engine treats this purely as a gating predicate for the write path;
/// it is re-evaluated at every decision point, never cached at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// May mutate the flowchart and persist it.
    Editor,
    /// Read-only access; local mutations are possible but never persisted.
    Viewer,
}

impl Role {
    #[must_use]
    pub fn is_editor(self) -> bool {
        matches!(self, Role::Editor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Editor => write!(f, "editor"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Persistence status surfaced to the presentation layer.
///
/// Transient save failures land here as [`SaveStatus::Error`] instead of
/// being thrown at mutation call sites; further local edits are never
/// blocked by a failed save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// No save dispatched yet (or the session is a viewer).
    #[default]
    Idle,
    /// A save attempt is in flight.
    Saving,
    /// The most recent save attempt succeeded.
    Saved,
    /// The most recent save attempt failed; the document stays dirty.
    Error,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Idle => write!(f, "idle"),
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved => write!(f, "saved"),
            SaveStatus::Error => write!(f, "error"),
        }
    }
}

/// Lifecycle phase of the reconciliation controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Initial snapshot is being fetched; subscriptions not yet active.
    Loading,
    /// Normal operation: write and read paths are live.
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Loading => write!(f, "loading"),
            Phase::Ready => write!(f, "ready"),
        }
    }
}
