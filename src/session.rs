//! Transient edit state, decoupled from the committed graph.
//!
//! [`EditSession`] tracks what the user is *about* to do (the current
//! selection and an in-progress field draft) without touching the
//! [`FlowchartStore`] until the draft is committed. At most one of
//! "node selected", "edge selected", or "node being edited" holds at any
//! time; entering any of the three clears the others.
//!
//! Drafts validate the event year against the configured [`YearBounds`]
//! and reject out-of-range values rather than clamping them. Commit is
//! idempotent: repeating it with identical content is a no-op, which makes
//! it safe to drive from a debounced auto-commit timer.

use miette::Diagnostic;
use thiserror::Error;

use crate::model::NodePatch;
use crate::store::{FlowchartStore, StoreChange};
use crate::types::{EdgeId, NodeId};

/// Earliest representable event year (domain floor).
pub const EARLIEST_EVENT_YEAR: i32 = 1878;

/// Inclusive bounds for a draft's event year.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Reject a year outside the bounds; never clamps.
    pub fn check(&self, year: i32) -> Result<(), SessionError> {
        if year < self.min || year > self.max {
            return Err(SessionError::YearOutOfRange {
                year,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Validation and lifecycle errors raised by the edit session.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("cannot edit unknown node: {id}")]
    #[diagnostic(code(flowsync::session::unknown_node))]
    UnknownNode { id: NodeId },

    #[error("year {year} outside permitted range {min}..={max}")]
    #[diagnostic(
        code(flowsync::session::year_out_of_range),
        help("Out-of-range years are rejected, never clamped.")
    )]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("no edit in progress")]
    #[diagnostic(code(flowsync::session::no_active_edit))]
    NoActiveEdit,
}

/// Exclusive selection state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// Local draft of a node's editable fields, captured at `begin_edit` and
/// decoupled from the committed node until merged in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    pub node_id: NodeId,
    pub year: i32,
    pub body: String,
    pub country: Option<String>,
}

/// Partial update applied to the active draft. All fields optional; the
/// update is all-or-nothing: a rejected year leaves every field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftUpdate {
    pub year: Option<i32>,
    pub body: Option<String>,
    pub country: Option<Option<String>>,
}

impl DraftUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = Some(country);
        self
    }
}

/// Tracks selection and in-progress field edits for the current process.
#[derive(Debug)]
pub struct EditSession {
    bounds: YearBounds,
    selection: Selection,
    draft: Option<EditDraft>,
}

impl EditSession {
    pub fn new(bounds: YearBounds) -> Self {
        Self {
            bounds,
            selection: Selection::None,
            draft: None,
        }
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    /// Id of the node currently being edited, if any.
    #[must_use]
    pub fn editing_node(&self) -> Option<&NodeId> {
        self.draft.as_ref().map(|d| &d.node_id)
    }

    /// Select a node, clearing any edge selection and discarding any draft.
    pub fn select_node(&mut self, id: NodeId) {
        self.draft = None;
        self.selection = Selection::Node(id);
    }

    /// Select an edge, clearing any node selection and discarding any draft.
    pub fn select_edge(&mut self, id: EdgeId) {
        self.draft = None;
        self.selection = Selection::Edge(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Begin editing a node, capturing its current fields as the draft
    /// baseline. Clears any selection.
    pub fn begin_edit(&mut self, store: &FlowchartStore, id: &NodeId) -> Result<(), SessionError> {
        let Some(node) = store.node(id) else {
            return Err(SessionError::UnknownNode { id: id.clone() });
        };
        self.selection = Selection::None;
        self.draft = Some(EditDraft {
            node_id: node.id.clone(),
            year: node.event.year,
            body: node.event.body.clone(),
            country: node.event.country.clone(),
        });
        Ok(())
    }

    /// Apply a partial update to the active draft. Pure local mutation with
    /// no store effect; out-of-range years reject the whole update.
    pub fn update_draft(&mut self, update: DraftUpdate) -> Result<(), SessionError> {
        let Some(draft) = self.draft.as_mut() else {
            return Err(SessionError::NoActiveEdit);
        };
        if let Some(year) = update.year {
            self.bounds.check(year)?;
            draft.year = year;
        }
        if let Some(body) = update.body {
            draft.body = body;
        }
        if let Some(country) = update.country {
            draft.country = country;
        }
        Ok(())
    }

    /// Merge the draft into the store and clear it.
    ///
    /// No active edit is a no-op (`Ok(None)`), so the debounced auto-commit
    /// can fire repeatedly without harm. A draft whose node has vanished
    /// (e.g. removed by a remote overwrite) is discarded silently; the
    /// node no longer exists to receive it.
    pub fn commit(&mut self, store: &mut FlowchartStore) -> Result<Option<StoreChange>, SessionError> {
        let Some(draft) = self.draft.as_ref() else {
            return Ok(None);
        };
        self.bounds.check(draft.year)?;
        if !store.contains_node(&draft.node_id) {
            tracing::debug!(node = %draft.node_id, "dropping draft for vanished node");
            self.draft = None;
            return Ok(None);
        }
        let patch = NodePatch::new()
            .with_year(draft.year)
            .with_body(draft.body.clone())
            .with_country(draft.country.clone());
        let change = store
            .update_node(&draft.node_id, patch)
            .expect("node presence checked above");
        self.draft = None;
        Ok(change)
    }

    /// Discard the draft without touching the store.
    pub fn cancel(&mut self) -> Option<EditDraft> {
        self.draft.take()
    }

    /// Drop any selection or draft referencing `id` (the node is gone).
    pub fn forget_node(&mut self, id: &NodeId) {
        if self.editing_node() == Some(id) {
            self.draft = None;
        }
        if self.selection == Selection::Node(id.clone()) {
            self.selection = Selection::None;
        }
    }
}
