//! Role signal consumed by the write path.
//!
//! The engine does not manage identity; it consumes an opaque "is editor"
//! predicate supplied by an external collaborator. [`RoleSignal`] is the
//! seam, re-evaluated at every gating decision rather than cached at
//! startup. [`SharedRole`] is the stock implementation: a cheaply clonable
//! handle the identity layer flips when the user's permissions change or
//! they sign out.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::Role;

/// Continuously re-evaluated gating predicate for the write path.
pub trait RoleSignal: Send + Sync + fmt::Debug {
    fn current(&self) -> Role;

    fn is_editor(&self) -> bool {
        self.current().is_editor()
    }
}

/// Shared, atomically updated role handle.
///
/// Clones observe each other's updates; `sign_out` drops the session to
/// viewer, which cancels any pending write-path work on the next gating
/// check.
#[derive(Clone, Debug, Default)]
pub struct SharedRole {
    editor: Arc<AtomicBool>,
}

impl SharedRole {
    #[must_use]
    pub fn editor() -> Self {
        Self {
            editor: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn viewer() -> Self {
        Self::default()
    }

    pub fn set(&self, role: Role) {
        self.editor.store(role.is_editor(), Ordering::SeqCst);
    }

    /// Drop to viewer. Pending debounced saves are cancelled, not flushed.
    pub fn sign_out(&self) {
        self.set(Role::Viewer);
    }
}

impl RoleSignal for SharedRole {
    fn current(&self) -> Role {
        if self.editor.load(Ordering::SeqCst) {
            Role::Editor
        } else {
            Role::Viewer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_signal() {
        let role = SharedRole::editor();
        let observer = role.clone();
        assert!(observer.is_editor());
        role.sign_out();
        assert_eq!(observer.current(), Role::Viewer);
    }
}
