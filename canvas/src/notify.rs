//! Deferred selection-change notification.
//!
//! Input handlers only mark a change as pending. The host drains it after the
//! handler returns (a microtask in the browser), so the listener never runs
//! while the engine is mid-mutation and may safely query it.

#[cfg(test)]
#[path = "notify_test.rs"]
mod notify_test;

use std::rc::Rc;

use serde::Serialize;

use crate::doc::ImageId;

/// What a selection listener learns about the new selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    pub selected: Vec<ImageId>,
    pub can_group: bool,
    pub can_ungroup: bool,
}

pub type SelectionListener = Rc<dyn Fn(&SelectionSummary)>;

/// One registrable listener plus a pending flag.
#[derive(Default)]
pub struct SelectionNotifier {
    listener: Option<SelectionListener>,
    pending: bool,
}

impl SelectionNotifier {
    /// Register the listener, replacing any previous one. `None` unregisters.
    pub fn set_listener(&mut self, listener: Option<SelectionListener>) {
        self.listener = listener;
    }

    pub fn mark_changed(&mut self) {
        self.pending = true;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Clear the pending flag and hand back the listener to call, if both a
    /// change and a listener exist. Several changes before a drain collapse
    /// into one delivery.
    pub fn take_pending(&mut self) -> Option<SelectionListener> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        self.listener.clone()
    }
}

impl std::fmt::Debug for SelectionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionNotifier")
            .field("listener", &self.listener.is_some())
            .field("pending", &self.pending)
            .finish()
    }
}
