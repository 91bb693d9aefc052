//! Todo list state management
//!
//! The `TodoStore` owns the authoritative ordered list of items for the
//! current session and is the only place mutations happen. Consumers observe
//! it through full-list snapshots:
//!
//! - every mutation emits exactly one snapshot to every subscriber, even
//!   when the mutation changed nothing (consumers always re-render from the
//!   full list, never from diffs);
//! - `current_snapshot()` hands out a shared read-only view that cannot race
//!   a later mutation.
//!
//! ## Remote mirroring
//!
//! When a [`RemotePusher`] is attached, mutations are applied locally first
//! (optimistic policy) and then forwarded to the remote collection as
//! fire-and-forget writes. The remote is the source of truth while attached:
//! each remote snapshot that arrives replaces the local list wholesale via
//! [`TodoStore::apply_remote`].
//!
//! ## Usage
//!
//! ```
//! use tido_core::TodoStore;
//!
//! let mut store = TodoStore::new();
//! let mut updates = store.subscribe();
//!
//! let id = store.add("buy milk");
//! store.toggle(&id);
//!
//! let snapshot = store.current_snapshot();
//! assert!(snapshot[0].done);
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::models::{ItemId, Snapshot, TodoItem};
use crate::remote::RemotePusher;

/// Owner of the authoritative in-process todo list
pub struct TodoStore {
    /// The ordered item list, insertion order unless remote-supplied
    items: Vec<TodoItem>,
    /// Snapshot subscribers; closed channels are pruned on emit
    subscribers: Vec<mpsc::UnboundedSender<Snapshot>>,
    /// Remote mirror for forwarding mutations, when attached
    remote: Option<RemotePusher>,
}

impl TodoStore {
    /// Create an empty store with no subscribers and no remote
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            subscribers: Vec::new(),
            remote: None,
        }
    }

    /// Register a snapshot consumer
    ///
    /// The receiver gets one full-list snapshot per mutation from this point
    /// on. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Snapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Append a new item with `done = false`
    ///
    /// No validation: any text is accepted, including empty. Returns the id
    /// of the new item; while a remote is attached the id is provisional
    /// until the store-assigned key arrives with the next remote snapshot.
    pub fn add(&mut self, text: impl Into<String>) -> ItemId {
        let item = TodoItem::new(text);
        let id = item.id.clone();
        if let Some(remote) = &self.remote {
            remote.push_add(&item.text, item.done);
        }
        self.items.push(item);
        self.emit();
        id
    }

    /// Flip the done flag of the item with the given identity
    ///
    /// Silent no-op when the item is no longer present; a snapshot is
    /// emitted either way.
    pub fn toggle(&mut self, id: &ItemId) {
        if let Some(item) = self.items.iter_mut().find(|i| &i.id == id) {
            item.done = !item.done;
            if let Some(remote) = &self.remote {
                remote.push_toggle(id, item.done);
            }
        } else {
            debug!(id = %id, "toggle target not found, ignoring");
        }
        self.emit();
    }

    /// Remove the item with the given identity
    ///
    /// Silent no-op when not found; a snapshot is emitted either way.
    pub fn delete(&mut self, id: &ItemId) {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        if self.items.len() != before {
            if let Some(remote) = &self.remote {
                remote.push_delete(id);
            }
        } else {
            debug!(id = %id, "delete target not found, ignoring");
        }
        self.emit();
    }

    /// Get the current full list as a shared read-only view
    pub fn current_snapshot(&self) -> Snapshot {
        Arc::new(self.items.clone())
    }

    /// Number of items in the list
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the whole list with a remote-supplied snapshot
    ///
    /// Remote order is accepted as-is. Items whose ids disappeared from the
    /// remote set are dropped. Emits one snapshot.
    pub fn apply_remote(&mut self, items: Vec<TodoItem>) {
        self.items = items;
        self.emit();
    }

    /// Start mirroring mutations to a remote collection
    pub fn attach_remote(&mut self, remote: RemotePusher) {
        self.remote = Some(remote);
    }

    /// Stop mirroring mutations; safe when nothing is attached
    pub fn detach_remote(&mut self) {
        self.remote = None;
    }

    /// Whether a remote mirror is attached
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Send the current list to every live subscriber
    fn emit(&mut self) {
        let snapshot: Snapshot = Arc::new(self.items.clone());
        self.subscribers
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}
