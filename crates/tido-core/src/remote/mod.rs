//! Remote collection sync
//!
//! Bridges the local [`TodoStore`](crate::TodoStore) to a per-owner remote
//! collection of todo records.
//!
//! ## Components
//!
//! - [`RemoteCollection`]: the opaque remote store (add / update / delete /
//!   point read / continuous subscription), keyed by owner identity.
//! - [`RemoteSync`]: observation bridge. While attached it translates every
//!   remote record set into item snapshots for subscribers.
//! - [`RemotePusher`]: fire-and-forget write handle used by the store to
//!   mirror local mutations.
//! - [`WsCollection`]: websocket transport implementing `RemoteCollection`.
//! - [`InMemoryCollection`]: in-process backend for tests and examples.

mod collection;
mod memory;
mod sync;
mod ws;

pub use collection::RemoteCollection;
pub use memory::InMemoryCollection;
pub use sync::{RemotePusher, RemoteSync};
pub use ws::WsCollection;
