//! tido Core Library
//!
//! This crate provides the core functionality for tido, a todo list manager
//! with optional remote sync.
//!
//! # Architecture
//!
//! - **TodoStore**: owns the authoritative ordered item list and emits the
//!   full list to subscribers on every mutation
//! - **RemoteSync**: mirrors the store to a per-owner remote collection;
//!   the remote is the source of truth while attached
//! - **Auth**: the sign-in gate producing the owner identity that scopes
//!   the remote collection
//!
//! # Quick Start
//!
//! ```
//! use tido_core::TodoStore;
//!
//! let mut store = TodoStore::new();
//! let id = store.add("buy milk");
//! store.toggle(&id);
//!
//! let snapshot = store.current_snapshot();
//! assert_eq!(snapshot[0].text, "buy milk");
//! assert!(snapshot[0].done);
//! ```
//!
//! # Modules
//!
//! - `store`: todo list state management (main entry point)
//! - `models`: item, snapshot, and remote record types
//! - `remote`: remote collection trait, sync bridge, websocket transport
//! - `auth`: owner identity and credential storage
//! - `config`: application configuration
//! - `error`: typed errors for the remote and auth seams

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod store;

pub use auth::{Auth, OwnerId, Session};
pub use config::Config;
pub use error::{AuthError, RemoteError};
pub use models::{items_from_records, ItemId, RemoteRecord, Snapshot, TodoItem};
pub use remote::{InMemoryCollection, RemoteCollection, RemotePusher, RemoteSync, WsCollection};
pub use store::TodoStore;
