//! CLI command handlers

use std::sync::Arc;

use tido_core::{RemoteCollection, Session};

pub mod auth;
pub mod config;
pub mod status;
pub mod todo;

/// An authenticated connection to the remote collection
///
/// Commands that mirror writes remotely carry one of these; its presence is
/// proof that sign-in succeeded.
pub struct Remote {
    pub collection: Arc<dyn RemoteCollection>,
    pub session: Session,
}
