//! The remote collection seam
//!
//! A `RemoteCollection` is an externally hosted, per-owner set of todo
//! records. Its consistency model is whatever the backing store provides;
//! nothing here adds conflict resolution or offline queueing.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::auth::OwnerId;
use crate::error::RemoteResult;
use crate::models::RemoteRecord;

/// An opaque per-owner synchronized record store
///
/// Implementations must deliver the current record set as the first message
/// on a fresh subscription, then the full record set again after every
/// change, whatever its cause — including this process's own writes
/// round-tripping.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Add a record; the store assigns and returns the record key
    async fn add(&self, owner: &OwnerId, text: &str, done: bool) -> RemoteResult<String>;

    /// Set the done flag of a record by key
    async fn set_done(&self, owner: &OwnerId, id: &str, done: bool) -> RemoteResult<()>;

    /// Delete a record by key; deleting an absent key is not an error
    async fn delete(&self, owner: &OwnerId, id: &str) -> RemoteResult<()>;

    /// Point read of the owner's full record set
    async fn fetch(&self, owner: &OwnerId) -> RemoteResult<Vec<RemoteRecord>>;

    /// Begin continuous observation of the owner's record set
    ///
    /// The receiver gets the current set immediately, then one full set per
    /// change. Dropping the receiver ends the observation.
    async fn subscribe(
        &self,
        owner: &OwnerId,
    ) -> RemoteResult<mpsc::UnboundedReceiver<Vec<RemoteRecord>>>;
}
