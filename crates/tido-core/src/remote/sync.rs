//! Remote observation bridge
//!
//! `RemoteSync` connects an authenticated owner's remote collection to local
//! snapshot consumers. While attached, a spawned task translates every
//! remote record set into a [`Snapshot`] and fans it out; malformed records
//! are skipped rather than failing the batch.
//!
//! Detach contract: after `detach()` returns, no subscriber delivery fires,
//! even if a record set was already in flight. Delivery and detach serialize
//! on the same gate lock.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::{OwnerId, Session};
use crate::error::RemoteResult;
use crate::models::{items_from_records, ItemId, Snapshot};
use crate::remote::RemoteCollection;

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<Snapshot>>>>;

/// Fire-and-forget write handle for mirroring local mutations
///
/// Every push spawns a task; failures are logged and never retried or
/// surfaced to the caller, and local state is not rolled back.
#[derive(Clone)]
pub struct RemotePusher {
    collection: Arc<dyn RemoteCollection>,
    owner: OwnerId,
}

impl RemotePusher {
    /// Create a pusher scoped to an authenticated owner
    pub fn new(collection: Arc<dyn RemoteCollection>, session: &Session) -> Self {
        Self {
            collection,
            owner: session.owner().clone(),
        }
    }

    /// Forward an add; the remote assigns the record key
    pub fn push_add(&self, text: &str, done: bool) {
        let collection = Arc::clone(&self.collection);
        let owner = self.owner.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            match collection.add(&owner, &text, done).await {
                Ok(key) => debug!(key, "remote add written"),
                Err(e) => warn!(error = %e, "remote add failed"),
            }
        });
    }

    /// Forward a toggle as an absolute done-state write
    pub fn push_toggle(&self, id: &ItemId, done: bool) {
        let collection = Arc::clone(&self.collection);
        let owner = self.owner.clone();
        let id = id.clone();
        tokio::spawn(async move {
            if let Err(e) = collection.set_done(&owner, id.as_str(), done).await {
                warn!(id = %id, error = %e, "remote toggle failed");
            }
        });
    }

    /// Forward a delete
    pub fn push_delete(&self, id: &ItemId) {
        let collection = Arc::clone(&self.collection);
        let owner = self.owner.clone();
        let id = id.clone();
        tokio::spawn(async move {
            if let Err(e) = collection.delete(&owner, id.as_str()).await {
                warn!(id = %id, error = %e, "remote delete failed");
            }
        });
    }
}

/// Continuous observation of a per-owner remote collection
pub struct RemoteSync {
    collection: Arc<dyn RemoteCollection>,
    /// Snapshot consumers; survive detach/re-attach cycles
    subscribers: Subscribers,
    /// Gate for the current attachment; deliveries stop once set false
    gate: Option<Arc<Mutex<bool>>>,
    /// The spawned observation task
    task: Option<JoinHandle<()>>,
    owner: Option<OwnerId>,
}

impl RemoteSync {
    /// Create a bridge over the given collection, not yet observing
    pub fn new(collection: Arc<dyn RemoteCollection>) -> Self {
        Self {
            collection,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            gate: None,
            task: None,
            owner: None,
        }
    }

    /// Register a snapshot consumer
    ///
    /// Consumers registered before `attach` receive the initial remote set
    /// as their first delivery.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Snapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Begin continuous observation scoped to the session's owner
    ///
    /// Requires an authenticated session; re-attaching replaces any previous
    /// observation. The current remote set is delivered first, then one
    /// snapshot per remote change, whatever its cause.
    pub async fn attach(&mut self, session: &Session) -> RemoteResult<()> {
        self.detach();

        let owner = session.owner().clone();
        let mut record_sets = self.collection.subscribe(&owner).await?;
        info!(owner = %owner, "attached to remote collection");

        let gate = Arc::new(Mutex::new(true));
        let subscribers = Arc::clone(&self.subscribers);
        let task_gate = Arc::clone(&gate);

        let task = tokio::spawn(async move {
            while let Some(records) = record_sets.recv().await {
                let snapshot: Snapshot = Arc::new(items_from_records(records));
                // Holding the gate across the fan-out makes detach() a hard
                // cutoff: it cannot return while a delivery is in progress.
                let open = task_gate.lock().unwrap();
                if !*open {
                    break;
                }
                subscribers
                    .lock()
                    .unwrap()
                    .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
                drop(open);
            }
            debug!("remote observation ended");
        });

        self.gate = Some(gate);
        self.task = Some(task);
        self.owner = Some(owner);
        Ok(())
    }

    /// Stop observation
    ///
    /// Safe to call repeatedly and before any attach. Once this returns, no
    /// further snapshot reaches any subscriber until the next attach.
    pub fn detach(&mut self) {
        if let Some(gate) = self.gate.take() {
            *gate.lock().unwrap() = false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.owner.take().is_some() {
            info!("detached from remote collection");
        }
    }

    /// Whether an observation is currently running
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    /// Get a write handle for the current attachment, if any
    pub fn pusher(&self) -> Option<RemotePusher> {
        self.owner.as_ref().map(|owner| RemotePusher {
            collection: Arc::clone(&self.collection),
            owner: owner.clone(),
        })
    }
}

impl Drop for RemoteSync {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteRecord;
    use crate::remote::InMemoryCollection;

    fn session() -> Session {
        Session::for_owner(OwnerId::from("owner-1"))
    }

    #[tokio::test]
    async fn test_attach_delivers_initial_snapshot() {
        let collection = Arc::new(InMemoryCollection::new());
        collection
            .add(session().owner(), "x", false)
            .await
            .unwrap();

        let mut sync = RemoteSync::new(collection);
        let mut rx = sync.subscribe();
        sync.attach(&session()).await.unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text, "x");
        assert!(!snapshot[0].done);
    }

    #[tokio::test]
    async fn test_external_update_arrives_without_local_call() {
        let collection = Arc::new(InMemoryCollection::new());
        let key = collection
            .add(session().owner(), "x", false)
            .await
            .unwrap();

        let mut sync = RemoteSync::new(Arc::clone(&collection) as Arc<dyn RemoteCollection>);
        let mut rx = sync.subscribe();
        sync.attach(&session()).await.unwrap();
        let _ = rx.recv().await.unwrap();

        // Simulates another device completing the item
        collection
            .set_done(session().owner(), &key, true)
            .await
            .unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text, "x");
        assert!(snapshot[0].done);
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let collection = Arc::new(InMemoryCollection::new());
        collection.seed(
            session().owner(),
            RemoteRecord {
                id: "broken".to_string(),
                text: None,
                is_done: Some(true),
            },
        );
        collection
            .add(session().owner(), "good", false)
            .await
            .unwrap();

        let mut sync = RemoteSync::new(collection);
        let mut rx = sync.subscribe();
        sync.attach(&session()).await.unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text, "good");
    }

    #[tokio::test]
    async fn test_detach_stops_deliveries() {
        let collection = Arc::new(InMemoryCollection::new());
        let mut sync = RemoteSync::new(Arc::clone(&collection) as Arc<dyn RemoteCollection>);
        let mut rx = sync.subscribe();
        sync.attach(&session()).await.unwrap();
        let _ = rx.recv().await.unwrap();

        sync.detach();
        collection
            .add(session().owner(), "late", false)
            .await
            .unwrap();
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
        assert!(!sync.is_attached());
    }

    #[tokio::test]
    async fn test_detach_is_idempotent_and_safe_unattached() {
        let collection = Arc::new(InMemoryCollection::new());
        let mut sync = RemoteSync::new(collection);

        // Never attached
        sync.detach();
        sync.detach();

        sync.attach(&session()).await.unwrap();
        sync.detach();
        sync.detach();
    }

    #[tokio::test]
    async fn test_reattach_resumes_deliveries() {
        let collection = Arc::new(InMemoryCollection::new());
        let mut sync = RemoteSync::new(Arc::clone(&collection) as Arc<dyn RemoteCollection>);
        let mut rx = sync.subscribe();

        sync.attach(&session()).await.unwrap();
        let _ = rx.recv().await.unwrap();
        sync.detach();

        collection
            .add(session().owner(), "while detached", false)
            .await
            .unwrap();

        sync.attach(&session()).await.unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text, "while detached");
    }

    #[tokio::test]
    async fn test_pusher_requires_attachment() {
        let collection = Arc::new(InMemoryCollection::new());
        let mut sync = RemoteSync::new(collection);
        assert!(sync.pusher().is_none());

        sync.attach(&session()).await.unwrap();
        assert!(sync.pusher().is_some());

        sync.detach();
        assert!(sync.pusher().is_none());
    }

    #[tokio::test]
    async fn test_push_failures_are_swallowed() {
        let collection = Arc::new(InMemoryCollection::new());
        let pusher = RemotePusher::new(collection, &session());

        // No such record: the write is rejected remotely but the caller
        // never sees it
        pusher.push_toggle(&ItemId::from("missing"), true);
        pusher.push_delete(&ItemId::from("missing"));
        tokio::task::yield_now().await;
    }
}
