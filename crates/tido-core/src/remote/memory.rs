//! In-process remote collection
//!
//! A `RemoteCollection` backed by a mutex-guarded map, used by the test
//! suite and examples to exercise sync behavior without a server. Change
//! notification is synchronous: every successful write fans the owner's full
//! record set out to live subscriptions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::auth::OwnerId;
use crate::error::{RemoteError, RemoteResult};
use crate::models::RemoteRecord;
use crate::remote::collection::RemoteCollection;

#[derive(Default)]
struct Inner {
    /// Per-owner record sets, insertion order
    records: HashMap<String, Vec<RemoteRecord>>,
    /// Per-owner subscription channels; closed ones are pruned on notify
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<Vec<RemoteRecord>>>>,
    /// Key counter for store-assigned ids
    next_key: u64,
}

impl Inner {
    fn notify(&mut self, owner: &str) {
        let snapshot = self.records.get(owner).cloned().unwrap_or_default();
        if let Some(watchers) = self.watchers.get_mut(owner) {
            watchers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        }
    }
}

/// In-memory `RemoteCollection`
#[derive(Default)]
pub struct InMemoryCollection {
    inner: Mutex<Inner>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with a chosen key, bypassing key assignment
    ///
    /// Lets tests seed the collection, including malformed records.
    pub fn seed(&self, owner: &OwnerId, record: RemoteRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .records
            .entry(owner.as_str().to_string())
            .or_default()
            .push(record);
        inner.notify(owner.as_str());
    }
}

#[async_trait]
impl RemoteCollection for InMemoryCollection {
    async fn add(&self, owner: &OwnerId, text: &str, done: bool) -> RemoteResult<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_key += 1;
        let key = format!("rec-{}", inner.next_key);
        inner
            .records
            .entry(owner.as_str().to_string())
            .or_default()
            .push(RemoteRecord {
                id: key.clone(),
                text: Some(text.to_string()),
                is_done: Some(done),
            });
        inner.notify(owner.as_str());
        Ok(key)
    }

    async fn set_done(&self, owner: &OwnerId, id: &str, done: bool) -> RemoteResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let updated = inner
            .records
            .get_mut(owner.as_str())
            .and_then(|set| set.iter_mut().find(|r| r.id == id))
            .map(|record| record.is_done = Some(done))
            .is_some();
        if updated {
            inner.notify(owner.as_str());
            Ok(())
        } else {
            Err(RemoteError::Rejected(format!("no record with key '{id}'")))
        }
    }

    async fn delete(&self, owner: &OwnerId, id: &str) -> RemoteResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let removed = match inner.records.get_mut(owner.as_str()) {
            Some(set) => {
                let before = set.len();
                set.retain(|r| r.id != id);
                set.len() != before
            }
            None => false,
        };
        if removed {
            inner.notify(owner.as_str());
        }
        Ok(())
    }

    async fn fetch(&self, owner: &OwnerId) -> RemoteResult<Vec<RemoteRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .get(owner.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn subscribe(
        &self,
        owner: &OwnerId,
    ) -> RemoteResult<mpsc::UnboundedReceiver<Vec<RemoteRecord>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        let current = inner
            .records
            .get(owner.as_str())
            .cloned()
            .unwrap_or_default();
        // Initial delivery carries the current set
        let _ = tx.send(current);
        inner
            .watchers
            .entry(owner.as_str().to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
