//! Todo item commands: add, list, toggle, rm
//!
//! Mutations apply to the local store first and are then mirrored to the
//! remote collection when one is connected. A failed remote write is
//! reported as a warning and never rolls back the local mutation.

use anyhow::{bail, Result};
use tido_core::{ItemId, TodoStore};

use crate::commands::Remote;
use crate::output::{Output, OutputFormat};

/// Add a new item
pub async fn add(
    store: &mut TodoStore,
    remote: Option<&Remote>,
    text: String,
    output: &Output,
) -> Result<()> {
    let id = store.add(text.clone());

    if let Some(remote) = remote {
        if let Err(e) = remote
            .collection
            .add(remote.session.owner(), &text, false)
            .await
        {
            warn_push_failed(output, &e.to_string());
        }
    }

    match output.format {
        OutputFormat::Human => output.success(&format!("Added \"{}\"", text)),
        _ => {
            let snapshot = store.current_snapshot();
            if let Some(item) = snapshot.iter().find(|i| i.id == id) {
                output.print_item(item);
            }
        }
    }
    Ok(())
}

/// Print the current list
pub fn list(store: &TodoStore, output: &Output) -> Result<()> {
    output.print_items(&store.current_snapshot());
    Ok(())
}

/// Flip an item between done and pending
pub async fn toggle(
    store: &mut TodoStore,
    remote: Option<&Remote>,
    id: &str,
    output: &Output,
) -> Result<()> {
    let target = resolve_id(store, id)?;
    store.toggle(&target);

    let snapshot = store.current_snapshot();
    let Some(item) = snapshot.iter().find(|i| i.id == target) else {
        bail!("No todo matching '{}'", id);
    };

    if let Some(remote) = remote {
        if let Err(e) = remote
            .collection
            .set_done(remote.session.owner(), target.as_str(), item.done)
            .await
        {
            warn_push_failed(output, &e.to_string());
        }
    }

    match output.format {
        OutputFormat::Human => {
            let state = if item.done { "done" } else { "pending" };
            output.success(&format!("Marked \"{}\" as {}", item.text, state));
        }
        _ => output.print_item(item),
    }
    Ok(())
}

/// Delete an item
pub async fn rm(
    store: &mut TodoStore,
    remote: Option<&Remote>,
    id: &str,
    output: &Output,
) -> Result<()> {
    let target = resolve_id(store, id)?;
    let text = store
        .current_snapshot()
        .iter()
        .find(|i| i.id == target)
        .map(|i| i.text.clone())
        .unwrap_or_default();

    store.delete(&target);

    if let Some(remote) = remote {
        if let Err(e) = remote
            .collection
            .delete(remote.session.owner(), target.as_str())
            .await
        {
            warn_push_failed(output, &e.to_string());
        }
    }

    output.success(&format!("Deleted \"{}\"", text));
    Ok(())
}

fn warn_push_failed(output: &Output, error: &str) {
    if !output.is_quiet() {
        eprintln!("⚠ Sync push failed: {}", error);
    }
}

/// Resolve a user-supplied id or prefix to exactly one item
///
/// An exact match wins outright; otherwise the prefix must match exactly
/// one item.
fn resolve_id(store: &TodoStore, prefix: &str) -> Result<ItemId> {
    let snapshot = store.current_snapshot();

    if let Some(item) = snapshot.iter().find(|i| i.id.as_str() == prefix) {
        return Ok(item.id.clone());
    }

    let matches: Vec<_> = snapshot
        .iter()
        .filter(|i| i.id.as_str().starts_with(prefix))
        .collect();
    match matches.len() {
        0 => bail!("No todo matching '{}'", prefix),
        1 => Ok(matches[0].id.clone()),
        n => bail!(
            "'{}' is ambiguous ({} matches); use more characters",
            prefix,
            n
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tido_core::{Auth, Config, InMemoryCollection, RemoteCollection};

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn remote_with_session(temp_dir: &TempDir) -> (Arc<InMemoryCollection>, Remote) {
        let auth = Auth::with_config(Config {
            data_dir: temp_dir.path().to_path_buf(),
            sync_url: None,
            sync_enabled: false,
        });
        let session = auth.sign_up().unwrap();
        let collection = Arc::new(InMemoryCollection::new());
        let remote = Remote {
            collection: Arc::clone(&collection) as Arc<dyn RemoteCollection>,
            session,
        };
        (collection, remote)
    }

    #[test]
    fn test_resolve_exact_id() {
        let mut store = TodoStore::new();
        let id = store.add("x");
        assert_eq!(resolve_id(&store, id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let mut store = TodoStore::new();
        let id = store.add("x");
        let prefix: String = id.as_str().chars().take(8).collect();
        assert_eq!(resolve_id(&store, &prefix).unwrap(), id);
    }

    #[test]
    fn test_resolve_no_match_fails() {
        let mut store = TodoStore::new();
        store.add("x");
        assert!(resolve_id(&store, "zzzz-not-a-real-id").is_err());
    }

    #[test]
    fn test_resolve_ambiguous_prefix_fails() {
        let mut store = TodoStore::new();
        store.add("a");
        store.add("b");
        // Every generated id is a uuid, so the empty prefix matches both
        assert!(resolve_id(&store, "").is_err());
    }

    #[tokio::test]
    async fn test_add_mirrors_to_remote() {
        let temp_dir = TempDir::new().unwrap();
        let (collection, remote) = remote_with_session(&temp_dir);
        let mut store = TodoStore::new();

        add(&mut store, Some(&remote), "buy milk".to_string(), &quiet())
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let records = collection.fetch(remote.session.owner()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text.as_deref(), Some("buy milk"));
    }

    #[tokio::test]
    async fn test_toggle_mirrors_done_state() {
        let temp_dir = TempDir::new().unwrap();
        let (collection, remote) = remote_with_session(&temp_dir);
        let mut store = TodoStore::new();

        // Mirror the main flow: fetch remote records into the store first so
        // the local ids are the remote keys
        let key = collection
            .add(remote.session.owner(), "x", false)
            .await
            .unwrap();
        let records = collection.fetch(remote.session.owner()).await.unwrap();
        store.apply_remote(tido_core::items_from_records(records));

        toggle(&mut store, Some(&remote), &key, &quiet())
            .await
            .unwrap();

        assert!(store.current_snapshot()[0].done);
        let records = collection.fetch(remote.session.owner()).await.unwrap();
        assert_eq!(records[0].is_done, Some(true));
    }

    #[tokio::test]
    async fn test_rm_mirrors_delete() {
        let temp_dir = TempDir::new().unwrap();
        let (collection, remote) = remote_with_session(&temp_dir);
        let mut store = TodoStore::new();

        let key = collection
            .add(remote.session.owner(), "x", false)
            .await
            .unwrap();
        let records = collection.fetch(remote.session.owner()).await.unwrap();
        store.apply_remote(tido_core::items_from_records(records));

        rm(&mut store, Some(&remote), &key, &quiet()).await.unwrap();

        assert!(store.is_empty());
        let records = collection.fetch(remote.session.owner()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_push_failure_keeps_local_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let (_collection, remote) = remote_with_session(&temp_dir);
        let mut store = TodoStore::new();

        // The id is local-only, so the remote write is rejected; the local
        // delete still happens and the command still succeeds
        let id = store.add("local only");
        rm(&mut store, Some(&remote), id.as_str(), &quiet())
            .await
            .unwrap();
        assert!(store.is_empty());
    }
}
