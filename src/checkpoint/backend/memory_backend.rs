//! In-memory checkpoint store.
//!
//! Owned by whoever builds it and shared through `Arc`; two orchestrators
//! handed the same store see the same threads.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use super::traits::{CheckpointStore, StoreResult};
use super::StoreError;
use crate::checkpoint::models::Checkpoint;

type ThreadKey = (String, String);

/// Checkpoint store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    threads: Arc<RwLock<HashMap<ThreadKey, BTreeMap<String, Checkpoint>>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checkpoints stored for (thread, namespace)
    pub fn checkpoint_count(&self, thread_id: &str, namespace: &str) -> usize {
        let threads = self.threads.read().unwrap_or_else(|e| e.into_inner());
        threads
            .get(&(thread_id.to_string(), namespace.to_string()))
            .map_or(0, BTreeMap::len)
    }

    /// Checkpoint ids stored for (thread, namespace), oldest first
    pub fn checkpoint_ids(&self, thread_id: &str, namespace: &str) -> Vec<String> {
        let threads = self.threads.read().unwrap_or_else(|e| e.into_inner());
        threads
            .get(&(thread_id.to_string(), namespace.to_string()))
            .map(|history| history.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        let mut threads = self.threads.write().unwrap_or_else(|e| e.into_inner());
        let history = threads
            .entry((checkpoint.thread_id.clone(), checkpoint.namespace.clone()))
            .or_default();

        if history.contains_key(&checkpoint.checkpoint_id) {
            return Err(StoreError::Conflict(checkpoint.document_key()));
        }

        let mut stored = checkpoint.clone();
        stored.created_at = Some(Utc::now());
        history.insert(stored.checkpoint_id.clone(), stored);
        Ok(())
    }

    async fn get_latest_checkpoint(
        &self,
        thread_id: &str,
        namespace: &str,
    ) -> StoreResult<Option<Checkpoint>> {
        let threads = self.threads.read().unwrap_or_else(|e| e.into_inner());
        Ok(threads
            .get(&(thread_id.to_string(), namespace.to_string()))
            .and_then(|history| history.values().next_back())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(thread_id: &str, namespace: &str, id: &str) -> Checkpoint {
        Checkpoint {
            thread_id: thread_id.to_string(),
            namespace: namespace.to_string(),
            checkpoint_id: id.to_string(),
            state_blob: format!(r#"{{"id":"{}"}}"#, id).into_bytes(),
            metadata_blob: Vec::new(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_latest_after_sequential_puts() {
        let store = InMemoryCheckpointStore::new();
        for i in 1..=5 {
            let id = format!("{:013}-00000000", i);
            store.put_checkpoint(&checkpoint("t1", "", &id)).await.unwrap();

            let latest = store.get_latest_checkpoint("t1", "").await.unwrap().unwrap();
            assert_eq!(latest.checkpoint_id, id);
            assert!(latest.created_at.is_some());
        }
        assert_eq!(store.checkpoint_count("t1", ""), 5);
    }

    #[tokio::test]
    async fn test_threads_and_namespaces_are_isolated() {
        let store = InMemoryCheckpointStore::new();
        store.put_checkpoint(&checkpoint("a", "", "0000000000002-aa")).await.unwrap();
        store.put_checkpoint(&checkpoint("b", "", "0000000000009-bb")).await.unwrap();
        store.put_checkpoint(&checkpoint("a", "sub", "0000000000010-cc")).await.unwrap();

        let a = store.get_latest_checkpoint("a", "").await.unwrap().unwrap();
        assert_eq!(a.checkpoint_id, "0000000000002-aa");
        assert!(store.get_latest_checkpoint("c", "").await.unwrap().is_none());
        assert_eq!(store.checkpoint_ids("a", "sub"), vec!["0000000000010-cc"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = InMemoryCheckpointStore::new();
        let cp = checkpoint("t1", "", "0000000000001-aa");
        store.put_checkpoint(&cp).await.unwrap();
        let err = store.put_checkpoint(&cp).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(key) if key == "t1_0000000000001-aa"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryCheckpointStore::new();
        let other = store.clone();
        store.put_checkpoint(&checkpoint("t1", "", "0000000000001-aa")).await.unwrap();
        assert!(other.get_latest_checkpoint("t1", "").await.unwrap().is_some());
    }
}
