//! Checkpoint engine: the get-latest / put-new contract used by the state machine.

use std::sync::Arc;

use super::backend::CheckpointStore;
use super::errors::{CheckpointError, CheckpointResult};
use super::ids::{validate_checkpoint_id, CheckpointIdGenerator};
use super::models::{Checkpoint, CheckpointMetadata, StateSnapshot};
use crate::conversation::ConversationState;

/// Turns conversation states into checkpoints and back.
///
/// The store is injected by the caller; the engine keeps no thread state of its
/// own apart from the id clamp.
pub struct CheckpointEngine {
    store: Arc<dyn CheckpointStore>,
    ids: CheckpointIdGenerator,
}

impl CheckpointEngine {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            store,
            ids: CheckpointIdGenerator::new(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Latest decoded state for (thread, namespace); `None` on a cold thread
    pub async fn get_latest(
        &self,
        thread_id: &str,
        namespace: &str,
    ) -> CheckpointResult<Option<StateSnapshot>> {
        validate_thread_id(thread_id)?;

        let checkpoint = self
            .store
            .get_latest_checkpoint(thread_id, namespace)
            .await
            .map_err(|e| CheckpointError::from_store(e, thread_id))?;

        match checkpoint {
            Some(checkpoint) => {
                self.ids.observe(&checkpoint.checkpoint_id);
                Self::decode(checkpoint).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Persist `state` under a freshly generated id and return the id.
    ///
    /// Returns only after the store acknowledged the write.
    pub async fn put(
        &self,
        thread_id: &str,
        namespace: &str,
        state: &ConversationState,
        metadata: &CheckpointMetadata,
    ) -> CheckpointResult<String> {
        let checkpoint_id = self.ids.next_id();
        self.put_with_id(thread_id, namespace, &checkpoint_id, state, metadata)
            .await?;
        Ok(checkpoint_id)
    }

    /// Persist `state` under a caller-supplied id
    pub async fn put_with_id(
        &self,
        thread_id: &str,
        namespace: &str,
        checkpoint_id: &str,
        state: &ConversationState,
        metadata: &CheckpointMetadata,
    ) -> CheckpointResult<()> {
        validate_thread_id(thread_id)?;
        validate_checkpoint_id(checkpoint_id)?;

        let checkpoint = Checkpoint {
            thread_id: thread_id.to_string(),
            namespace: namespace.to_string(),
            checkpoint_id: checkpoint_id.to_string(),
            state_blob: serde_json::to_vec(state)?,
            metadata_blob: serde_json::to_vec(metadata)?,
            created_at: None,
        };

        self.store
            .put_checkpoint(&checkpoint)
            .await
            .map_err(|e| CheckpointError::from_store(e, thread_id))?;

        self.ids.observe(checkpoint_id);
        tracing::debug!(
            thread_id,
            namespace,
            checkpoint_id,
            backend = self.store.backend_type(),
            "checkpoint written"
        );
        Ok(())
    }

    /// History listing is not provided; only the latest state is addressable
    pub async fn list(
        &self,
        thread_id: &str,
        _namespace: &str,
    ) -> CheckpointResult<Vec<StateSnapshot>> {
        validate_thread_id(thread_id)?;
        Err(CheckpointError::unsupported("list checkpoint history"))
    }

    /// Decode a stored checkpoint.
    ///
    /// An unreadable blob or an unknown `next` node is corruption; nothing is
    /// defaulted.
    pub fn decode(checkpoint: Checkpoint) -> CheckpointResult<StateSnapshot> {
        let state: ConversationState = serde_json::from_slice(&checkpoint.state_blob)
            .map_err(|e| {
                CheckpointError::corrupted(
                    &checkpoint.thread_id,
                    format!("checkpoint {}: {}", checkpoint.checkpoint_id, e),
                )
            })?;

        let metadata = if checkpoint.metadata_blob.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&checkpoint.metadata_blob).map_err(|e| {
                CheckpointError::corrupted(
                    &checkpoint.thread_id,
                    format!("checkpoint {} metadata: {}", checkpoint.checkpoint_id, e),
                )
            })?
        };

        Ok(StateSnapshot {
            thread_id: checkpoint.thread_id,
            namespace: checkpoint.namespace,
            checkpoint_id: checkpoint.checkpoint_id,
            state,
            metadata,
            created_at: checkpoint.created_at,
        })
    }
}

fn validate_thread_id(thread_id: &str) -> CheckpointResult<()> {
    if thread_id.trim().is_empty() {
        return Err(CheckpointError::InvalidThreadId {
            thread_id: thread_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::backend::InMemoryCheckpointStore;
    use crate::conversation::{Message, Node};

    fn engine() -> (CheckpointEngine, InMemoryCheckpointStore) {
        let store = InMemoryCheckpointStore::new();
        (CheckpointEngine::new(Arc::new(store.clone())), store)
    }

    fn state_with(text: &str, next: Node) -> ConversationState {
        ConversationState {
            messages: vec![Message::user(text)],
            next,
        }
    }

    #[tokio::test]
    async fn test_cold_thread_has_no_state() {
        let (engine, _) = engine();
        assert!(engine.get_latest("t1", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_after_n_puts() {
        let (engine, store) = engine();
        let mut last_id = String::new();
        for i in 0..10 {
            let state = state_with(&format!("message {}", i), Node::Supervisor);
            last_id = engine
                .put("t1", "", &state, &CheckpointMetadata::step(i, "supervisor"))
                .await
                .unwrap();
        }

        let latest = engine.get_latest("t1", "").await.unwrap().unwrap();
        assert_eq!(latest.checkpoint_id, last_id);
        assert_eq!(latest.state.messages[0].content, "message 9");
        assert_eq!(latest.metadata["step"], 9);
        assert_eq!(store.checkpoint_count("t1", ""), 10);

        // Generated ids are strictly increasing even inside one millisecond
        let ids = store.checkpoint_ids("t1", "");
        assert_eq!(ids.last(), Some(&last_id));
    }

    #[tokio::test]
    async fn test_explicit_id() {
        let (engine, _) = engine();
        let state = state_with("hi", Node::Halted);
        engine
            .put_with_id("t1", "", "custom-1", &state, &CheckpointMetadata::input())
            .await
            .unwrap();

        let err = engine
            .put_with_id("t1", "", "has space", &state, &CheckpointMetadata::input())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidCheckpointId { .. }));

        let err = engine
            .put_with_id("t1", "", "custom-1", &state, &CheckpointMetadata::input())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_unknown_next_is_corruption() {
        let (engine, store) = engine();
        let bad = Checkpoint {
            thread_id: "t1".to_string(),
            namespace: String::new(),
            checkpoint_id: "0000000000001-aa".to_string(),
            state_blob: br#"{"messages":[],"next":"reviewer"}"#.to_vec(),
            metadata_blob: Vec::new(),
            created_at: None,
        };
        store.put_checkpoint(&bad).await.unwrap();

        let err = engine.get_latest("t1", "").await.unwrap_err();
        assert!(err.is_corruption());
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_unparseable_blob_is_corruption() {
        let (engine, store) = engine();
        let bad = Checkpoint {
            thread_id: "t1".to_string(),
            namespace: String::new(),
            checkpoint_id: "0000000000001-aa".to_string(),
            state_blob: b"not json at all".to_vec(),
            metadata_blob: Vec::new(),
            created_at: None,
        };
        store.put_checkpoint(&bad).await.unwrap();
        assert!(engine.get_latest("t1", "").await.unwrap_err().is_corruption());
    }

    #[tokio::test]
    async fn test_list_is_unsupported() {
        let (engine, _) = engine();
        let err = engine.list("t1", "").await.unwrap_err();
        assert!(matches!(err, CheckpointError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_blank_thread_id_rejected() {
        let (engine, _) = engine();
        let err = engine.get_latest("  ", "").await.unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidThreadId { .. }));
    }
}
