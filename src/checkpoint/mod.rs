//! Durable, thread-isolated checkpoints.
//!
//! - [`backend`]: the [`CheckpointStore`] trait and its memory, file and
//!   DocumentDB implementations
//! - [`CheckpointEngine`]: id generation, state (de)serialisation and the
//!   get-latest / put-new contract
//!
//! For a given (thread, namespace) the checkpoint with the greatest id is the
//! authoritative state. Checkpoints are never mutated or deleted.

pub mod backend;
pub mod engine;
pub mod errors;
pub mod ids;
pub mod models;

pub use backend::{
    CheckpointStore, CheckpointStoreBuilder, FileCheckpointStore, InMemoryCheckpointStore,
    StoreError, StoreResult,
};
#[cfg(feature = "storage-documentdb")]
pub use backend::DocumentDbCheckpointStore;
pub use engine::CheckpointEngine;
pub use errors::{CheckpointError, CheckpointResult};
pub use ids::{timestamp_of, validate_checkpoint_id, CheckpointIdGenerator};
pub use models::{Checkpoint, CheckpointMetadata, CheckpointSource, StateSnapshot};
