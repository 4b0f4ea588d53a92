//! Checkpoint Store Backends
//!
//! Trait-based abstraction over where checkpoints live. The engine only sees
//! `Arc<dyn CheckpointStore>`; which backend sits behind it is a deployment
//! decision.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CheckpointEngine   │
//! │  (ids, (de)coding)  │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   CheckpointStore   │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┼───────────┐
//!     │      │           │
//! ┌───▼───┐ ┌▼─────┐ ┌───▼───────┐
//! │Memory │ │ File │ │ DocumentDB│
//! └───────┘ └──────┘ └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use switchboard::checkpoint::backend::{CheckpointStore, FileCheckpointStore};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = FileCheckpointStore::new("/var/lib/switchboard")?;
//!     let latest = store.get_latest_checkpoint("thread-1", "").await?;
//!     println!("has state: {}", latest.is_some());
//!     Ok(())
//! }
//! ```

mod file_backend;
mod memory_backend;
mod traits;

pub use file_backend::*;
pub use memory_backend::*;
pub use traits::*;

#[cfg(feature = "storage-documentdb")]
mod documentdb_backend;

#[cfg(feature = "storage-documentdb")]
pub use documentdb_backend::DocumentDbCheckpointStore;
