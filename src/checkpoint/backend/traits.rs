//! Checkpoint Store Traits
//!
//! Defines the contract every checkpoint store backend implements.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::checkpoint::models::Checkpoint;
use crate::config::CheckpointingConfig;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error during storage operation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored record could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Connection error (for remote backends)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A record with the same key already exists
    #[error("Key already exists: {0}")]
    Conflict(String),

    /// Key cannot be stored by this backend
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Generic backend error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the failure is about reaching the store rather than its contents
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Connection(_) | Self::Backend(_) | Self::Conflict(_)
        )
    }

    /// Whether a stored record is unreadable
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Deserialization(_))
    }
}

/// Durable append-only checkpoint storage.
///
/// Implementations must give read-your-writes per thread and must never return
/// a record of one (thread, namespace) pair for a query on another.
/// "No checkpoint" is `Ok(None)`, never an error.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Get the backend type name (e.g., "memory", "file", "documentdb")
    fn backend_type(&self) -> &'static str;

    /// Check if the backend is available/connected
    async fn is_available(&self) -> bool;

    /// Append a checkpoint. Fails with `Conflict` if the key is already taken.
    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()>;

    /// Fetch the checkpoint with the greatest id for (thread, namespace)
    async fn get_latest_checkpoint(
        &self,
        thread_id: &str,
        namespace: &str,
    ) -> StoreResult<Option<Checkpoint>>;
}

/// Builder for creating checkpoint stores from configuration
pub struct CheckpointStoreBuilder {
    backend_type: String,
    config: HashMap<String, String>,
}

impl CheckpointStoreBuilder {
    /// Create a new builder
    pub fn new(backend_type: &str) -> Self {
        Self {
            backend_type: backend_type.to_string(),
            config: HashMap::new(),
        }
    }

    /// Create a builder from the `[checkpointing]` section
    pub fn from_config(config: &CheckpointingConfig) -> Self {
        let mut builder = Self::new(&config.backend)
            .with_option("database", &config.database)
            .with_option("collection", &config.collection);
        if let Some(base_path) = &config.base_path {
            builder = builder.with_base_path(base_path);
        }
        if let Some(connection_string) = &config.connection_string {
            builder = builder.with_option("connection_string", connection_string);
        }
        builder
    }

    /// Add a configuration option
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the base path (for file backend)
    pub fn with_base_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_option("base_path", &path.into().to_string_lossy())
    }

    fn required(&self, key: &str) -> StoreResult<&String> {
        self.config.get(key).ok_or_else(|| {
            StoreError::Configuration(format!(
                "{} is required for the {} backend",
                key, self.backend_type
            ))
        })
    }

    /// Build the checkpoint store
    pub async fn build(self) -> StoreResult<Arc<dyn CheckpointStore>> {
        match self.backend_type.as_str() {
            "memory" | "in-memory" => Ok(Arc::new(super::InMemoryCheckpointStore::new())),
            "file" | "filesystem" => {
                let base_path = self.required("base_path")?;
                let store = super::FileCheckpointStore::new(base_path)?;
                Ok(Arc::new(store))
            }
            #[cfg(feature = "storage-documentdb")]
            "documentdb" | "mongodb" => {
                let connection_string = self.required("connection_string")?;
                let database = self.required("database")?;
                let collection = self.required("collection")?;
                let store =
                    super::DocumentDbCheckpointStore::new(connection_string, database, collection)
                        .await?;
                store.ensure_indexes().await?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "storage-documentdb"))]
            "documentdb" | "mongodb" => Err(StoreError::Configuration(
                "the documentdb backend requires the storage-documentdb feature".into(),
            )),
            unknown => Err(StoreError::Configuration(format!(
                "Unknown backend type: {}",
                unknown
            ))),
        }
    }
}
