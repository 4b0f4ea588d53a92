//! Error types for the checkpoint system

use thiserror::Error;

use super::backend::StoreError;

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Error kinds surfaced by the checkpoint engine.
///
/// Store unavailability and corrupted records are kept apart so callers can
/// retry the former and must stop on the latter.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Corrupted checkpoint data for thread {thread_id}: {message}")]
    CorruptedData { thread_id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid checkpoint ID format: {checkpoint_id:?}")]
    InvalidCheckpointId { checkpoint_id: String },

    #[error("Invalid thread ID: {thread_id:?}")]
    InvalidThreadId { thread_id: String },

    #[error("Checkpoint already exists: {key}")]
    Conflict { key: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },
}

impl CheckpointError {
    /// Create an unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a corrupted data error
    pub fn corrupted<T: Into<String>, S: Into<String>>(thread_id: T, message: S) -> Self {
        Self::CorruptedData {
            thread_id: thread_id.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported<S: Into<String>>(operation: S) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Classify a store failure for the given thread
    pub fn from_store(err: StoreError, thread_id: &str) -> Self {
        match err {
            StoreError::Deserialization(message) => Self::corrupted(thread_id, message),
            StoreError::Configuration(message) => Self::config(message),
            StoreError::Conflict(key) => Self::Conflict { key },
            StoreError::InvalidKey(key) => Self::InvalidCheckpointId { checkpoint_id: key },
            other => Self::unavailable(other.to_string()),
        }
    }

    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Conflict { .. })
    }

    /// Whether stored data for the thread can no longer be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptedData { .. })
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Unavailable { .. } => {
                "Conversation storage is temporarily unavailable. Please retry.".to_string()
            }
            Self::CorruptedData { thread_id, .. } => format!(
                "Stored state for conversation '{}' is corrupted and cannot be resumed.",
                thread_id
            ),
            Self::Conflict { .. } => {
                "Another request updated this conversation at the same time. Please retry."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}
