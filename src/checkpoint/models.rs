//! Data models for the checkpoint system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationState;

/// Immutable snapshot of one thread at one step of the state machine.
///
/// Blobs are opaque to the store. The engine writes JSON into both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    #[serde(default)]
    pub namespace: String,
    pub checkpoint_id: String,
    #[serde(with = "text_blob")]
    pub state_blob: Vec<u8>,
    #[serde(with = "text_blob", default)]
    pub metadata_blob: Vec<u8>,
    /// Assigned by the store on write; ignored on input
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Document key used by the stores: `thread_id + "_" + checkpoint_id`
    pub fn document_key(&self) -> String {
        document_key(&self.thread_id, &self.checkpoint_id)
    }
}

/// Build the store key for a checkpoint
pub fn document_key(thread_id: &str, checkpoint_id: &str) -> String {
    format!("{}_{}", thread_id, checkpoint_id)
}

/// What produced a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// New caller input was appended
    Input,
    /// A supervisor or worker step completed
    Loop,
}

/// Metadata stored next to every checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Step counter within the request; input checkpoints use 0
    pub step: u32,
    /// Node that produced the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CheckpointMetadata {
    pub fn input() -> Self {
        Self {
            source: CheckpointSource::Input,
            step: 0,
            writer: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn step(step: u32, writer: impl Into<String>) -> Self {
        Self {
            source: CheckpointSource::Loop,
            step,
            writer: Some(writer.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Decoded checkpoint handed back to the state machine
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub thread_id: String,
    pub namespace: String,
    pub checkpoint_id: String,
    pub state: ConversationState,
    /// Free-form metadata; `Null` when none was stored
    pub metadata: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

/// Serializes blobs as UTF-8 text so stored JSON records stay readable.
mod text_blob {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(bytes).map_err(S::Error::custom)?;
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer).map_err(D::Error::custom)?;
        Ok(text.into_bytes())
    }
}
