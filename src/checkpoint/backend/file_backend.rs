//! File System Checkpoint Store
//!
//! One JSON record per checkpoint:
//!
//! ```text
//! <base>/t=<enc(thread_id)>/ns=<enc(namespace)>/<checkpoint_id>.json
//! ```
//!
//! Thread ids and namespaces are percent-encoded, so no two threads can map to
//! the same directory and no id can escape the base path.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::traits::{CheckpointStore, StoreError, StoreResult};
use crate::checkpoint::models::Checkpoint;

const RECORD_EXTENSION: &str = ".json";

/// File system checkpoint store
pub struct FileCheckpointStore {
    base_path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a new file checkpoint store
    ///
    /// # Arguments
    /// * `base_path` - Base directory for all checkpoint records
    pub fn new<P: AsRef<Path>>(base_path: P) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        // Create base directory if it doesn't exist (synchronously for constructor)
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding every record of (thread, namespace)
    fn thread_dir(&self, thread_id: &str, namespace: &str) -> PathBuf {
        self.base_path
            .join(format!("t={}", urlencoding::encode(thread_id)))
            .join(format!("ns={}", urlencoding::encode(namespace)))
    }

    fn record_file_name(checkpoint_id: &str) -> StoreResult<String> {
        if checkpoint_id.is_empty()
            || checkpoint_id.starts_with('.')
            || checkpoint_id.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidKey(checkpoint_id.to_string()));
        }
        Ok(format!("{}{}", checkpoint_id, RECORD_EXTENSION))
    }

    async fn write_temp(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }

    async fn read_record(path: &Path) -> StoreResult<Checkpoint> {
        let data = fs::read(path).await?;
        serde_json::from_slice(&data).map_err(|e| {
            StoreError::Deserialization(format!("{}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    fn backend_type(&self) -> &'static str {
        "file"
    }

    async fn is_available(&self) -> bool {
        fs::metadata(&self.base_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        let file_name = Self::record_file_name(&checkpoint.checkpoint_id)?;
        let dir = self.thread_dir(&checkpoint.thread_id, &checkpoint.namespace);
        fs::create_dir_all(&dir).await?;

        let mut record = checkpoint.clone();
        record.created_at = Some(Utc::now());
        let data = serde_json::to_vec_pretty(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write the full record under a hidden temp name first
        let final_path = dir.join(&file_name);
        let temp_path = dir.join(format!(".{}.tmp.{}", file_name, uuid::Uuid::new_v4()));

        // hard_link refuses to replace an existing record; the temp file goes
        // away whether staging or linking failed
        let linked = match Self::write_temp(&temp_path, &data).await {
            Ok(()) => fs::hard_link(&temp_path, &final_path).await,
            Err(e) => Err(e),
        };
        let _ = fs::remove_file(&temp_path).await;

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::Conflict(checkpoint.document_key()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(StoreError::PermissionDenied(final_path.display().to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn get_latest_checkpoint(
        &self,
        thread_id: &str,
        namespace: &str,
    ) -> StoreResult<Option<Checkpoint>> {
        let dir = self.thread_dir(thread_id, namespace);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<String> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !name.ends_with(RECORD_EXTENSION) {
                continue;
            }
            let id = name.trim_end_matches(RECORD_EXTENSION).to_string();
            if latest.as_ref().map_or(true, |current| id > *current) {
                latest = Some(id);
            }
        }

        let Some(checkpoint_id) = latest else {
            return Ok(None);
        };

        let path = dir.join(Self::record_file_name(&checkpoint_id)?);
        let record = Self::read_record(&path).await?;

        if record.thread_id != thread_id
            || record.namespace != namespace
            || record.checkpoint_id != checkpoint_id
        {
            return Err(StoreError::Deserialization(format!(
                "{}: record does not match its location",
                path.display()
            )));
        }

        Ok(Some(record))
    }
}
