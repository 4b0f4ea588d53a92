//! Project board documents and the `update_board` tool.
//!
//! One board per thread, keyed by thread id and overwritten on every update.
//! Boards live next to the checkpoints (same backend kind) but in their own
//! collection or directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{parse_arguments, ToolOutput, WorkerTool};
use crate::checkpoint::backend::{StoreError, StoreResult};
use crate::config::CheckpointingConfig;
use crate::provider::ToolDefinition;

/// Status document for one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBoard {
    pub thread_id: String,
    pub phase: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Storage for project boards
#[async_trait]
pub trait BoardStore: Send + Sync {
    fn backend_type(&self) -> &'static str;

    /// Insert or replace the board for `board.thread_id`
    async fn upsert_board(&self, board: &ProjectBoard) -> StoreResult<()>;

    async fn get_board(&self, thread_id: &str) -> StoreResult<Option<ProjectBoard>>;
}

/// Build the board store matching the `[checkpointing]` backend
pub async fn board_store_from_config(
    config: &CheckpointingConfig,
) -> StoreResult<Arc<dyn BoardStore>> {
    match config.backend.as_str() {
        "memory" | "in-memory" => Ok(Arc::new(InMemoryBoardStore::new())),
        "file" | "filesystem" => {
            let base_path = config.base_path.as_ref().ok_or_else(|| {
                StoreError::Configuration("base_path is required for the file backend".into())
            })?;
            Ok(Arc::new(FileBoardStore::new(Path::new(base_path).join("boards"))?))
        }
        #[cfg(feature = "storage-documentdb")]
        "documentdb" | "mongodb" => {
            let connection_string = config.connection_string.as_ref().ok_or_else(|| {
                StoreError::Configuration(
                    "connection_string is required for the documentdb backend".into(),
                )
            })?;
            let store = documentdb::DocumentDbBoardStore::new(
                connection_string,
                &config.database,
                &config.board_collection,
            )
            .await?;
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

/// Board store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardStore {
    boards: Arc<RwLock<HashMap<String, ProjectBoard>>>,
}

impl InMemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardStore for InMemoryBoardStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn upsert_board(&self, board: &ProjectBoard) -> StoreResult<()> {
        let mut boards = self.boards.write().unwrap_or_else(|e| e.into_inner());
        boards.insert(board.thread_id.clone(), board.clone());
        Ok(())
    }

    async fn get_board(&self, thread_id: &str) -> StoreResult<Option<ProjectBoard>> {
        let boards = self.boards.read().unwrap_or_else(|e| e.into_inner());
        Ok(boards.get(thread_id).cloned())
    }
}

/// Board store writing one JSON file per thread
pub struct FileBoardStore {
    base_path: PathBuf,
}

impl FileBoardStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn board_path(&self, thread_id: &str) -> PathBuf {
        self.base_path
            .join(format!("t={}.json", urlencoding::encode(thread_id)))
    }
}

#[async_trait]
impl BoardStore for FileBoardStore {
    fn backend_type(&self) -> &'static str {
        "file"
    }

    async fn upsert_board(&self, board: &ProjectBoard) -> StoreResult<()> {
        let path = self.board_path(&board.thread_id);
        let data = serde_json::to_vec_pretty(board)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Replace atomically using temp file + rename
        let temp_path = self
            .base_path
            .join(format!(".board.tmp.{}", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn get_board(&self, thread_id: &str) -> StoreResult<Option<ProjectBoard>> {
        let path = self.board_path(thread_id);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| StoreError::Deserialization(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(feature = "storage-documentdb")]
mod documentdb {
    use super::*;
    use mongodb::{
        bson::{self, doc, Document},
        options::ClientOptions,
        Client, Collection,
    };

    /// Board store using one document per thread (`_id = thread_id`)
    pub struct DocumentDbBoardStore {
        collection: Collection<Document>,
    }

    impl DocumentDbBoardStore {
        pub async fn new(
            connection_string: &str,
            database: &str,
            collection: &str,
        ) -> StoreResult<Self> {
            let client_options = ClientOptions::parse(connection_string)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            let client = Client::with_options(client_options)
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            Ok(Self {
                collection: client.database(database).collection(collection),
            })
        }
    }

    #[async_trait]
    impl BoardStore for DocumentDbBoardStore {
        fn backend_type(&self) -> &'static str {
            "documentdb"
        }

        async fn upsert_board(&self, board: &ProjectBoard) -> StoreResult<()> {
            let mut document = bson::to_document(board)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            document.insert("_id", board.thread_id.as_str());

            self.collection
                .replace_one(doc! { "_id": &board.thread_id }, document)
                .upsert(true)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            Ok(())
        }

        async fn get_board(&self, thread_id: &str) -> StoreResult<Option<ProjectBoard>> {
            let found = self
                .collection
                .find_one(doc! { "_id": thread_id })
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            found
                .map(|mut document| {
                    document.remove("_id");
                    bson::from_document(document)
                        .map_err(|e| StoreError::Deserialization(e.to_string()))
                })
                .transpose()
        }
    }
}

#[cfg(feature = "storage-documentdb")]
pub use documentdb::DocumentDbBoardStore;

#[derive(Debug, Deserialize)]
struct UpdateBoardArgs {
    thread_id: String,
    phase: String,
    #[serde(default)]
    tasks: Vec<String>,
    status: String,
}

/// `update_board(thread_id, phase, tasks, status)`
pub struct UpdateBoard {
    boards: Arc<dyn BoardStore>,
}

impl UpdateBoard {
    pub fn new(boards: Arc<dyn BoardStore>) -> Self {
        Self { boards }
    }
}

#[async_trait]
impl WorkerTool for UpdateBoard {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_board",
            "Update the project board for a conversation thread.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "thread_id": { "type": "string", "description": "Conversation thread id" },
                    "phase": { "type": "string", "description": "Project phase, e.g. Planning" },
                    "tasks": { "type": "array", "items": { "type": "string" } },
                    "status": { "type": "string", "description": "One-line current status" }
                },
                "required": ["thread_id", "phase", "tasks", "status"]
            }),
        )
    }

    async fn call(&self, arguments: serde_json::Value) -> ToolOutput {
        let args: UpdateBoardArgs = match parse_arguments("update_board", arguments) {
            Ok(args) => args,
            Err(output) => return output,
        };
        if args.thread_id.trim().is_empty() {
            return ToolOutput::error("Error: thread_id must not be empty");
        }

        let board = ProjectBoard {
            thread_id: args.thread_id,
            phase: args.phase,
            tasks: args.tasks,
            status: args.status,
            updated_at: Utc::now(),
        };

        match self.boards.upsert_board(&board).await {
            Ok(()) => ToolOutput::success(format!(
                "Board updated for thread {}: phase {}, {} tasks, status: {}",
                board.thread_id,
                board.phase,
                board.tasks.len(),
                board.status
            )),
            Err(e) => ToolOutput::error(format!("Error updating board: {}", e)),
        }
    }
}
