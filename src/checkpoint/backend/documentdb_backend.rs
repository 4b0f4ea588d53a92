//! DocumentDB/MongoDB Checkpoint Store
//!
//! Record layout, one document per checkpoint:
//!
//! ```text
//! { _id: "<thread_id>_<checkpoint_id>", thread_id, namespace, checkpoint_id,
//!   state_blob: Binary, metadata_blob: Binary, created_at: Date (server) }
//! ```
//!
//! ## Usage
//!
//! Enable the `storage-documentdb` feature in Cargo.toml:
//!
//! ```toml
//! switchboard = { version = "0.3", features = ["storage-documentdb"] }
//! ```
//!
//! ```rust,no_run
//! use switchboard::checkpoint::backend::DocumentDbCheckpointStore;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = DocumentDbCheckpointStore::new(
//!         "mongodb://localhost:27017",
//!         "switchboard",
//!         "checkpoints"
//!     ).await?;
//!     store.ensure_indexes().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use mongodb::{
    bson::{doc, spec::BinarySubtype, Binary, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, FindOneOptions, IndexOptions},
    Client, Collection, IndexModel,
};

use super::traits::{CheckpointStore, StoreError, StoreResult};
use crate::checkpoint::models::Checkpoint;

const DUPLICATE_KEY: i32 = 11000;

/// DocumentDB/MongoDB checkpoint store
pub struct DocumentDbCheckpointStore {
    client: Client,
    collection: Collection<Document>,
    database_name: String,
}

impl DocumentDbCheckpointStore {
    /// Create a new DocumentDB checkpoint store
    ///
    /// # Arguments
    /// * `connection_string` - MongoDB/DocumentDB connection string
    /// * `database` - Database name
    /// * `collection` - Collection name
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

        let coll = client.database(database).collection::<Document>(collection);

        Ok(Self {
            client,
            collection: coll,
            database_name: database.to_string(),
        })
    }

    /// Get the MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Create the index backing the latest-checkpoint query
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "thread_id": 1, "namespace": 1, "checkpoint_id": -1 })
            .options(
                IndexOptions::builder()
                    .name("thread_latest".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    fn decode(doc: &Document) -> StoreResult<Checkpoint> {
        let text = |field: &str| -> StoreResult<String> {
            doc.get_str(field).map(str::to_string).map_err(|e| {
                StoreError::Deserialization(format!("field {}: {}", field, e))
            })
        };
        let bytes = |field: &str| -> StoreResult<Vec<u8>> {
            match doc.get(field) {
                Some(Bson::Binary(bin)) => Ok(bin.bytes.clone()),
                Some(Bson::String(s)) => Ok(s.clone().into_bytes()),
                None if field == "metadata_blob" => Ok(Vec::new()),
                _ => Err(StoreError::Deserialization(format!(
                    "field {} is missing or not binary",
                    field
                ))),
            }
        };

        let created_at = match doc.get("created_at") {
            Some(Bson::DateTime(dt)) => {
                chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
            }
            _ => None,
        };

        Ok(Checkpoint {
            thread_id: text("thread_id")?,
            namespace: doc.get_str("namespace").unwrap_or_default().to_string(),
            checkpoint_id: text("checkpoint_id")?,
            state_blob: bytes("state_blob")?,
            metadata_blob: bytes("metadata_blob")?,
            created_at,
        })
    }
}

fn binary(bytes: &[u8]) -> Binary {
    Binary {
        subtype: BinarySubtype::Generic,
        bytes: bytes.to_vec(),
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_mongo_error(err: mongodb::error::Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            StoreError::Connection(err.to_string())
        }
        ErrorKind::Authentication { .. } => StoreError::PermissionDenied(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl CheckpointStore for DocumentDbCheckpointStore {
    fn backend_type(&self) -> &'static str {
        "documentdb"
    }

    async fn is_available(&self) -> bool {
        self.client
            .database(&self.database_name)
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }

    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        let key = checkpoint.document_key();

        // Insert-only: an existing document never matches the filter, so the
        // upsert collides on _id instead of overwriting
        let filter = doc! { "_id": &key, "created_at": { "$exists": false } };
        let update = doc! {
            "$setOnInsert": {
                "thread_id": &checkpoint.thread_id,
                "namespace": &checkpoint.namespace,
                "checkpoint_id": &checkpoint.checkpoint_id,
                "state_blob": binary(&checkpoint.state_blob),
                "metadata_blob": binary(&checkpoint.metadata_blob),
            },
            "$currentDate": { "created_at": true },
        };

        match self.collection.update_one(filter, update).upsert(true).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Conflict(key)),
            Err(e) => Err(map_mongo_error(e)),
        }
    }

    async fn get_latest_checkpoint(
        &self,
        thread_id: &str,
        namespace: &str,
    ) -> StoreResult<Option<Checkpoint>> {
        let filter = doc! { "thread_id": thread_id, "namespace": namespace };
        let options = FindOneOptions::builder()
            .sort(doc! { "checkpoint_id": -1 })
            .build();

        let found = self
            .collection
            .find_one(filter)
            .with_options(options)
            .await
            .map_err(map_mongo_error)?;

        found.as_ref().map(Self::decode).transpose()
    }
}
