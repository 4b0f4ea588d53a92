//! Checkpoint identifier generation.
//!
//! Ids have the form `<13-digit zero-padded unix ms>-<8 hex chars>`. The
//! timestamp dominates lexicographic order; the random suffix only separates
//! ids minted by different generators in the same millisecond.

use std::sync::atomic::{AtomicU64, Ordering};

use super::errors::{CheckpointError, CheckpointResult};

const TIMESTAMP_WIDTH: usize = 13;
const SUFFIX_LEN: usize = 8;

/// Generates lexicographically ordered checkpoint ids.
///
/// The millisecond component strictly increases within one generator, even if
/// the wall clock stalls or goes backwards, so one process never mints two ids
/// that tie or sort out of order.
#[derive(Debug, Default)]
pub struct CheckpointIdGenerator {
    last_ms: AtomicU64,
}

impl CheckpointIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an id for the current wall-clock time
    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.next_id_at(now)
    }

    /// Mint an id for an explicit millisecond timestamp
    pub fn next_id_at(&self, now_ms: u64) -> String {
        let advance = |last: u64| Some(now_ms.max(last.saturating_add(1)));
        let previous = match self
            .last_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, advance)
        {
            Ok(previous) | Err(previous) => previous,
        };
        let ms = now_ms.max(previous.saturating_add(1));
        format!("{:0width$}-{}", ms, random_suffix(), width = TIMESTAMP_WIDTH)
    }

    /// Make later ids sort after `checkpoint_id`
    pub fn observe(&self, checkpoint_id: &str) {
        if let Some(ms) = timestamp_of(checkpoint_id) {
            self.last_ms.fetch_max(ms, Ordering::SeqCst);
        }
    }
}

fn random_suffix() -> String {
    let mut suffix = uuid::Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Millisecond component of a generated id
pub fn timestamp_of(checkpoint_id: &str) -> Option<u64> {
    let (ms, suffix) = checkpoint_id.split_once('-')?;
    if ms.len() != TIMESTAMP_WIDTH || suffix.is_empty() {
        return None;
    }
    ms.parse().ok()
}

/// Check a caller-supplied id.
///
/// Explicit ids are opaque but must be usable as a path component and a
/// document key.
pub fn validate_checkpoint_id(checkpoint_id: &str) -> CheckpointResult<()> {
    let invalid = checkpoint_id.is_empty()
        || checkpoint_id == "."
        || checkpoint_id == ".."
        || checkpoint_id.starts_with('.')
        || checkpoint_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control());

    if invalid {
        return Err(CheckpointError::InvalidCheckpointId {
            checkpoint_id: checkpoint_id.to_string(),
        });
    }
    Ok(())
}
