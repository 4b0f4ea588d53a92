//! Error types for a state-machine run.

use crate::checkpoint::CheckpointError;
use crate::provider::ProviderError;

/// Failure of one `invoke` call.
///
/// No variant leaves a partial checkpoint behind: whatever was persisted before
/// the failing step is still the latest state for the thread.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// Loading or persisting a checkpoint failed
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// The decision call or a worker model call failed
    #[error("Model call failed: {0}")]
    Model(#[from] ProviderError),

    /// A model or tool call exceeded `execution.timeout_seconds`
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// The decision call produced an action outside the known set
    #[error("Unrecognized routing action: {action}")]
    UnrecognizedAction { action: String },

    /// Too many supervisor/worker hops in one request
    #[error("Step limit of {limit} reached on thread {thread_id}")]
    StepLimit { limit: u32, thread_id: String },

    /// The request itself cannot be served
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The orchestrator cannot be assembled from the given configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for orchestration
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

impl OrchestrationError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Whether the caller may retry the same request
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Checkpoint(e) => e.is_transient(),
            Self::Model(e) => e.is_transient(),
            Self::Timeout { .. } => true,
            Self::UnrecognizedAction { .. }
            | Self::StepLimit { .. }
            | Self::InvalidRequest(_)
            | Self::Config(_) => false,
        }
    }

    /// Whether stored data could not be decoded
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Checkpoint(e) if e.is_corruption())
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        if self.is_transient() {
            return "unavailable";
        }
        if self.is_corruption() {
            return "corrupted_data";
        }
        match self {
            Self::Checkpoint(CheckpointError::InvalidThreadId { .. })
            | Self::Checkpoint(CheckpointError::InvalidCheckpointId { .. })
            | Self::InvalidRequest(_) => "invalid_request",
            Self::Checkpoint(_) | Self::Config(_) => "internal",
            Self::Model(_) => "model_error",
            Self::UnrecognizedAction { .. } => "unrecognized_action",
            Self::StepLimit { .. } => "step_limit",
            Self::Timeout { .. } => "unavailable",
        }
    }
}
