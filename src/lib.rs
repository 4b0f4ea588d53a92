//! Switchboard - supervisor/worker task delegation with durable checkpoints
//!
//! A supervisor model routes each conversation to one of two workers (a
//! planning *technical architect* and a code-writing *head of frontend*) or
//! answers the user directly. Workers may call tools before reporting back.
//! Every state transition is checkpointed per conversation thread, so a run
//! that fails part-way resumes from its last completed step.
//!
//! - **`config`** - TOML configuration and `.env` environment loading
//! - **`observability`** - `tracing` setup and the markdown transcript logger
//! - **`conversation`** - messages, conversation state, the message sanitizer
//! - **`checkpoint`** - checkpoint stores and the checkpoint engine
//! - **`provider`** - model provider traits (and an OpenAI-compatible client)
//! - **`tools`** - worker tools: file I/O and the project board
//! - **`orchestration`** - the routing state machine and worker frames
//! - **`server`** - the HTTP entry point
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! switchboard = { version = "0.3", features = ["storage-documentdb"] }
//! # Or enable everything:
//! switchboard = { version = "0.3", features = ["all"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use switchboard::prelude::*;
//!
//! async fn run(router: Arc<dyn RoutingModel>, provider: Arc<dyn LlmProvider>) -> anyhow::Result<()> {
//!     let config = Configuration::default();
//!     let store = CheckpointStoreBuilder::from_config(&config.checkpointing).build().await?;
//!
//!     let orchestrator = OrchestratorBuilder::new(store, router, provider)
//!         .with_config(config)
//!         .build()?;
//!
//!     let outcome = orchestrator
//!         .invoke("thread-1", vec![Message::user("list files in .")])
//!         .await?;
//!     println!("{:?}", outcome.state.messages.last());
//!     Ok(())
//! }
//! ```

/// Configuration management
pub mod config;

/// Observability utilities
pub mod observability;

/// Messages, conversation state and sanitization
pub mod conversation;

/// Durable checkpoints
pub mod checkpoint;

/// LLM provider abstraction
pub mod provider;

/// Worker tools
pub mod tools;

/// Supervisor/worker orchestration
pub mod orchestration;

/// HTTP entry point (enabled with the `server` feature)
#[cfg(feature = "server")]
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    pub use crate::observability::{init_tracing, Logger};

    pub use crate::conversation::{sanitize, ConversationState, Message, Node, Role};

    pub use crate::checkpoint::{
        CheckpointEngine, CheckpointError, CheckpointResult, CheckpointStore,
        CheckpointStoreBuilder, StateSnapshot,
    };

    pub use crate::provider::{
        GenerateConfig, GenerateResponse, LlmProvider, ProviderError, RoutingDecision,
        RoutingModel,
    };

    pub use crate::tools::{BoardStore, ToolRegistry, Workspace};

    pub use crate::orchestration::{
        OrchestrationError, Orchestrator, OrchestratorBuilder, TurnOutcome,
    };
}
