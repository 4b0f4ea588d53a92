//! Supervisor/worker orchestration.
//!
//! - [`routing`]: decision actions and the transitions they cause
//! - [`worker`]: the worker invocation frame (scoped input, bounded tool loop)
//! - [`tools`]: tool call coordination inside a frame
//! - [`runtime`]: the [`Orchestrator`] that drives the loop and checkpoints
//!   every completed step
//!
//! ```text
//!            +-------------+  delegate_to_architect  +---------------------+
//!  input --> | supervisor  | ----------------------> | technical_architect |
//!            |             | <---------------------- +---------------------+
//!            |             |  delegate_to_frontend   +---------------------+
//!            |             | ----------------------> | head_of_frontend    |
//!            |             | <---------------------- +---------------------+
//!            +-------------+
//!                  | respond_to_user
//!                  v
//!               __end__
//! ```

pub mod errors;
pub mod routing;
pub mod runtime;
pub mod tools;
pub mod worker;

pub use errors::{OrchestrationError, OrchestrationResult};
pub use routing::{apply_decision, RoutingAction, SUPERVISOR_AUTHOR};
pub use runtime::{Orchestrator, OrchestratorBuilder, RuntimeConfig, TurnOutcome};
pub use tools::{ToolCoordinator, ToolExecutionResult};
pub use worker::{WorkerFrame, WorkerOutcome, WorkerSpec};
