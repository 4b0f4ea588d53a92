//! Tool invocation coordination inside a worker frame

use std::time::Duration;

use super::errors::{OrchestrationError, OrchestrationResult};
use crate::conversation::ToolCall;
use crate::tools::ToolRegistry;

/// Tool execution result
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    /// Unique ID for this tool call
    pub tool_call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Tool output content
    pub content: String,
    /// Whether tool execution succeeded
    pub success: bool,
}

/// Tool coordinator
///
/// Runs the calls of one worker frame against the shared registry, enforcing
/// the worker's allow-list and the per-call timeout, and keeps the history.
pub struct ToolCoordinator<'a> {
    registry: &'a ToolRegistry,
    allowed: &'a [String],
    timeout: Duration,
    execution_history: Vec<ToolExecutionResult>,
}

impl<'a> ToolCoordinator<'a> {
    /// Create a new tool coordinator
    pub fn new(registry: &'a ToolRegistry, allowed: &'a [String], timeout: Duration) -> Self {
        Self {
            registry,
            allowed,
            timeout,
            execution_history: Vec::new(),
        }
    }

    /// Execute one call.
    ///
    /// Tool failures come back as an unsuccessful result; only a timeout is an
    /// `Err`, since it fails the whole turn.
    pub async fn execute(&mut self, call: &ToolCall) -> OrchestrationResult<ToolExecutionResult> {
        let output = tokio::time::timeout(self.timeout, self.registry.execute(call, self.allowed))
            .await
            .map_err(|_| {
                OrchestrationError::timeout(format!("tool {}", call.name), self.timeout.as_secs())
            })?;

        let result = ToolExecutionResult {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content: output.content,
            success: !output.is_error,
        };
        self.execution_history.push(result.clone());
        Ok(result)
    }

    /// Get total number of tool invocations
    pub fn invocation_count(&self) -> usize {
        self.execution_history.len()
    }

    /// Get execution history
    pub fn execution_history(&self) -> &[ToolExecutionResult] {
        &self.execution_history
    }

    /// Get failed executions
    pub fn failed_executions(&self) -> Vec<&ToolExecutionResult> {
        self.execution_history
            .iter()
            .filter(|r| !r.success)
            .collect()
    }

    /// Consume the coordinator, keeping the history
    pub fn into_history(self) -> Vec<ToolExecutionResult> {
        self.execution_history
    }
}
