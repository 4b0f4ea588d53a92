//! Worker tools.
//!
//! Every tool reports failure as text in a [`ToolOutput`]; nothing a tool does
//! surfaces as an `Err` to the worker frame. The registry adds the same
//! guarantee for unknown tools, disallowed tools and malformed arguments.

pub mod board;
pub mod files;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::conversation::ToolCall;
use crate::provider::ToolDefinition;

pub use board::{BoardStore, FileBoardStore, InMemoryBoardStore, ProjectBoard, UpdateBoard};
pub use files::{ListFiles, ReadFile, Workspace, WriteFile};

/// Text returned by a tool, flagged when it describes a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// A tool a worker may call
#[async_trait]
pub trait WorkerTool: Send + Sync {
    /// Definition advertised to the model
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. Failures are returned as text, never raised.
    async fn call(&self, arguments: serde_json::Value) -> ToolOutput;
}

/// Decode tool arguments or describe why they are unusable
pub fn parse_arguments<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolOutput> {
    serde_json::from_value(arguments).map_err(|e| {
        ToolOutput::error(format!("Error: invalid arguments for {}: {}", tool_name, e))
    })
}

/// Named collection of tools shared by all workers
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn WorkerTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The file and board tools every deployment ships with
    pub fn standard(
        workspace: Workspace,
        max_read_chars: usize,
        boards: Arc<dyn BoardStore>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ListFiles::new(workspace.clone())));
        registry.register(Arc::new(
            ReadFile::new(workspace.clone()).with_max_chars(max_read_chars),
        ));
        registry.register(Arc::new(WriteFile::new(workspace)));
        registry.register(Arc::new(UpdateBoard::new(boards)));
        registry
    }

    /// Register a tool under its definition name, replacing any previous one
    pub fn register(&mut self, tool: Arc<dyn WorkerTool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Definitions of the allowed tools that are registered, in allow-list order
    pub fn definitions_for(&self, allowed: &[String]) -> Vec<ToolDefinition> {
        allowed
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Run a requested call if the worker may use that tool
    pub async fn execute(&self, call: &ToolCall, allowed: &[String]) -> ToolOutput {
        if !allowed.iter().any(|name| name == &call.name) {
            return ToolOutput::error(format!(
                "Error: tool {} is not available to this worker",
                call.name
            ));
        }

        match self.tools.get(&call.name) {
            Some(tool) => tool.call(call.arguments.clone()).await,
            None => ToolOutput::error(format!("Error: unknown tool {}", call.name)),
        }
    }
}
