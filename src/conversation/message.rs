//! Conversation message types.

use serde::{Deserialize, Serialize};

/// Role of a message author.
///
/// Only `User`, `Assistant` and `System` are accepted by model calls; the other
/// roles are rewritten by the sanitizer before any history reaches a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// End user or supervisor directive
    #[serde(alias = "human")]
    User,
    /// Model-authored reply
    #[serde(alias = "ai")]
    Assistant,
    /// Instructions for the model
    System,
    /// Raw output of a tool call
    #[serde(alias = "tool")]
    ToolResult,
    /// Final output of a worker frame, folded back into the thread
    WorkerReport,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::ToolResult => "tool_result",
            Role::WorkerReport => "worker_report",
        }
    }

    /// Whether a model call accepts this role as-is
    pub fn is_model_facing(&self) -> bool {
        match self {
            Role::User | Role::Assistant | Role::System => true,
            Role::ToolResult | Role::WorkerReport => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool call requested by a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back on the result message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments as JSON (already parsed)
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Atomic unit of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author role; `type` is accepted on input for LangChain-style clients
    #[serde(alias = "type")]
    pub role: Role,
    /// Text content
    pub content: String,
    /// Optional author name (worker name, tool name, "Supervisor")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Id of the tool call this message answers (tool results only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by an assistant turn inside a worker frame
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Assistant turn that requests tool calls
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.tool_calls = calls;
        msg
    }

    /// Result of a tool call, named after the tool
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::ToolResult, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg.name = Some(tool_name.into());
        msg
    }

    /// Final report of a worker, tagged with the worker's name
    pub fn worker_report(worker: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_role(Role::WorkerReport, content).with_name(worker)
    }

    /// Set the author name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
