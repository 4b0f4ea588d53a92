//! Structured output of the supervisor's decision call.

use serde::{Deserialize, Serialize};

/// Decision returned by the routing model.
///
/// `action` is kept as the raw string the model produced; the state machine
/// parses it and rejects anything outside the known set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Brief thought process
    #[serde(default)]
    pub reasoning: String,
    pub action: String,
    /// Reply text when responding, instruction text when delegating
    #[serde(default)]
    pub response_content: String,
}

impl RoutingDecision {
    pub fn new(
        action: impl Into<String>,
        response_content: impl Into<String>,
    ) -> Self {
        Self {
            reasoning: String::new(),
            action: action.into(),
            response_content: response_content.into(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// JSON Schema for structured-output requests
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Brief thought process."
                },
                "action": {
                    "type": "string",
                    "enum": ["delegate_to_architect", "delegate_to_frontend", "respond_to_user"],
                    "description": "delegate_to_architect for planning, delegate_to_frontend for coding, respond_to_user to ask questions or present results."
                },
                "response_content": {
                    "type": "string",
                    "description": "The reply when responding, or the instruction for the agent when delegating."
                }
            },
            "required": ["reasoning", "action", "response_content"],
            "additionalProperties": false
        })
    }
}
