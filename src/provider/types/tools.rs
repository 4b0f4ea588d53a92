//! Provider-agnostic tool definitions.

use serde::{Deserialize, Serialize};

use crate::provider::traits::{ProviderError, ProviderResult};

/// Tool definition handed to a model: name, description and JSON Schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (function name)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Validate that the parameters is a JSON Schema object
    pub fn validate(&self) -> ProviderResult<()> {
        let obj = self.parameters.as_object().ok_or_else(|| {
            ProviderError::Configuration(format!(
                "Tool {} parameters must be a JSON object (schema)",
                self.name
            ))
        })?;

        if !obj.contains_key("type") {
            return Err(ProviderError::Configuration(format!(
                "Tool {} parameters schema must have 'type' field",
                self.name
            )));
        }

        Ok(())
    }
}

/// Tool choice option for controlling LLM tool usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the LLM decide whether to use tools
    #[default]
    Auto,
    /// Force the LLM to use a tool
    Required,
    /// Prevent the LLM from using tools
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Auto => "auto",
            Self::Required => "required",
            Self::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_validation() {
        let tool = ToolDefinition::new(
            "list_files",
            "List a directory",
            serde_json::json!({
                "type": "object",
                "properties": { "path": { "type": "string" } },
                "required": ["path"]
            }),
        );
        assert!(tool.validate().is_ok());

        let tool = ToolDefinition::new("bad", "not an object", serde_json::json!("string"));
        assert!(tool.validate().is_err());
    }

    #[test]
    fn test_tool_choice_default() {
        assert_eq!(ToolChoice::default().as_str(), "auto");
    }
}
