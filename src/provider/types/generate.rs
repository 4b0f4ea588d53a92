//! Configuration for LLM generation requests.

use crate::provider::traits::{ProviderError, ProviderResult};
use crate::provider::types::tools::{ToolChoice, ToolDefinition};
use serde::{Deserialize, Serialize};

/// Configuration for a generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Model to use (None = use provider default)
    pub model: Option<String>,
    /// Temperature for sampling (0.0 = deterministic, 2.0 = very random)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools available for the LLM to call
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool choice strategy
    pub tool_choice: Option<ToolChoice>,
}

impl GenerateConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: Some(4000),
            tools: None,
            tool_choice: None,
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set tools; an empty list clears them
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ProviderResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ProviderError::Configuration(
                "Temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(ProviderError::Configuration(
                "Max tokens must be greater than 0".to_string(),
            ));
        }

        if let Some(ref tools) = self.tools {
            for tool in tools {
                tool.validate()?;
            }
        }

        Ok(())
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self::new()
    }
}
