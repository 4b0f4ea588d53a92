//! Model provider abstraction.
//!
//! Two seams: [`LlmProvider`] for worker turns (text or tool calls) and
//! [`RoutingModel`] for the supervisor's structured decision. Both take an
//! already sanitized history.

use crate::conversation::{Message, ToolCall};
use crate::provider::types::generate::GenerateConfig;
use crate::provider::types::routing::RoutingDecision;

/// Result type for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error types for provider calls
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Request never got a response (network, DNS, TLS)
    #[error("Request failed: {0}")]
    Request(String),

    /// Endpoint answered with an error status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response arrived but could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider or request is misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Whether retrying the call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) | Self::Configuration(_) => false,
        }
    }
}

/// Response from a generation request
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateResponse {
    /// Text content response
    Content(String),
    /// Tool calls that need to be executed, with any text that came alongside
    ToolCalls { calls: Vec<ToolCall>, content: String },
}

/// Worker-side model call
///
/// # Example
///
/// ```ignore
/// async fn use_provider(provider: &dyn LlmProvider) -> ProviderResult<()> {
///     let messages = vec![Message::user("list files in .")];
///     match provider.generate(messages, &GenerateConfig::default()).await? {
///         GenerateResponse::Content(text) => println!("Response: {}", text),
///         GenerateResponse::ToolCalls { calls, .. } => println!("Tool calls: {:?}", calls),
///     }
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response
    ///
    /// # Arguments
    /// * `messages` - Sanitized conversation, system prompt first
    /// * `config` - Generation configuration (model, temperature, tools)
    async fn generate(
        &self,
        messages: Vec<Message>,
        config: &GenerateConfig,
    ) -> ProviderResult<GenerateResponse>;

    /// Provider identifier for logging (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Model used when the config does not name one
    fn default_model(&self) -> String;
}

/// Supervisor-side decision call
#[async_trait::async_trait]
pub trait RoutingModel: Send + Sync {
    /// Classify the conversation into a routing decision
    async fn decide(&self, messages: Vec<Message>) -> ProviderResult<RoutingDecision>;

    /// Model identifier for logging
    fn model_name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Request("timeout".into()).is_transient());
        assert!(ProviderError::Api { status: 503, message: "busy".into() }.is_transient());
        assert!(ProviderError::Api { status: 429, message: "slow down".into() }.is_transient());
        assert!(!ProviderError::Api { status: 401, message: "no key".into() }.is_transient());
        assert!(!ProviderError::InvalidResponse("garbage".into()).is_transient());
    }
}
