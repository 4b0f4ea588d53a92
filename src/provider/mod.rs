//! Model provider abstraction module
//!
//! Provider traits used by the supervisor and the worker frames, the request
//! types they share, and (feature `provider-openai`) an OpenAI-compatible
//! implementation.

pub mod traits;
pub mod types;

#[cfg(feature = "provider-openai")]
pub mod openai;

pub use traits::{GenerateResponse, LlmProvider, ProviderError, ProviderResult, RoutingModel};
pub use types::{GenerateConfig, RoutingDecision, ToolChoice, ToolDefinition};

#[cfg(feature = "provider-openai")]
pub use openai::OpenAiCompatibleProvider;
