//! Provider module types

pub mod generate;
pub mod routing;
pub mod tools;

pub use generate::GenerateConfig;
pub use routing::RoutingDecision;
pub use tools::{ToolChoice, ToolDefinition};
