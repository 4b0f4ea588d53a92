//! Conversation model shared by the checkpoint engine and the state machine.
//!
//! - [`Message`] and the closed [`Role`] set
//! - [`ConversationState`]: the blob stored inside every checkpoint
//! - [`sanitizer`]: role normalisation applied before model calls

pub mod message;
pub mod sanitizer;
pub mod state;

pub use message::{Message, Role, ToolCall};
pub use sanitizer::{is_sanitized, sanitize, sanitize_message};
pub use state::{ConversationState, Node, UnknownNode};
