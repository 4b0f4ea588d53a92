//! Conversation state carried inside every checkpoint.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::message::Message;

/// Node of the routing state machine.
///
/// The serialized names are what ends up in stored checkpoints; any other value
/// in the `next` field fails to deserialize and is treated as corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    /// Routing decision point (initial node)
    #[serde(rename = "supervisor")]
    Supervisor,
    /// Planning worker
    #[serde(rename = "technical_architect")]
    Architect,
    /// Code-writing worker
    #[serde(rename = "head_of_frontend")]
    Frontend,
    /// Terminal marker
    #[serde(rename = "__end__")]
    Halted,
}

impl Node {
    /// Every declared node
    pub const ALL: [Node; 4] = [Node::Supervisor, Node::Architect, Node::Frontend, Node::Halted];

    /// Stored name of the node
    pub fn as_str(&self) -> &'static str {
        match self {
            Node::Supervisor => "supervisor",
            Node::Architect => "technical_architect",
            Node::Frontend => "head_of_frontend",
            Node::Halted => "__end__",
        }
    }

    /// Whether the node runs a worker frame
    pub fn is_worker(&self) -> bool {
        matches!(self, Node::Architect | Node::Frontend)
    }

    /// Whether the node ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Halted)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Node {
    type Err = UnknownNode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Node::ALL
            .into_iter()
            .find(|node| node.as_str() == s)
            .ok_or_else(|| UnknownNode(s.to_string()))
    }
}

/// A node name outside the declared set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown state machine node: {0}")]
pub struct UnknownNode(pub String);

/// Message history plus the next node to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub next: Node,
}

impl ConversationState {
    /// Empty state for a thread with no checkpoints
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next: Node::Supervisor,
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether the state machine has reached the terminal node
    pub fn is_halted(&self) -> bool {
        self.next.is_terminal()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
