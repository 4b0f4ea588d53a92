//! Supervisor routing: decision actions and the state transitions they cause.

use std::str::FromStr;

use super::errors::{OrchestrationError, OrchestrationResult};
use crate::conversation::{ConversationState, Message, Node};
use crate::provider::RoutingDecision;

/// Author name on directives the supervisor hands to a worker
pub const SUPERVISOR_AUTHOR: &str = "Supervisor";

/// Action chosen by the decision call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingAction {
    /// Hand the payload to the planning worker
    DelegateToArchitect,
    /// Hand the payload to the code-writing worker
    DelegateToFrontend,
    /// Reply to the user and halt
    RespondToUser,
}

impl RoutingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DelegateToArchitect => "delegate_to_architect",
            Self::DelegateToFrontend => "delegate_to_frontend",
            Self::RespondToUser => "respond_to_user",
        }
    }

    /// Node the state machine moves to after this action
    pub fn target(&self) -> Node {
        match self {
            Self::DelegateToArchitect => Node::Architect,
            Self::DelegateToFrontend => Node::Frontend,
            Self::RespondToUser => Node::Halted,
        }
    }
}

impl std::fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoutingAction {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "delegate_to_architect" | "delegate_a" => Ok(Self::DelegateToArchitect),
            "delegate_to_frontend" | "delegate_b" => Ok(Self::DelegateToFrontend),
            "respond_to_user" | "respond" => Ok(Self::RespondToUser),
            other => Err(OrchestrationError::UnrecognizedAction {
                action: other.to_string(),
            }),
        }
    }
}

/// Apply a decision to `state`.
///
/// Delegation appends a user-authored directive named [`SUPERVISOR_AUTHOR`]
/// (with the thread id appended when `annotate_thread_id` is set) and points
/// `next` at the worker. Responding appends an assistant message and halts.
/// An unrecognized action leaves `state` untouched.
pub fn apply_decision(
    state: &mut ConversationState,
    decision: &RoutingDecision,
    thread_id: &str,
    annotate_thread_id: bool,
) -> OrchestrationResult<RoutingAction> {
    let action: RoutingAction = decision.action.parse()?;

    match action {
        RoutingAction::DelegateToArchitect | RoutingAction::DelegateToFrontend => {
            let content = if annotate_thread_id {
                format!("{}\n\n(thread_id: {})", decision.response_content, thread_id)
            } else {
                decision.response_content.clone()
            };
            state.push(Message::user(content).with_name(SUPERVISOR_AUTHOR));
        }
        RoutingAction::RespondToUser => {
            state.push(Message::assistant(decision.response_content.clone()));
        }
    }

    state.next = action.target();
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    fn state_with_request() -> ConversationState {
        let mut state = ConversationState::new();
        state.push(Message::user("Build me a landing page"));
        state
    }

    #[test]
    fn test_action_aliases() {
        assert_eq!(
            "delegate_a".parse::<RoutingAction>().unwrap(),
            RoutingAction::DelegateToArchitect
        );
        assert_eq!(
            " delegate_to_frontend ".parse::<RoutingAction>().unwrap(),
            RoutingAction::DelegateToFrontend
        );
        assert_eq!("respond".parse::<RoutingAction>().unwrap(), RoutingAction::RespondToUser);
        assert!(matches!(
            "delegate_to_qa".parse::<RoutingAction>(),
            Err(OrchestrationError::UnrecognizedAction { action }) if action == "delegate_to_qa"
        ));
    }

    #[test]
    fn test_delegate_appends_directive_with_payload() {
        let mut state = state_with_request();
        let decision = RoutingDecision::new("delegate_to_architect", "Draft a plan");

        let action = apply_decision(&mut state, &decision, "t1", false).unwrap();

        assert_eq!(action, RoutingAction::DelegateToArchitect);
        assert_eq!(state.next, Node::Architect);
        let directive = state.last_message().unwrap();
        assert_eq!(directive.role, Role::User);
        assert_eq!(directive.name.as_deref(), Some(SUPERVISOR_AUTHOR));
        assert_eq!(directive.content, "Draft a plan");
    }

    #[test]
    fn test_delegate_annotates_thread_id() {
        let mut state = state_with_request();
        let decision = RoutingDecision::new("delegate_b", "Write index.html");

        apply_decision(&mut state, &decision, "thread-42", true).unwrap();

        assert_eq!(state.next, Node::Frontend);
        assert_eq!(
            state.last_message().unwrap().content,
            "Write index.html\n\n(thread_id: thread-42)"
        );
    }

    #[test]
    fn test_respond_halts() {
        let mut state = state_with_request();
        let decision = RoutingDecision::new("respond_to_user", "Here is the plan.");

        apply_decision(&mut state, &decision, "t1", true).unwrap();

        assert!(state.is_halted());
        let reply = state.last_message().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Here is the plan.");
        assert!(reply.name.is_none());
    }

    #[test]
    fn test_unrecognized_action_leaves_state_untouched() {
        let mut state = state_with_request();
        let before = state.clone();
        let decision = RoutingDecision::new("halt_and_catch_fire", "");

        assert!(apply_decision(&mut state, &decision, "t1", false).is_err());
        assert_eq!(state, before);
    }
}
