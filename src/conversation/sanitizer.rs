//! Message sanitation applied before every model call.
//!
//! Model calls accept only user, assistant and system entries. Tool results and
//! worker reports are rewritten into assistant text that embeds the original
//! content verbatim and, when known, the author's name. Role information is lost;
//! content is not.

use super::message::{Message, Role};

/// Prefix used when rewriting tool results
pub const TOOL_OUTPUT_LABEL: &str = "Tool Output";

/// Prefix used when rewriting worker reports
pub const WORKER_REPORT_LABEL: &str = "Worker Report";

/// Rewrite a history so every entry has a model-facing role.
///
/// Sanitizing an already sanitized history returns it unchanged.
pub fn sanitize(messages: &[Message]) -> Vec<Message> {
    messages.iter().map(sanitize_message).collect()
}

/// Rewrite a single entry
pub fn sanitize_message(message: &Message) -> Message {
    match message.role {
        Role::User | Role::Assistant | Role::System => message.clone(),
        Role::ToolResult => rewrite(message, TOOL_OUTPUT_LABEL),
        Role::WorkerReport => rewrite(message, WORKER_REPORT_LABEL),
    }
}

/// Whether every entry already has a model-facing role
pub fn is_sanitized(messages: &[Message]) -> bool {
    messages.iter().all(|m| m.role.is_model_facing())
}

fn rewrite(message: &Message, label: &str) -> Message {
    let content = match message.name.as_deref() {
        Some(name) if !name.is_empty() => format!("{} ({}): {}", label, name, message.content),
        _ => format!("{}: {}", label, message.content),
    };

    Message {
        role: Role::Assistant,
        content,
        name: message.name.clone(),
        tool_call_id: None,
        tool_calls: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_history() -> Vec<Message> {
        vec![
            Message::system("You route work."),
            Message::user("list files in ."),
            Message::user("List the files").with_name("Supervisor"),
            Message::tool_result("call_1", "list_files", "Cargo.toml\nsrc"),
            Message::tool_result("call_2", "", "unnamed output"),
            Message::worker_report("head_of_frontend", "Files: Cargo.toml, src"),
            Message::assistant("Here you go"),
        ]
    }

    #[test]
    fn test_tool_results_are_rewritten() {
        let sanitized = sanitize(&mixed_history());

        assert!(sanitized.iter().all(|m| m.role != Role::ToolResult));
        assert!(sanitized.iter().all(|m| m.role != Role::WorkerReport));
        assert!(is_sanitized(&sanitized));

        assert_eq!(sanitized[3].role, Role::Assistant);
        assert_eq!(sanitized[3].content, "Tool Output (list_files): Cargo.toml\nsrc");
        assert!(sanitized[3].tool_call_id.is_none());
        assert_eq!(sanitized[4].content, "Tool Output: unnamed output");
        assert_eq!(
            sanitized[5].content,
            "Worker Report (head_of_frontend): Files: Cargo.toml, src"
        );
    }

    #[test]
    fn test_content_is_preserved_verbatim() {
        let original = mixed_history();
        let sanitized = sanitize(&original);
        for (before, after) in original.iter().zip(&sanitized) {
            assert!(after.content.contains(&before.content));
        }
    }

    #[test]
    fn test_allowed_roles_pass_through_unchanged() {
        let original = mixed_history();
        let sanitized = sanitize(&original);
        assert_eq!(sanitized[0], original[0]);
        assert_eq!(sanitized[2], original[2]);
        assert_eq!(sanitized[6], original[6]);
        assert_eq!(sanitized.len(), original.len());
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize(&mixed_history());
        let twice = sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_history() {
        assert!(sanitize(&[]).is_empty());
        assert!(is_sanitized(&[]));
    }
}
