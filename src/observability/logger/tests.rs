use super::*;
use std::collections::HashMap;
use tempfile::tempdir;

#[test]
fn test_logger_creation() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("test.md");

    let logger = Logger::new(Some(&log_path), Some("DEBUG")).unwrap();
    assert_eq!(logger.log_file(), &log_path);
    assert_eq!(logger.log_level(), "DEBUG");
}

#[test]
fn test_log_file_creation() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("logs").join("test.md");

    let _logger = Logger::new(Some(&log_path), None).unwrap();
    assert!(log_path.exists());

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("# Switchboard Transcript"));
    assert!(content.contains("Log started:"));
}

#[test]
fn test_turn_transcript() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("turn.md");
    let logger = Logger::new(Some(&log_path), None).unwrap();

    let input = vec![Message::user("list files in .")];
    logger.log_turn_start("t1", &input, None).unwrap();
    logger
        .log_routing_decision(
            "t1",
            &RoutingDecision::new("delegate_to_frontend", "List the files"),
            "gpt-4o",
        )
        .unwrap();
    logger
        .log_tool_execution("head_of_frontend", "list_files", r#"{"path":"."}"#, "a.txt", true)
        .unwrap();
    logger
        .log_worker_report("t1", "head_of_frontend", "Files: a.txt", 2)
        .unwrap();
    logger.log_checkpoint("t1", "0000000000001-aa", "supervisor").unwrap();
    logger.log_completion("t1", "halted").unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("**Resumed From:** (new thread)"));
    assert!(content.contains("**Input:** 1 messages"));
    assert!(content.contains("**Action:** delegate_to_frontend"));
    assert!(content.contains("**Tool:** list_files"));
    assert!(content.contains("**Worker:** head_of_frontend"));
    assert!(content.contains("0000000000001-aa"));
    assert!(content.contains("Turn Completed"));
}

#[test]
fn test_debug_level_includes_input() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("debug.md");
    let logger = Logger::new(Some(&log_path), Some("debug")).unwrap();

    logger
        .log_turn_start("t1", &[Message::user("secret plan")], Some("0000000000001-aa"))
        .unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("secret plan"));
    assert!(content.contains("**Resumed From:** 0000000000001-aa"));
}

#[test]
fn test_log_error_with_context() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("error.md");
    let logger = Logger::new(Some(&log_path), None).unwrap();

    let mut context = HashMap::new();
    context.insert("thread_id".to_string(), serde_json::json!("t1"));
    logger.log_error("store unavailable", Some(&context)).unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("**Error:** store unavailable"));
    assert!(content.contains("\"thread_id\": \"t1\""));
}

#[test]
fn test_existing_log_file_is_appended() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("append.md");

    Logger::new(Some(&log_path), None)
        .unwrap()
        .log_completion("t1", "first")
        .unwrap();
    Logger::new(Some(&log_path), None)
        .unwrap()
        .log_completion("t1", "second")
        .unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.matches("# Switchboard Transcript").count(), 1);
    assert!(content.contains("first"));
    assert!(content.contains("second"));
}
