//! Markdown transcript of orchestrator activity.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::conversation::Message;
use crate::provider::RoutingDecision;

/// Transcript logger for turns, routing decisions, worker reports and tool calls.
///
/// Entries are appended to a markdown file; the same events also go to
/// `tracing` at INFO or ERROR level.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
    log_level: String,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => std::env::temp_dir().join("switchboard-logs").join(format!(
                "switchboard_{}_{}.md",
                Utc::now().timestamp_millis(),
                std::process::id()
            )),
        };

        let log_level = log_level.unwrap_or("INFO").to_string();

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let logger = Self {
            log_file,
            log_level,
        };

        if !logger.log_file.exists() {
            logger.initialize_log_file()?;
        }

        Ok(logger)
    }

    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Switchboard Transcript\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    fn append_to_log(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        write!(file, "{}", content).with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    fn is_debug(&self) -> bool {
        self.log_level.eq_ignore_ascii_case("DEBUG") || self.log_level.eq_ignore_ascii_case("TRACE")
    }

    /// Log the start of a request on a thread.
    ///
    /// # Arguments
    /// * `thread_id` - Conversation thread.
    /// * `input` - Messages supplied by the caller.
    /// * `resumed_from` - Checkpoint the request continues from, if any.
    pub fn log_turn_start(
        &self,
        thread_id: &str,
        input: &[Message],
        resumed_from: Option<&str>,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "## Turn Started - {}\n\n**Thread:** {}\n**Resumed From:** {}\n",
            now.to_rfc3339(),
            thread_id,
            resumed_from.unwrap_or("(new thread)")
        );

        if self.is_debug() {
            content.push_str(&format!(
                "**Input:**\n```json\n{}\n```\n\n",
                serde_json::to_string_pretty(input).unwrap_or_default()
            ));
        } else {
            content.push_str(&format!("**Input:** {} messages\n\n", input.len()));
        }

        self.append_to_log(&content)?;
        tracing::info!(thread_id, input = input.len(), "turn started");
        Ok(())
    }

    /// Log a supervisor decision.
    pub fn log_routing_decision(
        &self,
        thread_id: &str,
        decision: &RoutingDecision,
        model: &str,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Routing Decision - {}\n\n**Thread:** {}\n**Model:** {}\n**Action:** {}\n**Reasoning:** {}\n\n**Content:**\n```\n{}\n```\n\n",
            now.to_rfc3339(),
            thread_id,
            model,
            decision.action,
            decision.reasoning,
            decision.response_content
        );

        self.append_to_log(&content)?;
        tracing::info!(thread_id, action = %decision.action, "routing decision");
        Ok(())
    }

    /// Log the report a worker folded back into the thread.
    pub fn log_worker_report(
        &self,
        thread_id: &str,
        worker: &str,
        report: &str,
        iterations: u32,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Worker Report - {}\n\n**Thread:** {}\n**Worker:** {}\n**Iterations:** {}\n\n**Report:**\n```\n{}\n```\n\n",
            now.to_rfc3339(),
            thread_id,
            worker,
            iterations,
            report
        );

        self.append_to_log(&content)?;
        tracing::info!(thread_id, worker, iterations, "worker reported");
        Ok(())
    }

    /// Log tool execution with detailed results.
    ///
    /// # Arguments
    /// * `worker` - Worker that made the call.
    /// * `tool_name` - Name of the tool executed.
    /// * `tool_args` - Arguments passed to the tool.
    /// * `result` - Tool output text.
    /// * `success` - Whether the tool reported success.
    pub fn log_tool_execution(
        &self,
        worker: &str,
        tool_name: &str,
        tool_args: &str,
        result: &str,
        success: bool,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let status = if success { "Result" } else { "Error" };

        let content = format!(
            "### Tool Execution - {}\n\n**Worker:** {}\n**Tool:** {}\n**Args:** {}\n**{}:** {}\n\n",
            now.to_rfc3339(),
            worker,
            tool_name,
            tool_args,
            status,
            result
        );

        self.append_to_log(&content)?;
        Ok(())
    }

    /// Log a persisted checkpoint.
    pub fn log_checkpoint(&self, thread_id: &str, checkpoint_id: &str, writer: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "- Checkpoint `{}` written by {} for thread {} at {}\n\n",
            checkpoint_id,
            writer,
            thread_id,
            now.to_rfc3339()
        );
        self.append_to_log(&content)
    }

    /// Log error with context.
    ///
    /// # Arguments
    /// * `error` - Error message.
    /// * `context` - Additional context information.
    pub fn log_error(
        &self,
        error: &str,
        context: Option<&HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Error - {}\n\n**Error:** {}\n\n",
            now.to_rfc3339(),
            error
        );

        if let Some(ctx) = context {
            content.push_str(&format!(
                "**Context:** {}\n\n",
                serde_json::to_string_pretty(ctx).unwrap_or_default()
            ));
        }

        self.append_to_log(&content)?;
        tracing::error!("{}", error);
        Ok(())
    }

    /// Log the end of a request.
    pub fn log_completion(&self, thread_id: &str, reason: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Turn Completed - {}\n\n**Thread:** {}\n**Reason:** {}\n\n---\n\n",
            now.to_rfc3339(),
            thread_id,
            reason
        );

        self.append_to_log(&content)?;
        tracing::info!(thread_id, reason, "turn completed");
        Ok(())
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

#[cfg(test)]
mod tests;
