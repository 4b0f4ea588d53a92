//! Worker invocation frame: one worker turn with a bounded tool-use loop.

use std::time::Duration;

use super::errors::{OrchestrationError, OrchestrationResult};
use super::tools::{ToolCoordinator, ToolExecutionResult};
use crate::config::{AgentPersona, LlmConfig};
use crate::conversation::{sanitize, Message, Node};
use crate::observability::Logger;
use crate::provider::{GenerateConfig, GenerateResponse, LlmProvider};
use crate::tools::ToolRegistry;

/// Everything needed to run one kind of worker
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub node: Node,
    /// Display name from the persona
    pub display_name: String,
    pub system_prompt: String,
    /// Tool allow-list
    pub tools: Vec<String>,
    pub model: String,
    pub temperature: f32,
}

impl WorkerSpec {
    pub fn from_persona(node: Node, persona: &AgentPersona, llm: &LlmConfig) -> Self {
        Self {
            node,
            display_name: persona.name.clone(),
            system_prompt: persona.system_prompt.clone(),
            tools: persona.tools.clone(),
            model: llm.worker_model.clone(),
            temperature: llm.worker_temperature,
        }
    }

    /// Name attached to the worker's report message
    pub fn report_name(&self) -> &'static str {
        self.node.as_str()
    }
}

/// What a worker frame produced
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// `worker_report` message to fold into the thread
    pub report: Message,
    /// Model calls made
    pub iterations: u32,
    pub tool_history: Vec<ToolExecutionResult>,
}

/// A single worker turn.
///
/// The frame sees only the message it was handed, never the rest of the
/// thread. Its private transcript (tool calls and results) is discarded once
/// the report is produced.
pub struct WorkerFrame<'a> {
    spec: &'a WorkerSpec,
    provider: &'a dyn LlmProvider,
    registry: &'a ToolRegistry,
    max_iterations: u32,
    timeout: Duration,
    logger: Option<&'a Logger>,
}

impl<'a> WorkerFrame<'a> {
    pub fn new(
        spec: &'a WorkerSpec,
        provider: &'a dyn LlmProvider,
        registry: &'a ToolRegistry,
        max_iterations: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            spec,
            provider,
            registry,
            max_iterations,
            timeout,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Option<&'a Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Run the frame on `input` (the most recent thread message)
    pub async fn run(&self, input: &Message) -> OrchestrationResult<WorkerOutcome> {
        let worker = self.spec.report_name();
        let definitions = self.registry.definitions_for(&self.spec.tools);
        let config = GenerateConfig::new()
            .with_model(self.spec.model.clone())
            .with_temperature(self.spec.temperature)
            .with_tools(definitions);

        let mut transcript = vec![Message::system(self.spec.system_prompt.clone()), input.clone()];
        let mut coordinator = ToolCoordinator::new(self.registry, &self.spec.tools, self.timeout);
        let mut iterations = 0;

        let report_text = loop {
            if iterations >= self.max_iterations {
                tracing::warn!(worker, iterations, "worker reached iteration limit");
                break format!(
                    "Stopped after reaching the limit of {} iterations without a final answer.",
                    self.max_iterations
                );
            }
            iterations += 1;

            let response = tokio::time::timeout(
                self.timeout,
                self.provider.generate(sanitize(&transcript), &config),
            )
            .await
            .map_err(|_| {
                OrchestrationError::timeout(format!("{} model call", worker), self.timeout.as_secs())
            })??;

            match response {
                GenerateResponse::Content(text) => break text,
                GenerateResponse::ToolCalls { calls, content } => {
                    let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                    tracing::debug!(worker, iteration = iterations, tools = ?names, "executing tools");

                    transcript.push(Message::assistant_tool_calls(content, calls.clone()));
                    for call in &calls {
                        let result = coordinator.execute(call).await?;
                        if let Some(logger) = self.logger {
                            if let Err(e) = logger.log_tool_execution(
                                worker,
                                &result.tool_name,
                                &call.arguments.to_string(),
                                &result.content,
                                result.success,
                            ) {
                                tracing::warn!("failed to write transcript: {}", e);
                            }
                        }
                        transcript.push(Message::tool_result(
                            result.tool_call_id,
                            result.tool_name,
                            result.content,
                        ));
                    }
                }
            }
        };

        Ok(WorkerOutcome {
            report: Message::worker_report(worker, report_text),
            iterations,
            tool_history: coordinator.into_history(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::conversation::{Role, ToolCall};
    use crate::provider::ProviderResult;
    use crate::tools::{InMemoryBoardStore, Workspace};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Replays canned responses and records every request
    struct Scripted {
        responses: Mutex<VecDeque<GenerateResponse>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Scripted {
        fn new(responses: Vec<GenerateResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn generate(
            &self,
            messages: Vec<Message>,
            _config: &GenerateConfig,
        ) -> ProviderResult<GenerateResponse> {
            self.seen.lock().unwrap().push(messages);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| GenerateResponse::Content("done".into())))
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> String {
            "scripted".into()
        }
    }

    fn frontend_spec() -> WorkerSpec {
        let config = Configuration::default();
        WorkerSpec::from_persona(
            Node::Frontend,
            &config.persona(crate::config::FRONTEND_ID).unwrap(),
            &config.llm,
        )
    }

    fn registry(dir: &TempDir) -> ToolRegistry {
        ToolRegistry::standard(
            Workspace::new(dir.path()),
            200_000,
            Arc::new(InMemoryBoardStore::new()),
        )
    }

    #[tokio::test]
    async fn test_tool_loop_then_report() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let registry = registry(&dir);
        let spec = frontend_spec();
        let provider = Scripted::new(vec![
            GenerateResponse::ToolCalls {
                calls: vec![ToolCall::new("c1", "list_files", serde_json::json!({"path": "."}))],
                content: String::new(),
            },
            GenerateResponse::Content("The folder has a.txt".into()),
        ]);

        let frame = WorkerFrame::new(&spec, &provider, &registry, 15, Duration::from_secs(5));
        let outcome = frame.run(&Message::user("list files in .")).await.unwrap();

        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.report.role, Role::WorkerReport);
        assert_eq!(outcome.report.name.as_deref(), Some("head_of_frontend"));
        assert_eq!(outcome.report.content, "The folder has a.txt");
        assert_eq!(outcome.tool_history.len(), 1);
        assert_eq!(outcome.tool_history[0].content, "a.txt");

        // Second call saw the tool output, already sanitized
        let seen = provider.seen.lock().unwrap();
        let second = &seen[1];
        assert!(second.iter().all(|m| m.role.is_model_facing()));
        assert!(second
            .iter()
            .any(|m| m.content == "Tool Output (list_files): a.txt"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back_as_text() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let spec = frontend_spec();
        let provider = Scripted::new(vec![
            GenerateResponse::ToolCalls {
                calls: vec![ToolCall::new(
                    "c1",
                    "update_board",
                    serde_json::json!({"thread_id": "t"}),
                )],
                content: String::new(),
            },
            GenerateResponse::Content("could not update".into()),
        ]);

        let frame = WorkerFrame::new(&spec, &provider, &registry, 15, Duration::from_secs(5));
        let outcome = frame.run(&Message::user("update the board")).await.unwrap();

        assert!(!outcome.tool_history[0].success);
        assert!(outcome.tool_history[0].content.contains("not available"));
        assert_eq!(outcome.report.content, "could not update");
    }

    #[tokio::test]
    async fn test_iteration_cap_reports_limit() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let spec = frontend_spec();
        let looping = || GenerateResponse::ToolCalls {
            calls: vec![ToolCall::new("c", "list_files", serde_json::json!({}))],
            content: String::new(),
        };
        let provider = Scripted::new(vec![looping(), looping(), looping()]);

        let frame = WorkerFrame::new(&spec, &provider, &registry, 2, Duration::from_secs(5));
        let outcome = frame.run(&Message::user("loop")).await.unwrap();

        assert_eq!(outcome.iterations, 2);
        assert!(outcome.report.content.contains("limit of 2 iterations"));
    }

    #[tokio::test]
    async fn test_frame_sees_only_its_input() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let spec = frontend_spec();
        let provider = Scripted::new(vec![GenerateResponse::Content("ok".into())]);

        let frame = WorkerFrame::new(&spec, &provider, &registry, 15, Duration::from_secs(5));
        frame.run(&Message::user("only this")).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][1].content, "only this");
    }
}
