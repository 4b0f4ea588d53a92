//! Orchestrator runtime - the supervisor/worker loop over checkpointed state

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::errors::{OrchestrationError, OrchestrationResult};
use super::routing::apply_decision;
use super::worker::{WorkerFrame, WorkerSpec};
use crate::checkpoint::{
    CheckpointEngine, CheckpointError, CheckpointMetadata, CheckpointStore, StateSnapshot,
};
use crate::config::{Configuration, ARCHITECT_ID, FRONTEND_ID, SUPERVISOR_ID};
use crate::conversation::{sanitize, ConversationState, Message, Node};
use crate::observability::Logger;
use crate::provider::{LlmProvider, RoutingModel};
use crate::tools::ToolRegistry;

/// Runtime limits for one request
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Checkpoint namespace
    pub namespace: String,
    /// Supervisor and worker hops allowed per request
    pub max_steps: u32,
    /// Model round-trips allowed per worker frame
    pub max_worker_iterations: u32,
    /// Bound on every model and tool call
    pub timeout: Duration,
    pub annotate_thread_id: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            max_steps: 25,
            max_worker_iterations: 15,
            timeout: Duration::from_secs(120),
            annotate_thread_id: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            namespace: config.checkpointing.namespace.clone(),
            max_steps: config.execution.max_steps,
            max_worker_iterations: config.execution.max_worker_iterations,
            timeout: Duration::from_secs(config.execution.timeout_seconds),
            annotate_thread_id: config.execution.annotate_thread_id,
        }
    }
}

/// Result of one `invoke`
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub thread_id: String,
    /// Checkpoint holding `state`
    pub checkpoint_id: String,
    pub state: ConversationState,
    /// Supervisor and worker steps run by this request
    pub steps: u32,
}

/// Per-thread async locks; runs on one thread are serialised within the process
#[derive(Default)]
struct ThreadLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ThreadLocks {
    async fn acquire(&self, thread_id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    store: Arc<dyn CheckpointStore>,
    router: Arc<dyn RoutingModel>,
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    config: Configuration,
    logger: Option<Arc<Logger>>,
}

impl OrchestratorBuilder {
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        router: Arc<dyn RoutingModel>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            store,
            router,
            provider,
            registry: ToolRegistry::new(),
            config: Configuration::default(),
            logger: None,
        }
    }

    pub fn with_tools(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> OrchestrationResult<Orchestrator> {
        let persona = |id: &str| {
            self.config
                .persona(id)
                .ok_or_else(|| OrchestrationError::Config(format!("no persona for {}", id)))
        };

        let supervisor_prompt = persona(SUPERVISOR_ID)?.system_prompt;
        let architect =
            WorkerSpec::from_persona(Node::Architect, &persona(ARCHITECT_ID)?, &self.config.llm);
        let frontend =
            WorkerSpec::from_persona(Node::Frontend, &persona(FRONTEND_ID)?, &self.config.llm);

        for spec in [&architect, &frontend] {
            if let Some(missing) = spec.tools.iter().find(|t| !self.registry.contains(t)) {
                tracing::warn!(
                    worker = spec.report_name(),
                    tool = %missing,
                    "allowed tool is not registered"
                );
            }
        }

        Ok(Orchestrator {
            engine: CheckpointEngine::new(self.store),
            router: self.router,
            provider: self.provider,
            registry: self.registry,
            supervisor_prompt,
            architect,
            frontend,
            settings: RuntimeConfig::from_config(&self.config),
            locks: ThreadLocks::default(),
            logger: self.logger,
        })
    }
}

/// The supervisor/worker state machine.
///
/// Every completed step is persisted before the next one starts, so a failed
/// request leaves the last completed step as the thread's latest state and a
/// later request resumes from there.
pub struct Orchestrator {
    engine: CheckpointEngine,
    router: Arc<dyn RoutingModel>,
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    supervisor_prompt: String,
    architect: WorkerSpec,
    frontend: WorkerSpec,
    settings: RuntimeConfig,
    locks: ThreadLocks,
    logger: Option<Arc<Logger>>,
}

impl Orchestrator {
    pub fn settings(&self) -> &RuntimeConfig {
        &self.settings
    }

    pub fn engine(&self) -> &CheckpointEngine {
        &self.engine
    }

    /// Latest state for a thread, `None` when it has no checkpoints
    pub async fn get_state(&self, thread_id: &str) -> OrchestrationResult<Option<StateSnapshot>> {
        Ok(self
            .engine
            .get_latest(thread_id, &self.settings.namespace)
            .await?)
    }

    /// Run the state machine for one request.
    ///
    /// Non-empty `input` is appended to the thread and hands control to the
    /// supervisor, even when a worker step was pending. Empty `input` resumes
    /// a thread that stopped mid-run; on a halted thread it returns the stored
    /// state unchanged.
    pub async fn invoke(
        &self,
        thread_id: &str,
        input: Vec<Message>,
    ) -> OrchestrationResult<TurnOutcome> {
        if thread_id.trim().is_empty() {
            return Err(CheckpointError::InvalidThreadId {
                thread_id: thread_id.to_string(),
            }
            .into());
        }

        let _guard = self.locks.acquire(thread_id).await;

        let result = self.run(thread_id, input).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(
                    thread_id,
                    checkpoint_id = %outcome.checkpoint_id,
                    steps = outcome.steps,
                    "request completed"
                );
                self.transcript(|log| log.log_completion(thread_id, "halted"));
            }
            Err(e) => {
                tracing::error!(thread_id, kind = e.kind(), "request failed: {}", e);
                self.transcript(|log| {
                    let mut context = HashMap::new();
                    context.insert("thread_id".to_string(), serde_json::json!(thread_id));
                    context.insert("kind".to_string(), serde_json::json!(e.kind()));
                    log.log_error(&e.to_string(), Some(&context))
                });
            }
        }
        result
    }

    async fn run(&self, thread_id: &str, input: Vec<Message>) -> OrchestrationResult<TurnOutcome> {
        let namespace = self.settings.namespace.as_str();
        let latest = self.engine.get_latest(thread_id, namespace).await?;
        let resumed_from = latest.as_ref().map(|s| s.checkpoint_id.clone());
        self.transcript(|log| log.log_turn_start(thread_id, &input, resumed_from.as_deref()));

        let (mut state, mut checkpoint_id) = match (latest, input.is_empty()) {
            (None, true) => {
                return Err(OrchestrationError::invalid_request(
                    "no input messages and no stored state to resume",
                ))
            }
            (Some(snapshot), true) => {
                tracing::debug!(thread_id, next = %snapshot.state.next, "resuming stored state");
                (snapshot.state, snapshot.checkpoint_id)
            }
            (snapshot, false) => {
                let mut state = snapshot.map(|s| s.state).unwrap_or_default();
                state.messages.extend(input);
                state.next = Node::Supervisor;
                let id = self
                    .persist(thread_id, &state, &CheckpointMetadata::input())
                    .await?;
                (state, id)
            }
        };

        let mut steps = 0;
        while !state.is_halted() {
            if steps >= self.settings.max_steps {
                return Err(OrchestrationError::StepLimit {
                    limit: self.settings.max_steps,
                    thread_id: thread_id.to_string(),
                });
            }
            steps += 1;

            let writer = state.next;
            match writer {
                Node::Supervisor => self.supervisor_step(thread_id, &mut state).await?,
                Node::Architect => self.worker_step(thread_id, &self.architect, &mut state).await?,
                Node::Frontend => self.worker_step(thread_id, &self.frontend, &mut state).await?,
                Node::Halted => break,
            }

            checkpoint_id = self
                .persist(thread_id, &state, &CheckpointMetadata::step(steps, writer.as_str()))
                .await?;
        }

        Ok(TurnOutcome {
            thread_id: thread_id.to_string(),
            checkpoint_id,
            state,
            steps,
        })
    }

    async fn supervisor_step(
        &self,
        thread_id: &str,
        state: &mut ConversationState,
    ) -> OrchestrationResult<()> {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(self.supervisor_prompt.clone()));
        messages.extend(sanitize(&state.messages));

        let decision = tokio::time::timeout(self.settings.timeout, self.router.decide(messages))
            .await
            .map_err(|_| {
                OrchestrationError::timeout("decision call", self.settings.timeout.as_secs())
            })??;

        let model = self.router.model_name();
        self.transcript(|log| log.log_routing_decision(thread_id, &decision, &model));

        let action = apply_decision(state, &decision, thread_id, self.settings.annotate_thread_id)?;
        tracing::info!(thread_id, %action, next = %state.next, "supervisor decided");
        Ok(())
    }

    async fn worker_step(
        &self,
        thread_id: &str,
        spec: &WorkerSpec,
        state: &mut ConversationState,
    ) -> OrchestrationResult<()> {
        let input = state.last_message().cloned().ok_or_else(|| {
            CheckpointError::corrupted(thread_id, format!("{} is pending on an empty history", spec.node))
        })?;

        let frame = WorkerFrame::new(
            spec,
            self.provider.as_ref(),
            &self.registry,
            self.settings.max_worker_iterations,
            self.settings.timeout,
        )
        .with_logger(self.logger.as_deref());
        let outcome = frame.run(&input).await?;

        self.transcript(|log| {
            log.log_worker_report(
                thread_id,
                spec.report_name(),
                &outcome.report.content,
                outcome.iterations,
            )
        });
        tracing::info!(
            thread_id,
            worker = spec.report_name(),
            iterations = outcome.iterations,
            tool_calls = outcome.tool_history.len(),
            "worker reported"
        );

        state.push(outcome.report);
        state.next = Node::Supervisor;
        Ok(())
    }

    async fn persist(
        &self,
        thread_id: &str,
        state: &ConversationState,
        metadata: &CheckpointMetadata,
    ) -> OrchestrationResult<String> {
        let checkpoint_id = self
            .engine
            .put(thread_id, &self.settings.namespace, state, metadata)
            .await?;
        let writer = metadata.writer.as_deref().unwrap_or("input");
        self.transcript(|log| log.log_checkpoint(thread_id, &checkpoint_id, writer));
        Ok(checkpoint_id)
    }

    /// Write to the transcript if one is configured; failures only warn
    fn transcript(&self, write: impl FnOnce(&Logger) -> anyhow::Result<()>) {
        if let Some(logger) = &self.logger {
            if let Err(e) = write(logger) {
                tracing::warn!("failed to write transcript: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::InMemoryCheckpointStore;
    use crate::conversation::Role;
    use crate::provider::{
        GenerateConfig, GenerateResponse, ProviderResult, RoutingDecision,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;

    struct Decisions(Mutex<VecDeque<RoutingDecision>>);

    #[async_trait]
    impl RoutingModel for Decisions {
        async fn decide(&self, _messages: Vec<Message>) -> ProviderResult<RoutingDecision> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| RoutingDecision::new("respond_to_user", "done")))
        }

        fn model_name(&self) -> String {
            "decisions".into()
        }
    }

    struct Reply;

    #[async_trait]
    impl LlmProvider for Reply {
        async fn generate(
            &self,
            _messages: Vec<Message>,
            _config: &GenerateConfig,
        ) -> ProviderResult<GenerateResponse> {
            Ok(GenerateResponse::Content("worker done".into()))
        }

        fn provider_name(&self) -> &str {
            "reply"
        }

        fn default_model(&self) -> String {
            "reply".into()
        }
    }

    /// Never answers within any reasonable timeout
    struct Stalled;

    #[async_trait]
    impl RoutingModel for Stalled {
        async fn decide(&self, _messages: Vec<Message>) -> ProviderResult<RoutingDecision> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RoutingDecision::new("respond_to_user", "too late"))
        }

        fn model_name(&self) -> String {
            "stalled".into()
        }
    }

    #[async_trait]
    impl LlmProvider for Stalled {
        async fn generate(
            &self,
            _messages: Vec<Message>,
            _config: &GenerateConfig,
        ) -> ProviderResult<GenerateResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(GenerateResponse::Content("too late".into()))
        }

        fn provider_name(&self) -> &str {
            "stalled"
        }

        fn default_model(&self) -> String {
            "stalled".into()
        }
    }

    fn short_timeout() -> Configuration {
        let mut config = Configuration::default();
        config.execution.timeout_seconds = 5;
        config
    }

    fn orchestrator(
        store: InMemoryCheckpointStore,
        decisions: Vec<RoutingDecision>,
        config: Configuration,
    ) -> Orchestrator {
        OrchestratorBuilder::new(
            Arc::new(store),
            Arc::new(Decisions(Mutex::new(decisions.into()))),
            Arc::new(Reply),
        )
        .with_config(config)
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn test_respond_halts_after_one_step() {
        let store = InMemoryCheckpointStore::new();
        let orch = orchestrator(
            store.clone(),
            vec![RoutingDecision::new("respond_to_user", "Hello!")],
            Configuration::default(),
        );

        let outcome = orch.invoke("t1", vec![Message::user("hi")]).await.unwrap();

        assert_eq!(outcome.steps, 1);
        assert!(outcome.state.is_halted());
        assert_eq!(outcome.state.messages.len(), 2);
        assert_eq!(outcome.state.messages[1].content, "Hello!");
        // input checkpoint + supervisor step
        assert_eq!(store.checkpoint_count("t1", ""), 2);

        let latest = orch.get_state("t1").await.unwrap().unwrap();
        assert_eq!(latest.checkpoint_id, outcome.checkpoint_id);
        assert_eq!(latest.metadata["writer"], "supervisor");
    }

    #[tokio::test]
    async fn test_step_limit() {
        let mut config = Configuration::default();
        config.execution.max_steps = 3;
        let decisions = (0..5)
            .map(|_| RoutingDecision::new("delegate_to_architect", "plan"))
            .collect();
        let store = InMemoryCheckpointStore::new();
        let orch = orchestrator(store.clone(), decisions, config);

        let err = orch.invoke("t1", vec![Message::user("go")]).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::StepLimit { limit: 3, .. }));

        // Every completed step was persisted; the thread can be resumed
        let latest = orch.get_state("t1").await.unwrap().unwrap();
        assert_eq!(latest.state.next, Node::Architect);
        assert_eq!(store.checkpoint_count("t1", ""), 4);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let orch = orchestrator(InMemoryCheckpointStore::new(), Vec::new(), Configuration::default());

        let err = orch.invoke("cold", Vec::new()).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_request");

        let first = orch.invoke("t1", vec![Message::user("hi")]).await.unwrap();
        let again = orch.invoke("t1", Vec::new()).await.unwrap();
        assert_eq!(again.steps, 0);
        assert_eq!(again.checkpoint_id, first.checkpoint_id);
        assert_eq!(again.state, first.state);
    }

    #[tokio::test]
    async fn test_blank_thread_id_rejected() {
        let orch = orchestrator(InMemoryCheckpointStore::new(), Vec::new(), Configuration::default());
        let err = orch.invoke("  ", vec![Message::user("hi")]).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }

    #[tokio::test]
    async fn test_new_input_returns_control_to_supervisor() {
        let mut config = Configuration::default();
        config.execution.max_steps = 1;
        let store = InMemoryCheckpointStore::new();
        let orch = orchestrator(
            store,
            vec![
                RoutingDecision::new("delegate_to_frontend", "build it"),
                RoutingDecision::new("respond_to_user", "never mind then"),
            ],
            config,
        );

        // Stops with the frontend worker pending
        assert!(orch.invoke("t1", vec![Message::user("build")]).await.is_err());
        assert_eq!(
            orch.get_state("t1").await.unwrap().unwrap().state.next,
            Node::Frontend
        );

        let outcome = orch
            .invoke("t1", vec![Message::user("actually, stop")])
            .await
            .unwrap();
        assert!(outcome.state.is_halted());
        let roles: Vec<Role> = outcome.state.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::User, Role::User, Role::Assistant]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_decision_is_transient() {
        let store = InMemoryCheckpointStore::new();
        let orch =
            OrchestratorBuilder::new(Arc::new(store.clone()), Arc::new(Stalled), Arc::new(Reply))
                .with_config(short_timeout())
                .build()
                .unwrap();

        let err = orch.invoke("t1", vec![Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Timeout { seconds: 5, .. }));
        assert!(err.is_transient());

        // Only the input checkpoint exists and it is still the latest
        assert_eq!(store.checkpoint_count("t1", ""), 1);
        let latest = orch.get_state("t1").await.unwrap().unwrap();
        assert_eq!(latest.state.next, Node::Supervisor);
        assert_eq!(latest.metadata["source"], "input");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_worker_call_is_transient() {
        let store = InMemoryCheckpointStore::new();
        let decisions = vec![RoutingDecision::new("delegate_to_architect", "plan it")];
        let orch = OrchestratorBuilder::new(
            Arc::new(store.clone()),
            Arc::new(Decisions(Mutex::new(decisions.into()))),
            Arc::new(Stalled),
        )
        .with_config(short_timeout())
        .build()
        .unwrap();

        let err = orch.invoke("t1", vec![Message::user("plan")]).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Timeout { .. }));
        assert!(err.is_transient());

        // The supervisor step survived; the worker step left nothing behind
        assert_eq!(store.checkpoint_count("t1", ""), 2);
        let latest = orch.get_state("t1").await.unwrap().unwrap();
        assert_eq!(latest.state.next, Node::Architect);
        assert_eq!(latest.metadata["writer"], "supervisor");
    }
}
