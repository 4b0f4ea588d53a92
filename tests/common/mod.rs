//! Scripted model doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use switchboard::conversation::Message;
use switchboard::provider::{
    GenerateConfig, GenerateResponse, LlmProvider, ProviderError, ProviderResult,
    RoutingDecision, RoutingModel,
};

/// Routing model replaying canned decisions and recording what it was shown
pub struct ScriptedRouter {
    decisions: Mutex<VecDeque<ProviderResult<RoutingDecision>>>,
    pub seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedRouter {
    pub fn new(decisions: Vec<RoutingDecision>) -> Self {
        Self::with_results(decisions.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<ProviderResult<RoutingDecision>>) -> Self {
        Self {
            decisions: Mutex::new(results.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl RoutingModel for ScriptedRouter {
    async fn decide(&self, messages: Vec<Message>) -> ProviderResult<RoutingDecision> {
        self.seen.lock().unwrap().push(messages);
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RoutingDecision::new("respond_to_user", "All done.")))
    }

    fn model_name(&self) -> String {
        "scripted-router".into()
    }
}

/// Worker model replaying canned responses and recording what it was shown
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResult<GenerateResponse>>>,
    pub seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<GenerateResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<ProviderResult<GenerateResponse>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(
        &self,
        messages: Vec<Message>,
        _config: &GenerateConfig,
    ) -> ProviderResult<GenerateResponse> {
        self.seen.lock().unwrap().push(messages);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GenerateResponse::Content("Done.".into())))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> String {
        "scripted-worker".into()
    }
}

pub fn network_failure() -> ProviderError {
    ProviderError::Request("connection reset by peer".into())
}
