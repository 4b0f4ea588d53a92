//! OpenAI-compatible chat-completions client.
//!
//! Implements both [`LlmProvider`] (worker turns with function calling) and
//! [`RoutingModel`] (supervisor decisions via JSON-schema structured output).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::conversation::{Message, Role, ToolCall};
use crate::provider::traits::{
    GenerateResponse, LlmProvider, ProviderError, ProviderResult, RoutingModel,
};
use crate::provider::types::{GenerateConfig, RoutingDecision, ToolDefinition};

/// Client for any endpoint speaking the OpenAI chat-completions protocol
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    supervisor_model: String,
    supervisor_temperature: f32,
    worker_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from the `[llm]` section and an optional API key
    pub fn from_config(config: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            supervisor_model: config.supervisor_model.clone(),
            supervisor_temperature: config.supervisor_temperature,
            worker_model: config.worker_model.clone(),
        }
    }

    fn api_url(&self) -> String {
        if self.base_url.ends_with("/chat/completions") {
            self.base_url.clone()
        } else if self.base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> ProviderResult<ChatMessage> {
        let mut builder = self.client.post(self.api_url()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))
    }
}

/// Render a sanitized message for the wire.
///
/// Tool-call requests recorded on assistant turns are folded into the text,
/// since the matching results arrive as sanitized assistant entries rather
/// than `tool` messages.
fn to_wire(message: &Message) -> WireMessage {
    let role = match message.role {
        Role::User => "user",
        Role::System => "system",
        Role::Assistant | Role::ToolResult | Role::WorkerReport => "assistant",
    };

    let mut content = message.content.clone();
    for call in &message.tool_calls {
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(&format!("Calling {} with {}", call.name, call.arguments));
    }

    let name = message.name.as_deref().map(wire_name).filter(|n| !n.is_empty());
    WireMessage {
        role,
        content,
        name,
    }
}

/// Names on the wire are limited to `[A-Za-z0-9_-]`
fn wire_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn parse_tool_call(call: WireToolCall) -> ToolCall {
    let arguments = if call.function.arguments.trim().is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(&call.function.arguments)
            .unwrap_or(serde_json::Value::String(call.function.arguments))
    };
    ToolCall::new(call.id, call.function.name, arguments)
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn generate(
        &self,
        messages: Vec<Message>,
        config: &GenerateConfig,
    ) -> ProviderResult<GenerateResponse> {
        config.validate()?;

        let model = config.model.as_deref().unwrap_or(&self.worker_model);
        let tools = config.tools.as_ref().map(|defs| {
            defs.iter()
                .map(|function| WireTool {
                    kind: "function",
                    function,
                })
                .collect()
        });

        let request = ChatRequest {
            model,
            messages: messages.iter().map(to_wire).collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            tool_choice: config
                .tools
                .as_ref()
                .and(config.tool_choice.as_ref())
                .map(|choice| choice.as_str()),
            tools,
            response_format: None,
        };

        let message = self.send(&request).await?;
        let content = message.content.unwrap_or_default();

        if message.tool_calls.is_empty() {
            Ok(GenerateResponse::Content(content))
        } else {
            Ok(GenerateResponse::ToolCalls {
                calls: message.tool_calls.into_iter().map(parse_tool_call).collect(),
                content,
            })
        }
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> String {
        self.worker_model.clone()
    }
}

#[async_trait]
impl RoutingModel for OpenAiCompatibleProvider {
    async fn decide(&self, messages: Vec<Message>) -> ProviderResult<RoutingDecision> {
        let request = ChatRequest {
            model: &self.supervisor_model,
            messages: messages.iter().map(to_wire).collect(),
            temperature: self.supervisor_temperature,
            max_tokens: None,
            tools: None,
            tool_choice: None,
            response_format: Some(serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "routing_decision",
                    "strict": true,
                    "schema": RoutingDecision::json_schema(),
                }
            })),
        };

        let message = self.send(&request).await?;
        let content = message
            .content
            .ok_or_else(|| ProviderError::InvalidResponse("decision has no content".to_string()))?;

        serde_json::from_str(&content).map_err(|e| {
            ProviderError::InvalidResponse(format!("decision is not valid JSON: {}", e))
        })
    }

    fn model_name(&self) -> String {
        self.supervisor_model.clone()
    }
}
