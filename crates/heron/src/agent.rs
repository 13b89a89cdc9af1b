use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{AgentError, RegistryError, ToolResult};
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::base::{Provider, Usage};
use crate::registry::{ToolHandler, ToolRegistry};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Knobs for one agent's loop behavior.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Ceiling on think/act cycles per `chat` call
    pub max_iterations: usize,
    /// Per-call limit on the model backend; exceeding it fails the chat
    pub model_timeout: Option<Duration>,
    /// Per-call limit on a tool invocation; exceeding it is a tool error
    pub tool_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_timeout: None,
            tool_timeout: None,
        }
    }
}

/// An agent owns one conversation and one tool set, and drives the
/// think → act → observe cycle against a model backend until the backend
/// stops asking for tools or the iteration budget runs out.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
    system_prompt: String,
    messages: Vec<Message>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new Agent with the specified provider
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            registry: ToolRegistry::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            messages: Vec::new(),
            config: AgentConfig::default(),
        }
    }

    /// Replace the default system prompt. The prompt is not part of history
    /// and survives `reset`.
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing registry, e.g. one shared with other agents.
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resume a previously persisted conversation.
    pub fn with_history(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Register an async tool. Takes effect on the next model call.
    pub fn register_tool<F, Fut>(&mut self, tool: Tool, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ToolResult<serde_json::Value>> + Send + 'static,
    {
        self.registry.register(tool, handler)
    }

    /// Register a synchronous tool. Takes effect on the next model call.
    pub fn register_fn<F>(&mut self, tool: Tool, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(serde_json::Value) -> ToolResult<serde_json::Value> + Send + Sync + 'static,
    {
        self.registry.register_fn(tool, handler)
    }

    /// Register several pre-boxed tools at once.
    pub fn register_tools(
        &mut self,
        tools: impl IntoIterator<Item = (Tool, ToolHandler)>,
    ) -> Result<(), RegistryError> {
        self.registry.register_all(tools)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The conversation so far. Append-only; serialize it to persist the
    /// session.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Discard the conversation, keeping the system prompt and the tools.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Send a user message and run the loop to an answer.
    ///
    /// Each iteration asks the provider for the next step. A response without
    /// tool requests is the final answer. Otherwise every requested call is
    /// dispatched concurrently and the results are appended in request order
    /// before the next iteration. Tool failures stay inside the conversation;
    /// provider failures and an exhausted iteration budget end the call with
    /// a typed error.
    pub async fn chat<S: Into<String>>(&mut self, message: S) -> Result<String, AgentError> {
        self.messages.push(Message::user().with_text(message));
        let tools = self.registry.descriptors();

        for iteration in 0..self.config.max_iterations {
            debug!(iteration, "requesting completion");
            let (response, _) = self.complete(&tools).await?;
            self.messages.push(response.clone());

            let requests: Vec<ToolRequest> = response
                .tool_requests()
                .into_iter()
                .cloned()
                .collect();

            if requests.is_empty() {
                return Ok(response.text());
            }

            debug!(count = requests.len(), "dispatching tool calls");
            let dispatches = requests
                .iter()
                .map(|request| self.dispatch(request.tool_call.clone()));
            let outputs = futures::future::join_all(dispatches).await;

            // Results go back in request order, whatever order they finished in
            let mut tool_message = Message::user();
            for (request, output) in requests.iter().zip(outputs) {
                tool_message = tool_message.with_tool_response(request.id.clone(), output);
            }
            self.messages.push(tool_message);
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "iteration budget exhausted without a final answer"
        );
        Err(AgentError::MaxIterationsExceeded(self.config.max_iterations))
    }

    async fn complete(&self, tools: &[Tool]) -> Result<(Message, Usage), AgentError> {
        let request = self.provider.complete(&self.system_prompt, &self.messages, tools);
        match self.config.model_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| AgentError::ProviderTimedOut(limit.as_millis() as u64))?
                .map_err(AgentError::Provider),
            None => request.await.map_err(AgentError::Provider),
        }
    }

    async fn dispatch(&self, tool_call: ToolResult<ToolCall>) -> ToolResult<String> {
        let call = tool_call?;
        self.registry.invoke(call, self.config.tool_timeout).await
    }
}
