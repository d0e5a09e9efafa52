use std::sync::Arc;

use toolchat_model::{Message, ModelProvider};

use super::{ChatClient, DEFAULT_MAX_TOOL_ROUNDS};
use crate::model_client::{ModelClient, OnContent};
use crate::tool::{Executor as ToolExecutor, Registry, RegistryError, Tool};

/// [`ChatClient`] builder.
pub struct ChatClientBuilder {
    model_client: ModelClient,
    registry: Registry,
    registry_error: Option<RegistryError>,
    max_tool_rounds: usize,
    on_content: Option<Box<dyn Fn(&str) + Send + Sync>>,
    on_tool_result: Option<Box<dyn Fn(&Message) + Send + Sync>>,
}

impl ChatClientBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: Registry::new(),
            registry_error: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            on_content: None,
            on_tool_result: None,
        }
    }

    /// Registers a tool.
    ///
    /// Registering two tools with the same name makes [`build`] fail.
    ///
    /// [`build`]: ChatClientBuilder::build
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        if let Err(err) = self.registry.register(tool) {
            self.registry_error.get_or_insert(err);
        }
        self
    }

    /// Sets how many tool-call rounds a single completion may take before
    /// it fails.
    #[inline]
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Attaches a callback to be invoked with every content fragment as it
    /// streams in.
    #[inline]
    pub fn on_content(
        mut self,
        on_content: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_content = Some(Box::new(on_content));
        self
    }

    /// Attaches a callback to be invoked with every tool-result message.
    #[inline]
    pub fn on_tool_result(
        mut self,
        on_tool_result: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.on_tool_result = Some(Box::new(on_tool_result));
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<ChatClient, RegistryError> {
        let ChatClientBuilder {
            model_client,
            registry,
            registry_error,
            max_tool_rounds,
            on_content,
            on_tool_result,
        } = self;

        if let Some(err) = registry_error {
            return Err(err);
        }

        let tool_definitions = registry.definitions();
        let on_content: OnContent = match on_content {
            Some(on_content) => Arc::from(on_content),
            None => Arc::new(|_: &str| {}),
        };
        Ok(ChatClient {
            model_client,
            tool_executor: ToolExecutor::new(Arc::new(registry)),
            tool_definitions,
            max_tool_rounds,
            on_content,
            on_tool_result,
        })
    }
}
