mod builder;

use std::sync::Arc;

use toolchat_model::{Message, ModelFinishReason, ModelRequest, ModelTool};

use crate::conversation::Conversation;
use crate::error::Error;
use crate::model_client::{ModelClient, OnContent};
use crate::stream::DecodedResponse;
use crate::tool::Executor as ToolExecutor;
pub use builder::ChatClientBuilder;

/// The default number of tool-call rounds allowed in one completion.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 16;

type OnToolResult = Box<dyn Fn(&Message) + Send + Sync>;

/// A streaming chat client that resolves tool calls on its own.
///
/// A completion may take several requests: whenever the model finishes
/// with tool calls, the client executes them, appends the call and the
/// results to the conversation, and asks the model again, until the model
/// answers without tools.
pub struct ChatClient {
    model_client: ModelClient,
    tool_executor: ToolExecutor,
    tool_definitions: Vec<ModelTool>,
    max_tool_rounds: usize,

    on_content: OnContent,
    on_tool_result: Option<OnToolResult>,
}

impl ChatClient {
    /// Completes the conversation and returns the final assistant message.
    ///
    /// Intermediate assistant turns with tool calls and their results are
    /// appended to `conversation`. The returned message is not appended,
    /// that is left to the caller.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future aborts the in-flight request. Turns
    /// appended by finished rounds are kept.
    pub async fn complete(
        &self,
        conversation: &mut Conversation,
    ) -> Result<Message, Error> {
        let mut rounds = 0;
        loop {
            let request = ModelRequest {
                messages: conversation.messages().to_vec(),
                tools: self.tool_definitions.clone(),
            };
            let DecodedResponse {
                message,
                finish_reason,
            } = self
                .model_client
                .send_request(request, Arc::clone(&self.on_content))
                .await
                .map_err(Error::Model)?;
            debug!("round {rounds} finished with reason: {finish_reason:?}");

            if finish_reason != Some(ModelFinishReason::ToolCalls) {
                return Ok(message);
            }
            if message.tool_calls().is_empty() {
                warn!("model finished with tool calls, but requested none");
                return Ok(message);
            }
            let incomplete = message
                .tool_calls()
                .iter()
                .position(|call| call.id.is_empty() || call.name.is_empty());
            if let Some(index) = incomplete {
                error!("tool call {index} is missing its id or name");
                return Err(Error::IncompleteToolCall { index });
            }
            if rounds == self.max_tool_rounds {
                error!("model is still requesting tools after {rounds} rounds");
                return Err(Error::ToolLoopExceeded {
                    max_rounds: self.max_tool_rounds,
                });
            }
            rounds += 1;

            let results = self
                .tool_executor
                .handle_requests(message.tool_calls(), |result| {
                    if let Some(on_tool_result) = &self.on_tool_result {
                        on_tool_result(result);
                    }
                })
                .await;
            conversation.push(message);
            conversation.extend(results);
        }
    }

    /// Returns the names of the tools advertised to the model.
    #[inline]
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tool_executor.registry().names()
    }
}
