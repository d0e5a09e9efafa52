use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;
use toolchat_model::{Message, ToolCall};
use tracing::Instrument;

use crate::tool::{Error, Registry};

/// An executor that handles tool call requests from the model.
///
/// Requests are executed one after another. Every failure, including an
/// unknown tool name, becomes the content of the tool-result message so
/// the model can react to it.
#[derive(Clone)]
pub struct Executor {
    registry: Arc<Registry>,
}

impl Executor {
    /// Creates an executor over the given registry.
    #[inline]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns the registry of this executor.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Executes the requests in order, returning one tool-result message
    /// per request.
    ///
    /// `on_result` is called with each message as soon as it is produced.
    pub async fn handle_requests<F>(
        &self,
        requests: &[ToolCall],
        mut on_result: F,
    ) -> Vec<Message>
    where
        F: FnMut(&Message),
    {
        let mut results = Vec::with_capacity(requests.len());
        for req in requests {
            let result = self.handle_request(req).await;
            on_result(&result);
            results.push(result);
        }
        results
    }

    /// Executes a single request.
    pub async fn handle_request(&self, req: &ToolCall) -> Message {
        let content = self
            .execute(req)
            .instrument(debug_span!("tool execute", name = %req.name))
            .await;
        Message::tool_result(&req.id, &req.name, content)
    }

    async fn execute(&self, req: &ToolCall) -> String {
        let Some(tool) = self.registry.resolve(&req.name) else {
            warn!("tool not found: {}", req.name);
            return format!("Unknown function: {}", req.name);
        };

        let arguments = match parse_arguments(&req.arguments) {
            Ok(arguments) => arguments,
            Err(err) => return failure_content(&req.name, &err),
        };
        trace!("running a tool ({}) with args: {arguments:?}", req.id);

        // A panicking tool is reported like any other execution error.
        let result = AssertUnwindSafe(async { tool.execute(arguments).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(Error::execution_error().with_reason("the tool panicked"))
            });
        match result {
            Ok(output) => {
                debug!("tool succeeded with {} bytes", output.len());
                output
            }
            Err(err) => {
                warn!("tool failed: {err}");
                failure_content(&req.name, &err)
            }
        }
    }
}

fn parse_arguments(arguments: &str) -> Result<Value, Error> {
    // Parameterless functions may come with no arguments at all.
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments).map_err(|err| {
        Error::invalid_input()
            .with_reason(format!("arguments are not valid JSON: {err}"))
    })
}

#[inline]
fn failure_content(name: &str, err: &Error) -> String {
    format!("Error calling {name}: {err}")
}
