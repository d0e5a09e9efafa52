use std::fmt::{self, Display};
use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::provider::ModelProviderError;

/// A streamed response from the model provider.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Attempts to pull out the next event from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next event. Implementations will ensure that the current
    ///   task will be notified when the next event may be ready.
    /// - `Poll::Ready(Ok(Some(event)))` means the response has an event
    ///   to deliver, and may produce further events on subsequent
    ///   `poll_next_event` calls.
    /// - `Poll::Ready(Ok(None))` means the response has reached the end
    ///   of stream.
    /// - `Poll::Ready(Err(error))` means an error occurred while
    ///   processing the response.
    ///
    /// Calling this method after completion should always return `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// The reason why a model response has finished.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model has finished generating text.
    Stop,
    /// The model needs to call tools.
    ToolCalls,
    /// The output was cut off by the token limit.
    Length,
    /// The output was filtered by the provider.
    ContentFilter,
    /// A reason this crate doesn't know about.
    Other(String),
}

impl ModelFinishReason {
    /// Parses the wire representation of a finish reason.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "stop" => ModelFinishReason::Stop,
            "tool_calls" => ModelFinishReason::ToolCalls,
            "length" => ModelFinishReason::Length,
            "content_filter" => ModelFinishReason::ContentFilter,
            other => ModelFinishReason::Other(other.to_owned()),
        }
    }
}

impl Display for ModelFinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFinishReason::Stop => f.write_str("stop"),
            ModelFinishReason::ToolCalls => f.write_str("tool_calls"),
            ModelFinishReason::Length => f.write_str("length"),
            ModelFinishReason::ContentFilter => f.write_str("content_filter"),
            ModelFinishReason::Other(other) => f.write_str(other),
        }
    }
}

/// The number of tool calls a single response may request.
///
/// Fragments addressing an index at or above this limit are malformed.
pub const MAX_TOOL_CALLS: usize = 128;

/// A fragment of a tool call request.
///
/// Fragments are addressed by `index`, which identifies the tool call
/// within the response. `id` and `name` usually arrive once in the first
/// fragment, while `arguments` arrive in many small pieces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// The position of the tool call this fragment belongs to.
    pub index: usize,
    /// The unique identifier for the tool call request.
    pub id: Option<String>,
    /// The name of the tool to call.
    pub name: Option<String>,
    /// A piece of the serialized arguments.
    pub arguments: Option<String>,
}

/// The event from a model response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// Received a content fragment.
    ContentDelta(String),
    /// Received a tool call fragment.
    ToolCallDelta(ToolCallDelta),
    /// The model declared why the response finished.
    Finished(ModelFinishReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_from_wire() {
        assert_eq!(
            ModelFinishReason::from_wire("tool_calls"),
            ModelFinishReason::ToolCalls
        );
        assert_eq!(ModelFinishReason::from_wire("stop"), ModelFinishReason::Stop);
        let other = ModelFinishReason::from_wire("function_call");
        assert_eq!(other, ModelFinishReason::Other("function_call".to_owned()));
        assert_eq!(other.to_string(), "function_call");
    }
}
