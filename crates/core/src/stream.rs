//! Reduces streamed model events into a complete assistant message.

use std::future::poll_fn;
use std::pin::pin;

use toolchat_model::{
    MAX_TOOL_CALLS, Message, ModelFinishReason, ModelResponse,
    ModelResponseEvent, ToolCall, ToolCallDelta,
};

/// A completely received response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedResponse {
    /// The assistant message built from the stream.
    pub message: Message,
    /// The reason the model finished generating, if it declared one.
    pub finish_reason: Option<ModelFinishReason>,
}

/// Scratch state for one streamed response.
///
/// Tool call fragments are merged by their index rather than arrival order,
/// so fragments for a later call may arrive before the earlier ones.
#[derive(Clone, Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<ModelFinishReason>,
}

impl StreamAccumulator {
    /// Creates an empty accumulator.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges an event into the accumulated state.
    pub fn push_event(&mut self, event: ModelResponseEvent) {
        match event {
            ModelResponseEvent::ContentDelta(delta) => {
                self.content.push_str(&delta);
            }
            ModelResponseEvent::ToolCallDelta(delta) => {
                self.merge_tool_call(delta);
            }
            ModelResponseEvent::Finished(reason) => {
                // The first declared reason wins.
                self.finish_reason.get_or_insert(reason);
            }
        }
    }

    fn merge_tool_call(&mut self, delta: ToolCallDelta) {
        if delta.index >= MAX_TOOL_CALLS {
            error!("dropping tool call fragment at index {}", delta.index);
            return;
        }
        if self.tool_calls.len() <= delta.index {
            self.tool_calls
                .resize_with(delta.index + 1, ToolCall::default);
        }
        let tool_call = &mut self.tool_calls[delta.index];
        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            tool_call.id = id;
        }
        if let Some(name) = delta.name.filter(|name| !name.is_empty()) {
            tool_call.name = name;
        }
        if let Some(arguments) = delta.arguments {
            tool_call.arguments.push_str(&arguments);
        }
    }

    /// Returns the finish reason seen so far.
    #[inline]
    pub fn finish_reason(&self) -> Option<&ModelFinishReason> {
        self.finish_reason.as_ref()
    }

    /// Reduces the accumulated state into an assistant message.
    pub fn finish(self) -> DecodedResponse {
        let content = if self.content.is_empty() {
            None
        } else {
            Some(self.content)
        };
        DecodedResponse {
            message: Message::assistant(content, self.tool_calls),
            finish_reason: self.finish_reason,
        }
    }
}

/// Consumes a response until the end of stream.
///
/// Every non-empty content fragment is passed to `on_content` as soon as it
/// arrives. If the response fails, the error is returned and everything
/// accumulated so far is discarded.
pub async fn decode<R: ModelResponse>(
    resp: R,
    on_content: &(dyn Fn(&str) + Send + Sync),
) -> Result<DecodedResponse, R::Error> {
    let mut accumulator = StreamAccumulator::new();
    let mut resp = pin!(resp);

    trace!("start receiving events");
    while let Some(event) =
        poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
    {
        trace!("got an event: {event:?}");
        if let ModelResponseEvent::ContentDelta(delta) = &event {
            if delta.is_empty() {
                continue;
            }
            on_content(delta);
        }
        accumulator.push_event(event);
    }
    trace!("finished receiving events");

    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use toolchat_model::Role;
    use toolchat_test_model::{PresetEvent, PresetResponse, TestModelProvider};

    use super::*;

    fn header(index: usize, id: &str, name: &str) -> ModelResponseEvent {
        ModelResponseEvent::ToolCallDelta(ToolCallDelta {
            index,
            id: Some(id.to_owned()),
            name: Some(name.to_owned()),
            arguments: None,
        })
    }

    fn arguments(index: usize, fragment: &str) -> ModelResponseEvent {
        ModelResponseEvent::ToolCallDelta(ToolCallDelta {
            index,
            id: None,
            name: None,
            arguments: Some(fragment.to_owned()),
        })
    }

    #[test]
    fn test_content_only() {
        let mut accumulator = StreamAccumulator::new();
        for delta in ["Found ", "1 user", ": Ann Lee."] {
            let event = ModelResponseEvent::ContentDelta(delta.to_owned());
            accumulator.push_event(event);
        }
        accumulator
            .push_event(ModelResponseEvent::Finished(ModelFinishReason::Stop));

        let resp = accumulator.finish();
        assert_eq!(resp.message.role, Role::Assistant);
        assert_eq!(
            resp.message.content.as_deref(),
            Some("Found 1 user: Ann Lee.")
        );
        assert_eq!(resp.message.tool_calls, None);
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
    }

    #[test]
    fn test_out_of_order_tool_calls() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.push_event(header(1, "call_b", "get_user_by_id"));
        accumulator.push_event(header(0, "call_a", "search_users"));
        accumulator.push_event(arguments(1, "{\"id\":"));
        accumulator.push_event(arguments(0, "{\"name\":"));
        // Late fragments with empty id and name must not clear them.
        accumulator.push_event(header(1, "", ""));
        accumulator.push_event(arguments(1, "42}"));
        accumulator.push_event(arguments(0, "\"Ann\"}"));

        let resp = accumulator.finish();
        assert_eq!(resp.message.content, None);
        assert_eq!(
            resp.message.tool_calls(),
            [
                ToolCall {
                    id: "call_a".to_owned(),
                    name: "search_users".to_owned(),
                    arguments: "{\"name\":\"Ann\"}".to_owned(),
                },
                ToolCall {
                    id: "call_b".to_owned(),
                    name: "get_user_by_id".to_owned(),
                    arguments: "{\"id\":42}".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_sparse_index_grows_with_placeholders() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.push_event(header(2, "call_c", "update_user"));
        accumulator.push_event(arguments(2, "{}"));

        let resp = accumulator.finish();
        let tool_calls = resp.message.tool_calls();
        assert_eq!(tool_calls.len(), 3);
        assert_eq!(tool_calls[0], ToolCall::default());
        assert_eq!(tool_calls[1], ToolCall::default());
        assert_eq!(tool_calls[2].arguments, "{}");
    }

    #[test]
    fn test_index_out_of_range_is_dropped() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.push_event(header(0, "call_a", "search_users"));
        accumulator.push_event(header(100_000_000_000, "call_x", "explode"));
        accumulator.push_event(arguments(MAX_TOOL_CALLS, "{}"));

        let resp = accumulator.finish();
        let tool_calls = resp.message.tool_calls();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].id, "call_a");
    }

    #[test]
    fn test_first_finish_reason_wins() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.push_event(ModelResponseEvent::Finished(
            ModelFinishReason::ToolCalls,
        ));
        accumulator
            .push_event(ModelResponseEvent::Finished(ModelFinishReason::Stop));
        assert_eq!(
            accumulator.finish_reason(),
            Some(&ModelFinishReason::ToolCalls)
        );
    }

    #[test]
    fn test_empty_stream() {
        let resp = StreamAccumulator::new().finish();
        assert_eq!(resp.message.role, Role::Assistant);
        assert_eq!(resp.message.content, None);
        assert_eq!(resp.message.tool_calls, None);
        assert_eq!(resp.finish_reason, None);
    }

    #[tokio::test]
    async fn test_decode_emits_content() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::ContentDelta("Hello, ".to_owned()),
            PresetEvent::ContentDelta(String::new()),
            PresetEvent::ContentDelta("world!".to_owned()),
            PresetEvent::Finished(ModelFinishReason::Stop),
        ]));

        let resp = provider.next_response().unwrap();
        let emitted = Mutex::new(vec![]);
        let decoded = decode(resp, &|delta: &str| {
            emitted.lock().unwrap().push(delta.to_owned());
        })
        .await
        .unwrap();

        assert_eq!(*emitted.lock().unwrap(), ["Hello, ", "world!"]);
        assert_eq!(
            decoded.message.content.as_deref(),
            Some("Hello, world!")
        );
    }

    #[tokio::test]
    async fn test_decode_error_discards_partial_message() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::ContentDelta("partial".to_owned()),
            PresetEvent::DecodeError,
        ]));

        let resp = provider.next_response().unwrap();
        let result = decode(resp, &|_: &str| {}).await;
        assert!(result.is_err());
    }
}
