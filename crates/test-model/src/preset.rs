use serde::{Deserialize, Serialize};
use toolchat_model::{ModelFinishReason, ToolCallDelta};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "content_delta")]
    ContentDelta(String),
    #[serde(rename = "tool_call_delta")]
    ToolCallDelta(ToolCallDelta),
    #[serde(rename = "finished")]
    Finished(ModelFinishReason),
    /// Fails the response with a decode error, as a malformed payload would.
    #[serde(rename = "decode_error")]
    DecodeError,
}

/// How a preset request fails before any event is streamed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetFailure {
    /// The endpoint responded with a non-success status.
    Transport,
    /// The endpoint responded with 429.
    RateLimitExceeded,
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails without streaming anything.
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a response that streams `text` in two fragments and
    /// finishes with `stop`.
    pub fn text(text: &str) -> Self {
        let (head, tail) = split_in_half(text);
        let mut events = vec![];
        for fragment in [head, tail] {
            if !fragment.is_empty() {
                events.push(PresetEvent::ContentDelta(fragment.to_owned()));
            }
        }
        events.push(PresetEvent::Finished(ModelFinishReason::Stop));
        Self::with_events(events)
    }

    /// Creates a response that requests one tool call and finishes with
    /// `tool_calls`. The arguments are streamed in two fragments.
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        Self::tool_calls([(id, name, arguments)])
    }

    /// Creates a response that requests several tool calls in order and
    /// finishes with `tool_calls`.
    pub fn tool_calls<'a>(
        calls: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Self {
        let mut events = vec![];
        for (index, (id, name, arguments)) in calls.into_iter().enumerate() {
            let (head, tail) = split_in_half(arguments);
            events.push(PresetEvent::ToolCallDelta(ToolCallDelta {
                index,
                id: Some(id.to_owned()),
                name: Some(name.to_owned()),
                arguments: Some(head.to_owned()),
            }));
            events.push(PresetEvent::ToolCallDelta(ToolCallDelta {
                index,
                id: None,
                name: None,
                arguments: Some(tail.to_owned()),
            }));
        }
        events.push(PresetEvent::Finished(ModelFinishReason::ToolCalls));
        Self::with_events(events)
    }

    /// Creates a response whose request fails.
    #[inline]
    pub fn with_failure(failure: PresetFailure) -> Self {
        Self {
            events: vec![],
            failure: Some(failure),
        }
    }
}

fn split_in_half(s: &str) -> (&str, &str) {
    let mut mid = s.len() / 2;
    while !s.is_char_boundary(mid) {
        mid += 1;
    }
    s.split_at(mid)
}
