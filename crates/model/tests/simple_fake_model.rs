use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::{Pin, pin};
use std::task::{self, Poll};

use toolchat_model::{
    ErrorKind, MAX_TOOL_CALLS, Message, ModelFinishReason, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ModelTool, Role, ToolCall, ToolCallDelta,
};

#[derive(Debug)]
struct LookupError(ErrorKind);

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "lookup failed: {}", self.0)
    }
}

impl Error for LookupError {}

impl ModelProviderError for LookupError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Replays a fixed list of events.
struct ReplayResponse {
    events: VecDeque<ModelResponseEvent>,
}

impl ModelResponse for ReplayResponse {
    type Error = LookupError;

    fn poll_next_event(
        mut self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.events.pop_front()))
    }
}

/// A model that always looks the user up before answering.
///
/// Without a tool result in the conversation it calls the first declared
/// tool, splitting the arguments over two fragments. Once a result is
/// present it answers with that result.
struct LookupModel;

impl LookupModel {
    fn respond(req: &ModelRequest) -> Result<ReplayResponse, LookupError> {
        let last = req
            .messages
            .last()
            .ok_or(LookupError(ErrorKind::Other))?;

        let events = if last.role == Role::Tool {
            let content = last.content.clone().unwrap_or_default();
            vec![
                ModelResponseEvent::ContentDelta(content),
                ModelResponseEvent::Finished(ModelFinishReason::Stop),
            ]
        } else {
            let tool =
                req.tools.first().ok_or(LookupError(ErrorKind::Other))?;
            vec![
                ModelResponseEvent::ToolCallDelta(ToolCallDelta {
                    index: 0,
                    id: Some("call_1".to_owned()),
                    name: Some(tool.name.clone()),
                    arguments: Some("{\"name\":".to_owned()),
                }),
                ModelResponseEvent::ToolCallDelta(ToolCallDelta {
                    index: 0,
                    arguments: Some("\"Ann\"}".to_owned()),
                    ..Default::default()
                }),
                ModelResponseEvent::Finished(ModelFinishReason::ToolCalls),
            ]
        };
        Ok(ReplayResponse {
            events: events.into(),
        })
    }
}

impl ModelProvider for LookupModel {
    type Error = LookupError;
    type Response = ReplayResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(Self::respond(req))
    }
}

async fn collect(resp: ReplayResponse) -> Vec<ModelResponseEvent> {
    let mut resp = pin!(resp);
    let mut events = vec![];
    while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
        .await
        .unwrap()
    {
        events.push(event);
    }
    events
}

fn search_tool() -> ModelTool {
    ModelTool {
        name: "search_users".to_owned(),
        description: "Search users by name".to_owned(),
        parameters: serde_json::json!({ "type": "object" }),
    }
}

#[tokio::test]
async fn test_tool_call_round_trip() {
    let mut req = ModelRequest {
        messages: vec![Message::user("list users named Ann")],
        tools: vec![search_tool()],
    };

    let resp = LookupModel.send_request(&req).await.unwrap();
    let events = collect(resp).await;
    let mut call = ToolCall::default();
    for event in &events {
        if let ModelResponseEvent::ToolCallDelta(delta) = event {
            assert!(delta.index < MAX_TOOL_CALLS);
            if let Some(id) = &delta.id {
                call.id = id.clone();
            }
            if let Some(name) = &delta.name {
                call.name = name.clone();
            }
            if let Some(arguments) = &delta.arguments {
                call.arguments.push_str(arguments);
            }
        }
    }
    assert_eq!(
        events.last(),
        Some(&ModelResponseEvent::Finished(ModelFinishReason::ToolCalls))
    );
    assert_eq!(call.name, "search_users");
    assert_eq!(call.arguments, r#"{"name":"Ann"}"#);

    req.messages.push(Message::assistant(None, vec![call]));
    req.messages.push(Message::tool_result(
        "call_1",
        "search_users",
        "Found 1 user: Ann Lee.",
    ));
    let resp = LookupModel.send_request(&req).await.unwrap();
    assert_eq!(
        collect(resp).await,
        vec![
            ModelResponseEvent::ContentDelta("Found 1 user: Ann Lee.".to_owned()),
            ModelResponseEvent::Finished(ModelFinishReason::Stop),
        ]
    );
}

#[tokio::test]
async fn test_error_kind() {
    let req = ModelRequest {
        messages: vec![Message::user("Hi")],
        tools: vec![],
    };
    let err = LookupModel.send_request(&req).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert_eq!(err.to_string(), "lookup failed: other error");
}
