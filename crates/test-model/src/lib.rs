//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use toolchat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<PresetEvent>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            let event = match this.events.pop_front() {
                Some(PresetEvent::ContentDelta(delta)) => {
                    ModelResponseEvent::ContentDelta(delta)
                }
                Some(PresetEvent::ToolCallDelta(delta)) => {
                    ModelResponseEvent::ToolCallDelta(delta)
                }
                Some(PresetEvent::Finished(reason)) => {
                    ModelResponseEvent::Finished(reason)
                }
                Some(PresetEvent::DecodeError) => {
                    this.events.clear();
                    return Poll::Ready(Err(Error {
                        message: "malformed chunk",
                        kind: ErrorKind::Decode,
                    }));
                }
                // In case this method is called after completion.
                None => return Poll::Ready(Ok(None)),
            };
            return Poll::Ready(Ok(Some(event)));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct State {
    script: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. Responses are consumed in the
/// order they were added. If the script runs out, an error will be
/// returned.
///
/// Clones share the same script, so a clone can be kept to inspect the
/// requests after the provider is moved into a client.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.lock().script.push_back(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Takes the next scripted response without recording a request.
    pub fn next_response(&self) -> Result<TestModelResponse, Error> {
        let preset = self.lock().script.pop_front().ok_or(Error {
            message: "no enough steps",
            kind: ErrorKind::Other,
        })?;
        match preset.failure {
            Some(PresetFailure::Transport) => Err(Error {
                message: "API Error: 500 Internal Server Error",
                kind: ErrorKind::Transport,
            }),
            Some(PresetFailure::RateLimitExceeded) => Err(Error {
                message: "API Error: 429 Too Many Requests",
                kind: ErrorKind::RateLimitExceeded,
            }),
            None => Ok(TestModelResponse {
                events: preset.events.into(),
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked.
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.lock().requests.push(req.clone());
        ready(self.next_response())
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use serde_json::json;
    use toolchat_model::{Message, ModelFinishReason, ModelTool, ToolCallDelta};

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<Vec<ModelResponseEvent>, Error> {
        let mut resp = pin!(resp);
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            events.push(event);
        }
        Ok(events)
    }

    fn request(text: &str) -> ModelRequest {
        ModelRequest {
            messages: vec![Message::user(text)],
            tools: vec![ModelTool {
                name: "search_users".to_owned(),
                description: "Search users by name".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" }
                    }
                }),
            }],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::tool_call(
            "call_1",
            "search_users",
            r#"{"name":"Ann"}"#,
        ));
        provider.add_response(PresetResponse::text("Found 1 user: Ann Lee."));

        let resp = provider.send_request(&request("Hi")).await.unwrap();
        let events = collect_response(resp).await.unwrap();
        assert_eq!(
            events[0],
            ModelResponseEvent::ToolCallDelta(ToolCallDelta {
                index: 0,
                id: Some("call_1".to_owned()),
                name: Some("search_users".to_owned()),
                arguments: Some(r#"{"name""#.to_owned()),
            })
        );
        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Finished(ModelFinishReason::ToolCalls))
        );

        let resp = provider.send_request(&request("More")).await.unwrap();
        let events = collect_response(resp).await.unwrap();
        let text: String = events
            .iter()
            .filter_map(|event| match event {
                ModelResponseEvent::ContentDelta(delta) => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Found 1 user: Ann Lee.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages[0].content.as_deref(), Some("More"));

        let result = provider.send_request(&request("Again")).await;
        let err = result.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_failures() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_failure(
            PresetFailure::RateLimitExceeded,
        ));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::ContentDelta("partial".to_owned()),
            PresetEvent::DecodeError,
            PresetEvent::Finished(ModelFinishReason::Stop),
        ]));

        let err = provider.next_response().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        let resp = provider.next_response().unwrap();
        let err = collect_response(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
