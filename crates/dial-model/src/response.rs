use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use toolchat_model::{ErrorKind, ModelResponse, ModelResponseEvent};

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{self, ChatCompletionChunk};

const DONE_SENTINEL: &str = "[DONE]";

struct PartialState {
    sse: Sse,
    // One chunk may carry several events, they are drained before reading
    // the next line.
    pending_events: VecDeque<ModelResponseEvent>,
    done: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct DialResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl DialResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_events: Default::default(),
            done: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for DialResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        // Dropping the state on completion or error releases the connection.
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    loop {
        if let Some(event) = partial_state.pending_events.pop_front() {
            return Ok((Some(event), partial_state));
        }
        if partial_state.done {
            return Ok((None, partial_state));
        }

        let data = match partial_state.sse.next_data().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!("stream ended without the {DONE_SENTINEL} sentinel");
                partial_state.done = true;
                continue;
            }
            Err(SseError::ChunksError(err)) => {
                return Err(Error::new(
                    format!("failed to read the stream: {}", err.0),
                    ErrorKind::Transport,
                ));
            }
            Err(SseError::InvalidPayload) => {
                return Err(Error::new(
                    "stream payload is not valid UTF-8",
                    ErrorKind::Decode,
                ));
            }
        };
        trace!("got sse data: {data}");
        if data == DONE_SENTINEL {
            partial_state.done = true;
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
            .map_err(|err| {
                Error::new(format!("malformed chunk: {err}"), ErrorKind::Decode)
            })?;
        partial_state
            .pending_events
            .extend(proto::chunk_events(chunk)?);
    }
}
