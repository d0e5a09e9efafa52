use std::pin::Pin;
use std::sync::Arc;

use toolchat_model::{ModelProvider, ModelProviderError, ModelRequest};
use tracing::Instrument;

use crate::stream::{DecodedResponse, decode};

pub(crate) type OnContent = Arc<dyn Fn(&str) + Send + Sync>;

type SendRequestResult = Result<DecodedResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, OnContent) -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that sends a request and decodes the
/// streamed response, providing a type-erased interface for the other
/// modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_content| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    let resp = fut.await.map_err(|err| {
                        error!("request failed: {err}");
                        Box::new(err) as Box<dyn ModelProviderError>
                    })?;
                    decode(resp, &*on_content).await.map_err(|err| {
                        error!("response failed: {err}");
                        Box::new(err) as Box<dyn ModelProviderError>
                    })
                }
                .instrument(debug_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the decoded response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_content: OnContent,
    ) -> SendRequestResult {
        (self.handler_fn)(req, on_content).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use toolchat_model::{ErrorKind, Message, ModelFinishReason};
    use toolchat_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[tokio::test]
    async fn test_send_request() {
        let model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.add_response(PresetResponse::text("How are you?"));
        }
        let model_client = ModelClient::new(model_provider);

        for _ in 0..3 {
            let on_content_called = Arc::new(AtomicBool::new(false));
            let resp = model_client
                .send_request(
                    ModelRequest {
                        messages: vec![Message::user("Hi")],
                        tools: vec![],
                    },
                    {
                        let on_content_called = Arc::clone(&on_content_called);
                        Arc::new(move |_: &str| {
                            on_content_called.store(true, Ordering::Relaxed);
                        })
                    },
                )
                .await
                .unwrap();
            assert_eq!(resp.message.content.as_deref(), Some("How are you?"));
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
            assert!(on_content_called.load(Ordering::Relaxed));
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let model_client = ModelClient::new(model_provider);
        let resp_or_err = model_client
            .send_request(
                ModelRequest {
                    messages: vec![Message::user("Hi")],
                    tools: vec![],
                },
                Arc::new(|_: &str| {}),
            )
            .await;
        let err = resp_or_err.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
