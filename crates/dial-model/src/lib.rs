//! A model provider for DIAL, the OpenAI-compatible deployment gateway.
//!
//! Requests are sent to `{endpoint}/openai/deployments/{deployment}/chat/completions`
//! with an `api-key` header, and responses are always streamed.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use toolchat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};

pub use config::{DialConfig, DialConfigBuilder};
use io::{Chunks, Sse};
pub use response::DialResponse;

const API_KEY_HEADER: &str = "api-key";

/// Error type for [`DialProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code, if the endpoint responded with a
    /// non-success status.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

/// DIAL model provider.
#[derive(Clone, Debug)]
pub struct DialProvider {
    client: Client,
    config: Arc<DialConfig>,
}

impl DialProvider {
    /// Creates a new `DialProvider` with the given configuration.
    pub fn new(config: DialConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|err| {
                Error::new(
                    format!("failed to create the http client: {err}"),
                    ErrorKind::Configuration,
                )
            })?;
        info!("using endpoint: {}", config.completions_url());
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

impl ModelProvider for DialProvider {
    type Error = Error;
    type Response = DialResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let dial_req = proto::create_request(req);
        debug!(
            "sending {} messages with {} tools",
            req.messages.len(),
            req.tools.len()
        );
        trace!("request body: {dial_req:?}");
        let resp_fut = self
            .client
            .post(self.config.completions_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&dial_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;

            let status = resp.status();
            if status != StatusCode::OK {
                let body = match resp.text().await {
                    Ok(body) => body,
                    Err(err) => format!("<failed to read body: {err}>"),
                };
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Transport
                };
                error!("endpoint responded with {status}");
                return Err(Error {
                    message: format!("API Error: {} {body}", status.as_u16()),
                    kind,
                    status: Some(status.as_u16()),
                });
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                warn!("unexpected content type: {content_type:?}");
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(DialResponse::from_sse(sse))
        }
    }
}
