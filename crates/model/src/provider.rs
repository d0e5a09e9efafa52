use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// An error raised by a chat-completion endpoint.
///
/// Errors cross the type-erased chat client as trait objects, so the kind
/// is the only thing callers can branch on.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns which part of the request failed.
    fn kind(&self) -> ErrorKind;
}

/// A streaming chat-completion endpoint.
///
/// Every call of [`send_request`] is one round of a completion: the request
/// carries the whole conversation and the tool declarations, and the
/// response streams back content and tool call fragments.
///
/// Providers hold configuration only. Nothing learned from one request may
/// change how the next one is sent.
///
/// [`send_request`]: ModelProvider::send_request
pub trait ModelProvider: Send + Sync {
    /// The error type of requests and their streams.
    type Error: ModelProviderError;

    /// The streamed response of one request.
    type Response: ModelResponse<Error = Self::Error>;

    /// Sends a streaming request.
    ///
    /// The future resolves once the endpoint accepted the request, with a
    /// response that has not read any event yet. A non-success status
    /// fails here rather than in the stream.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
