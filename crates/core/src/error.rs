use std::error::Error as StdError;
use std::fmt::{self, Display};

use toolchat_model::{ErrorKind, ModelProviderError};

/// The error type for [`ChatClient::complete`](crate::ChatClient::complete).
#[derive(Debug)]
pub enum Error {
    /// The model provider failed to serve a request, e.g. the endpoint
    /// responded with a non-success status or the stream is malformed.
    Model(Box<dyn ModelProviderError>),
    /// The model kept requesting tools after `max_rounds` tool-call rounds.
    ToolLoopExceeded {
        /// The configured round limit.
        max_rounds: usize,
    },
    /// The stream ended while the tool call at `index` still had no id or
    /// no name, so it cannot be answered.
    IncompleteToolCall {
        /// The position of the tool call in the response.
        index: usize,
    },
}

impl Error {
    /// Returns the kind of the provider error, if this is one.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Model(err) => Some(err.kind()),
            Error::ToolLoopExceeded { .. }
            | Error::IncompleteToolCall { .. } => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Model(err) => write!(f, "model request failed: {err}"),
            Error::ToolLoopExceeded { max_rounds } => {
                write!(f, "tool loop exceeded {max_rounds} rounds")
            }
            Error::IncompleteToolCall { index } => {
                write!(f, "tool call {index} has no id or name")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Model(err) => Some(err.as_ref()),
            Error::ToolLoopExceeded { .. }
            | Error::IncompleteToolCall { .. } => None,
        }
    }
}
