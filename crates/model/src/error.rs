use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider is misconfigured, e.g. the API key is missing.
    Configuration,
    /// The endpoint could not be reached, or it responded with a
    /// non-success status.
    Transport,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The response stream contains a malformed payload.
    Decode,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ErrorKind::Decode => write!(f, "decode error"),
            ErrorKind::Other => write!(f, "other error"),
        }
    }
}
