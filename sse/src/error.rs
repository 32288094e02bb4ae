//! Error types for the `sse` crate.
use std::error::Error as StdError;
use std::fmt;

/// Errors raised by the connection broker.
///
/// Follows the same shape as the other layers: an `error_kind` that callers
/// match on to decide how to react, and an optional `source` holding the
/// lower-level error that caused it.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// The kinds of failure the broker can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The response sink cannot be explicitly flushed, so events could never
    /// be pushed to the client. Raised by subscribe before any registration.
    StreamingUnsupported,
    /// Writing or flushing a single client's sink failed. Contained to that
    /// client; broadcast recovers by evicting it.
    SinkWriteFailure,
}

impl Error {
    pub fn streaming_unsupported() -> Self {
        Error {
            source: None,
            error_kind: ErrorKind::StreamingUnsupported,
        }
    }

    pub fn sink_write_failure<E>(source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error {
            source: Some(source.into()),
            error_kind: ErrorKind::SinkWriteFailure,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::StreamingUnsupported => write!(f, "streaming unsupported"),
            ErrorKind::SinkWriteFailure => write!(f, "sink write failure"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "SSE Error: {}: {source}", self.error_kind),
            None => write!(f, "SSE Error: {}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
