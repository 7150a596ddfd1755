//! Error types for jdwp-client.
//!
//! Every failure surfaces as a [`JdwpError`]. Callers that need to react to
//! the category of a failure rather than its exact variant use
//! [`JdwpError::kind`], which sorts errors into the four groups of
//! [`ErrorKind`].

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

use crate::codec::CodecError;

/// Category of a [`JdwpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The byte stream itself failed: I/O, handshake, connection closed.
    Transport,
    /// A frame or payload had the wrong size.
    Framing,
    /// Bytes did not match the schema, or the schema itself is unusable.
    Schema,
    /// The peer answered with a non-zero error code.
    Application,
}

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum JdwpError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer did not echo the handshake literal.
    #[error("Handshake mismatch: expected {expected:?}, received {received:?}")]
    HandshakeMismatch {
        /// Literal we sent.
        expected: String,
        /// Bytes we got back (lossy UTF-8).
        received: String,
    },

    /// Connection closed, either by the peer or by [`Session::close`](crate::Session::close).
    #[error("Connection closed")]
    ConnectionClosed,

    /// TCP connect did not complete in time.
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Frame header declared an impossible length.
    #[error("Invalid frame length {length} (min {min}, max {max})")]
    InvalidLength {
        /// Declared total length.
        length: u32,
        /// Smallest legal value (the header size).
        min: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// Stream ended in the middle of a frame.
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes the frame still needed.
        expected: usize,
        /// Bytes actually read before EOF.
        received: usize,
    },

    /// Payload encode/decode failure.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Non-zero reply error code.
    #[error("{0}")]
    Application(#[from] ReplyError),

    /// [`Session::events`](crate::Session::events) was called twice.
    #[error("Event stream already taken")]
    EventsTaken,

    /// Configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl JdwpError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            JdwpError::Io(_)
            | JdwpError::HandshakeMismatch { .. }
            | JdwpError::ConnectionClosed
            | JdwpError::ConnectTimeout(_) => ErrorKind::Transport,
            JdwpError::InvalidLength { .. } | JdwpError::Truncated { .. } => ErrorKind::Framing,
            JdwpError::Codec(e) => e.kind(),
            JdwpError::Application(_) => ErrorKind::Application,
            JdwpError::EventsTaken | JdwpError::Config(_) => ErrorKind::Schema,
        }
    }

    /// Reply error code, if this is an application error.
    pub fn error_code(&self) -> Option<u16> {
        match self {
            JdwpError::Application(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Result type alias using JdwpError.
pub type Result<T> = std::result::Result<T, JdwpError>;

/// A non-zero error code carried by a reply, with its resolved message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (error code {code})")]
pub struct ReplyError {
    /// Raw error code from the reply header.
    pub code: u16,
    /// Message from the [`ErrorTable`], or a placeholder.
    pub message: String,
}

/// Lookup table from reply error codes to messages.
///
/// Built once and handed to the session. Codes without an entry resolve to
/// `"unregistered error N"`.
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    messages: BTreeMap<u16, String>,
}

impl ErrorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message for a code, replacing any previous one.
    pub fn register(&mut self, code: u16, message: impl Into<String>) {
        self.messages.insert(code, message.into());
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, code: u16, message: impl Into<String>) -> Self {
        self.register(code, message);
        self
    }

    /// Registered message for a code.
    #[inline]
    pub fn get(&self, code: u16) -> Option<&str> {
        self.messages.get(&code).map(String::as_str)
    }

    /// Resolve a code into a [`ReplyError`], synthesizing a placeholder when
    /// the code is unknown.
    pub fn resolve(&self, code: u16) -> ReplyError {
        let message = match self.get(code) {
            Some(m) => m.to_string(),
            None => format!("unregistered error {}", code),
        };
        ReplyError { code, message }
    }

    /// Number of registered codes.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_table_resolve_registered() {
        let table = ErrorTable::new().with(20, "invalid object");
        let err = table.resolve(20);
        assert_eq!(err.code, 20);
        assert_eq!(err.message, "invalid object");
        assert_eq!(err.to_string(), "invalid object (error code 20)");
    }

    #[test]
    fn test_error_table_resolve_unregistered() {
        let table = ErrorTable::new();
        let err = table.resolve(999);
        assert_eq!(err.message, "unregistered error 999");
        assert!(table.is_empty());
    }

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(JdwpError::ConnectionClosed.kind(), ErrorKind::Transport);
        assert_eq!(
            JdwpError::Truncated {
                expected: 4,
                received: 1
            }
            .kind(),
            ErrorKind::Framing
        );
        assert_eq!(
            JdwpError::from(CodecError::TrailingBytes(3)).kind(),
            ErrorKind::Framing
        );
        assert_eq!(
            JdwpError::from(CodecError::UnknownDiscriminant {
                family: "event".into(),
                tag: 200
            })
            .kind(),
            ErrorKind::Schema
        );

        let app = JdwpError::from(ErrorTable::new().resolve(21));
        assert_eq!(app.kind(), ErrorKind::Application);
        assert_eq!(app.error_code(), Some(21));
    }
}
