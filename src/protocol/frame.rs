//! Frame types with typed accessors.
//!
//! [`Frame`] is what the transport reads off the wire: a header plus its
//! payload. The router turns it into either a [`Reply`] or an [`Event`]
//! depending on whether its id is pending.
//!
//! # Example
//!
//! ```
//! use jdwp_client::protocol::{Frame, Header};
//! use bytes::Bytes;
//!
//! let frame = Frame::new(Header::command(3, 64, 100, 5), Bytes::from_static(b"hello"));
//! let event = frame.into_event();
//! assert_eq!(event.command_set, 64);
//! assert_eq!(event.command, 100);
//! assert_eq!(event.data(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{Header, HEADER_SIZE};

/// A complete protocol frame, not yet classified.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (`header.length - 11` of them).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Get the correlation id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.header.id
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Interpret the frame as the reply to a pending request.
    pub fn into_reply(self) -> Reply {
        Reply {
            id: self.header.id,
            flags: self.header.flags,
            error_code: self.header.error_code(),
            data: self.payload,
        }
    }

    /// Interpret the frame as an unsolicited event.
    pub fn into_event(self) -> Event {
        Event {
            id: self.header.id,
            flags: self.header.flags,
            command_set: self.header.command_set(),
            command: self.header.command_id(),
            data: self.payload,
        }
    }
}

/// Inbound reply, correlated to exactly one sent command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Id of the command this answers.
    pub id: u32,
    /// Raw flags byte.
    pub flags: u8,
    /// Zero on success.
    pub error_code: u16,
    /// Reply payload.
    pub data: Bytes,
}

impl Reply {
    /// Check whether the peer reported success.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error_code == 0
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Inbound event, unsolicited by any pending command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Id chosen by the peer.
    pub id: u32,
    /// Raw flags byte.
    pub flags: u8,
    pub command_set: u8,
    pub command: u8,
    /// Event payload.
    pub data: Bytes,
}

impl Event {
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Build a complete frame as a single byte vector.
///
/// The header's `length` is written as given; use [`Header::command`] or
/// [`Header::reply`] to have it derived from the payload.
///
/// # Example
///
/// ```
/// use jdwp_client::protocol::{build_frame, Header};
///
/// let bytes = build_frame(&Header::reply(42, 0, 5), b"hello");
/// assert_eq!(bytes.len(), 11 + 5); // header + payload
/// ```
pub fn build_frame(header: &Header, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}
