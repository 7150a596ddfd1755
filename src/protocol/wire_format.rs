//! Wire format encoding and decoding.
//!
//! Implements the 11-byte frame header:
//! ```text
//! ┌──────────┬──────────┬───────┬──────────────────────────┐
//! │ Length   │ Id       │ Flags │ Tail                     │
//! │ 4 bytes  │ 4 bytes  │ 1 byte│ 2 bytes                  │
//! │ uint32 BE│ uint32 BE│       │ ErrCode (reply)          │
//! │          │          │       │ CommandSet, Command      │
//! └──────────┴──────────┴───────┴──────────────────────────┘
//! ```
//!
//! `Length` counts the whole frame, header included, so the payload is
//! `Length - 11` bytes. All multi-byte integers are Big Endian.

use crate::error::{JdwpError, Result};

/// Header size in bytes (fixed, exactly 11).
pub const HEADER_SIZE: usize = 11;

/// Default upper bound on a frame's declared length (64 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: u32 = 64 * 1024 * 1024;

/// Absolute maximum frame length (the protocol's length is a signed int).
pub const ABSOLUTE_MAX_FRAME_LENGTH: u32 = i32::MAX as u32;

/// Flag constants for the protocol.
pub mod flags {
    /// Set by the peer on replies. Routing never relies on it.
    pub const REPLY: u8 = 0x80;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded header from wire format.
///
/// `tail` is kept raw: whether it is an error code or a command pair depends
/// on whether `id` belongs to a pending request, which only the router knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total frame size including this header.
    pub length: u32,
    /// Correlation id.
    pub id: u32,
    /// Flags byte (see `flags` module).
    pub flags: u8,
    /// Error code, or `(command_set << 8) | command`.
    pub tail: u16,
}

impl Header {
    /// Create a new header.
    pub fn new(length: u32, id: u32, flags: u8, tail: u16) -> Self {
        Self {
            length,
            id,
            flags,
            tail,
        }
    }

    /// Header for an outbound command carrying `payload_len` bytes.
    pub fn command(id: u32, command_set: u8, command: u8, payload_len: u32) -> Self {
        Self::new(
            payload_len.saturating_add(HEADER_SIZE as u32),
            id,
            0,
            pack_command(command_set, command),
        )
    }

    /// Header for a reply carrying `payload_len` bytes.
    pub fn reply(id: u32, error_code: u16, payload_len: u32) -> Self {
        Self::new(
            payload_len.saturating_add(HEADER_SIZE as u32),
            id,
            flags::REPLY,
            error_code,
        )
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use jdwp_client::protocol::Header;
    ///
    /// let header = Header::command(1, 1, 7, 0);
    /// assert_eq!(header.encode(), [0, 0, 0, 11, 0, 0, 0, 1, 0, 1, 7]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (11 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..4].copy_from_slice(&self.length.to_be_bytes());
        buf[4..8].copy_from_slice(&self.id.to_be_bytes());
        buf[8] = self.flags;
        buf[9..11].copy_from_slice(&self.tail.to_be_bytes());
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use jdwp_client::protocol::Header;
    ///
    /// let bytes = [0, 0, 0, 15, 0, 0, 0, 42, 0x80, 0, 0];
    /// let header = Header::decode(&bytes).unwrap();
    /// assert_eq!(header.id, 42);
    /// assert_eq!(header.payload_length(), 4);
    /// ```
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            length: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            id: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            flags: buf[8],
            tail: u16::from_be_bytes([buf[9], buf[10]]),
        })
    }

    /// Validate the declared length.
    ///
    /// Checks:
    /// - Length covers at least the header
    /// - Length doesn't exceed `max_frame_length`
    pub fn validate(&self, max_frame_length: u32) -> Result<()> {
        validate_length(self.length, max_frame_length)
    }

    /// Payload size implied by `length` (zero if the length is invalid).
    #[inline]
    pub fn payload_length(&self) -> usize {
        (self.length as usize).saturating_sub(HEADER_SIZE)
    }

    /// Tail read as a reply error code.
    #[inline]
    pub fn error_code(&self) -> u16 {
        self.tail
    }

    /// High byte of the tail.
    #[inline]
    pub fn command_set(&self) -> u8 {
        (self.tail >> 8) as u8
    }

    /// Low byte of the tail.
    #[inline]
    pub fn command_id(&self) -> u8 {
        (self.tail & 0xff) as u8
    }

    /// Check whether the peer marked this frame as a reply.
    #[inline]
    pub fn is_reply_flagged(&self) -> bool {
        flags::has_flag(self.flags, flags::REPLY)
    }
}

/// Combine a command set and command into the 16-bit tail.
#[inline]
pub fn pack_command(command_set: u8, command: u8) -> u16 {
    ((command_set as u16) << 8) | command as u16
}

/// Check a declared frame length against the header size and `max`.
pub fn validate_length(length: u32, max: u32) -> Result<()> {
    if (length as usize) < HEADER_SIZE || length > max {
        return Err(JdwpError::InvalidLength {
            length,
            min: HEADER_SIZE as u32,
            max,
        });
    }
    Ok(())
}
