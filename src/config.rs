//! Session configuration.
//!
//! Defaults suit a local debuggee. Values can come from code through
//! [`SessionBuilder`](crate::SessionBuilder) or from a JSON document:
//!
//! ```
//! use jdwp_client::SessionConfig;
//!
//! let config = SessionConfig::from_json(r#"{ "event_capacity": 8 }"#).unwrap();
//! assert_eq!(config.event_capacity, 8);
//! assert_eq!(config.handshake, "JDWP-Handshake");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{ABSOLUTE_MAX_FRAME_LENGTH, DEFAULT_MAX_FRAME_LENGTH};
use crate::transport::{DEFAULT_OUTBOUND_CAPACITY, HANDSHAKE};

/// Default capacity of the inbound event queue.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Tunables for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Events buffered before the reader blocks.
    pub event_capacity: usize,
    /// Frames queued for the writer task before `send` waits.
    pub outbound_capacity: usize,
    /// Largest accepted frame, header included.
    pub max_frame_length: u32,
    /// TCP connect timeout in milliseconds; `None` waits indefinitely.
    pub connect_timeout_ms: Option<u64>,
    /// Handshake literal.
    pub handshake: String,
}

impl SessionConfig {
    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Connect timeout as a [`Duration`].
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Clamp values into their legal ranges.
    pub fn normalized(mut self) -> Self {
        self.event_capacity = self.event_capacity.max(1);
        self.outbound_capacity = self.outbound_capacity.max(1);
        self.max_frame_length = self.max_frame_length.min(ABSOLUTE_MAX_FRAME_LENGTH);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            connect_timeout_ms: None,
            handshake: String::from_utf8_lossy(HANDSHAKE).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JdwpError;

    #[test]
    fn test_default() {
        let config = SessionConfig::default();
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.outbound_capacity, DEFAULT_OUTBOUND_CAPACITY);
        assert_eq!(config.max_frame_length, DEFAULT_MAX_FRAME_LENGTH);
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{"connect_timeout_ms": 1500, "event_capacity": 0, "outbound_capacity": 0}"#;
        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.outbound_capacity, 1);
        assert_eq!(config.max_frame_length, DEFAULT_MAX_FRAME_LENGTH);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = SessionConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, JdwpError::Config(_)));
    }
}
