//! Codec failures.
//!
//! Every encode and decode error is a [`CodecError`]; [`CodecError::kind`]
//! sorts them into framing and schema problems for [`JdwpError`](crate::JdwpError).

use thiserror::Error;

use crate::error::ErrorKind;

/// Failure while encoding or decoding a payload against a [`Shape`](super::Shape).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ran out before the shape was satisfied.
    #[error("Truncated input: needed {needed} bytes, {have} remain")]
    Truncated {
        /// Bytes the next read required.
        needed: usize,
        /// Bytes left in the buffer.
        have: usize,
    },

    /// A top-level decode finished with bytes left over.
    #[error("Unread bytes at the end of the buffer: {0} remain")]
    TrailingBytes(usize),

    /// A tagged value carried a discriminant with no registered variant.
    #[error("Unknown discriminant {tag:#04x} in family '{family}'")]
    UnknownDiscriminant {
        /// Registry family that was consulted.
        family: String,
        /// Discriminant byte read from the wire.
        tag: u8,
    },

    /// A sequence referenced a counter that is not an earlier sibling.
    #[error("Counter field '{0}' is not declared before its sequence")]
    CounterNotFound(String),

    /// The counter field holds something other than a non-negative integer.
    #[error("Counter field '{0}' is not a non-negative integer")]
    InvalidCount(String),

    /// The shape cannot be walked (e.g. a sequence outside a record).
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Encode-side value did not agree with the shape.
    #[error("Value does not match shape: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Shape name.
        expected: String,
        /// Value kind that was supplied.
        found: String,
    },

    /// Encode-side record was missing a declared field.
    #[error("Missing record field '{0}'")]
    MissingField(String),

    /// Encode-side sequence length disagrees with its counter field.
    #[error("Sequence has {actual} elements but counter '{counter}' says {declared}")]
    CountMismatch {
        /// Counter field name.
        counter: String,
        /// Value of the counter field.
        declared: usize,
        /// Elements actually present.
        actual: usize,
    },

    /// String longer than a u32 length prefix can describe.
    #[error("String of {0} bytes is too long for a u32 length prefix")]
    StringTooLong(usize),

    /// Element count larger than an i32 count prefix can describe.
    #[error("Count of {0} elements is too large for an i32 prefix")]
    CountTooLarge(usize),
}

impl CodecError {
    /// Size problems are framing errors; everything else is a schema error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Truncated { .. } | CodecError::TrailingBytes(_) => ErrorKind::Framing,
            _ => ErrorKind::Schema,
        }
    }
}
