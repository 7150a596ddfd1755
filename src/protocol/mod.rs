//! Protocol module - wire format and frame types.
//!
//! - 11-byte header encoding/decoding
//! - Frame, Reply and Event structs with typed accessors

mod frame;
mod wire_format;

pub use frame::{build_frame, Event, Frame, Reply};
pub use wire_format::{
    flags, pack_command, validate_length, Header, ABSOLUTE_MAX_FRAME_LENGTH,
    DEFAULT_MAX_FRAME_LENGTH, HEADER_SIZE,
};
