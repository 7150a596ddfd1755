//! Transport module - handshake, framed I/O, the writer task and connection
//! lifecycle.
//!
//! Works over any `AsyncRead + AsyncWrite` stream; [`connect`] provides the
//! usual TCP setup.

mod framed;
mod handshake;
mod state;
mod tcp;
mod writer;

pub use framed::{FrameReader, FrameWriter};
pub use handshake::{accept_handshake, handshake, HANDSHAKE};
pub use state::{ConnectionState, StateCell};
pub use tcp::connect;
pub use writer::{
    spawn_writer_task, OutboundFrame, WriterHandle, Written, DEFAULT_OUTBOUND_CAPACITY,
};
