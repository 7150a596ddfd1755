//! # jdwp-client
//!
//! Async client for the Java Debug Wire Protocol.
//!
//! A debugger opens one TCP connection to the target VM, exchanges the
//! `JDWP-Handshake` literal and then talks in length-prefixed frames. Commands
//! and their replies share an id; anything else the VM sends is an event.
//!
//! ## Architecture
//!
//! - **Transport** ([`transport`]): handshake, frame reader and writer, writer task, TCP dial
//! - **Router** ([`router`]): pending reply slots and the single reader task
//! - **Session** ([`Session`]): send, call, dispose, events, close
//! - **Codec** ([`codec`]): schema-driven encoder and decoder over [`codec::Value`]
//! - **Vocabulary** ([`jdwp`]): command constants, reply shapes, error table
//!
//! ## Example
//!
//! ```no_run
//! use jdwp_client::jdwp::{EventKind, EventRequestSet, SuspendPolicy};
//! use jdwp_client::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::dial("127.0.0.1:5005").await?;
//!     let mut events = session.events()?;
//!
//!     let version = session.vm_version().await?;
//!     println!("{}", serde_json::to_string_pretty(&version)?);
//!
//!     let request = EventRequestSet::new(EventKind::ClassPrepare, SuspendPolicy::None)
//!         .class_match("com.example.*");
//!     session.set_event_request(&request).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if let Some(body) = session.decode_composite(&event) {
//!             println!("{}", serde_json::to_string(&body?)?);
//!         }
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod jdwp;
pub mod protocol;
pub mod router;
pub mod transport;

mod session;

pub use config::SessionConfig;
pub use error::{ErrorKind, ErrorTable, JdwpError, ReplyError, Result};
pub use router::ReplyReceiver;
pub use session::{EventStream, Session, SessionBuilder};
