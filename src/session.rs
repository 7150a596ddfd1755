//! Session builder and connection lifecycle.
//!
//! The [`SessionBuilder`] collects configuration, the tag registry and the
//! error table, then opens a [`Session`] over any byte stream:
//! 1. Exchange the handshake literal
//! 2. Split the stream into read and write halves
//! 3. Spawn the reader task that routes replies and events
//! 4. Spawn the writer task that owns the write half
//! 5. Hand out ids and queue commands under one outbound lock
//!
//! # Example
//!
//! ```no_run
//! use jdwp_client::jdwp::{command_set, virtual_machine};
//! use jdwp_client::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::builder()
//!         .event_capacity(128)
//!         .dial("127.0.0.1:5005")
//!         .await?;
//!
//!     let reply = session
//!         .call_checked(command_set::VIRTUAL_MACHINE, virtual_machine::VERSION, &[])
//!         .await?;
//!     println!("{} bytes of version info", reply.data.len());
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::ToSocketAddrs;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::codec::{decode, Shape, TagRegistry, Value};
use crate::config::SessionConfig;
use crate::error::{ErrorTable, JdwpError, Result};
use crate::jdwp;
use crate::protocol::{Event, Reply};
use crate::router::{read_loop, PendingTable, ReplyReceiver};
use crate::transport::{
    connect, handshake, spawn_writer_task, ConnectionState, FrameReader, FrameWriter, StateCell,
    WriterHandle,
};

/// Builder for configuring and opening a [`Session`].
pub struct SessionBuilder {
    config: SessionConfig,
    registry: TagRegistry,
    errors: ErrorTable,
}

impl SessionBuilder {
    /// Builder with default config and the full JDWP registry and error table.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            registry: jdwp::default_registry(),
            errors: jdwp::error_table(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry used by [`Session::decode`] and [`Session::call_decode`].
    pub fn registry(mut self, registry: TagRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Table used to turn reply codes into [`JdwpError::Application`].
    pub fn error_table(mut self, errors: ErrorTable) -> Self {
        self.errors = errors;
        self
    }

    /// Set the event queue capacity.
    ///
    /// When the queue is full the reader waits, which also holds back replies.
    /// Default: 64
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Set the outbound frame queue capacity.
    ///
    /// When the queue is full `send` waits for the writer task.
    /// Default: 64
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = capacity;
        self
    }

    /// Set the largest accepted inbound frame.
    ///
    /// Default: 64 MiB
    pub fn max_frame_length(mut self, max: u32) -> Self {
        self.config.max_frame_length = max;
        self
    }

    /// Set the handshake literal.
    pub fn handshake(mut self, literal: impl Into<String>) -> Self {
        self.config.handshake = literal.into();
        self
    }

    /// Bound the TCP connect in [`dial`](Self::dial).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Connect over TCP and open a session on the stream.
    pub async fn dial<A: ToSocketAddrs>(self, addr: A) -> Result<Session> {
        let stream = connect(addr, self.config.connect_timeout()).await?;
        self.open(stream).await
    }

    /// Handshake on an already connected stream and start the reader.
    ///
    /// On a failed handshake the stream is shut down and the error returned.
    pub async fn open<S>(self, mut stream: S) -> Result<Session>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let config = self.config.normalized();
        let state = StateCell::new(ConnectionState::NotConnected);

        state.set(ConnectionState::Handshaking);
        if let Err(e) = handshake(&mut stream, config.handshake.as_bytes()).await {
            tracing::warn!("Handshake failed: {}", e);
            let _ = stream.shutdown().await;
            state.set(ConnectionState::Closed);
            return Err(e);
        }
        state.set(ConnectionState::Open);

        let (read_half, write_half) = tokio::io::split(stream);
        let pending = Arc::new(PendingTable::new());
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reader = FrameReader::with_max_frame_length(read_half, config.max_frame_length);
        let pending_clone = pending.clone();
        let reader_task = tokio::spawn(async move {
            if let Err(e) = read_loop(reader, &pending_clone, event_tx, shutdown_rx).await {
                tracing::error!("Read loop error: {}", e);
            }
        });

        let (writer, writer_task) = spawn_writer_task(
            FrameWriter::new(write_half),
            config.outbound_capacity,
            shutdown_tx.subscribe(),
        );

        tracing::debug!(
            "Session open (event capacity {}, outbound capacity {}, max frame {})",
            config.event_capacity,
            config.outbound_capacity,
            config.max_frame_length
        );

        Ok(Session {
            outbound: tokio::sync::Mutex::new(Outbound { writer, next_id: 1 }),
            pending,
            state,
            events: Mutex::new(Some(event_rx)),
            shutdown: shutdown_tx,
            reader: Mutex::new(Some(reader_task)),
            writer: Mutex::new(Some(writer_task)),
            registry: Arc::new(self.registry),
            errors: Arc::new(self.errors),
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer task handle plus the id counter it serializes.
struct Outbound {
    writer: WriterHandle,
    next_id: u32,
}

impl Outbound {
    /// Next id that is neither zero nor still tracked by `pending`.
    fn allocate(&mut self, pending: &PendingTable) -> u32 {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            if id != 0 && !pending.is_tracked(id) {
                return id;
            }
        }
    }
}

/// Disposes of an id unless disarmed; covers errors and dropped futures.
struct DisposeGuard<'a> {
    pending: &'a PendingTable,
    id: u32,
    armed: bool,
}

impl<'a> DisposeGuard<'a> {
    fn new(pending: &'a PendingTable, id: u32) -> Self {
        Self {
            pending,
            id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DisposeGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.pending.dispose(self.id) {
            tracing::debug!("Disposed request {}", self.id);
        }
    }
}

/// Ordered stream of events the peer sent on its own.
///
/// Ends (yields `None`) once the reader task has stopped.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
}

impl EventStream {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Unwrap into the underlying channel receiver.
    pub fn into_inner(self) -> mpsc::Receiver<Event> {
        self.rx
    }
}

/// An open JDWP connection.
///
/// `send` and `call` may be used from many tasks at once through an `Arc`.
pub struct Session {
    /// Writer handle and id counter, held for allocate, register and enqueue.
    outbound: tokio::sync::Mutex<Outbound>,
    /// Reply slots shared with the reader task.
    pending: Arc<PendingTable>,
    state: StateCell,
    /// Taken once by [`Session::events`].
    events: Mutex<Option<mpsc::Receiver<Event>>>,
    /// Stops the reader and writer tasks; dropping it stops them too.
    shutdown: watch::Sender<bool>,
    reader: Mutex<Option<JoinHandle<()>>>,
    /// Yields the result of shutting the write half down.
    writer: Mutex<Option<JoinHandle<Result<()>>>>,
    registry: Arc<TagRegistry>,
    errors: Arc<ErrorTable>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Connect with default settings.
    pub async fn dial<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        SessionBuilder::new().dial(addr).await
    }

    /// Connect, giving up after `timeout`.
    pub async fn dial_timeout<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        SessionBuilder::new().connect_timeout(timeout).dial(addr).await
    }

    /// Open a session with default settings on a connected stream.
    pub async fn open<S>(stream: S) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        SessionBuilder::new().open(stream).await
    }

    /// Write one command and return its id with the slot its reply lands in.
    ///
    /// Returns once the frame is flushed. The frame is written whole even if
    /// this future is dropped after it was queued; the id is then disposed of.
    ///
    /// The caller owns the slot: either await it or pass the id to
    /// [`dispose`](Self::dispose).
    pub async fn send(
        &self,
        command_set: u8,
        command: u8,
        payload: &[u8],
    ) -> Result<(u32, ReplyReceiver)> {
        let data = Bytes::copy_from_slice(payload);

        let (id, rx, guard, written) = {
            let mut outbound = self.outbound.lock().await;
            if !self.state.get().is_open() {
                return Err(JdwpError::ConnectionClosed);
            }

            let id = outbound.allocate(&self.pending);
            let rx = self.pending.register(id);
            let guard = DisposeGuard::new(&self.pending, id);
            let written = outbound
                .writer
                .send_command(id, command_set, command, data)
                .await?;
            (id, rx, guard, written)
        };

        written.wait().await?;
        guard.disarm();

        tracing::debug!(
            "Sent command {} ({}/{}, {} bytes)",
            id,
            command_set,
            command,
            payload.len()
        );
        Ok((id, rx))
    }

    /// Send a command and wait for its reply.
    ///
    /// A non-zero error code is not an error here; see
    /// [`call_checked`](Self::call_checked). The id is disposed of on every
    /// exit path, including cancellation.
    pub async fn call(&self, command_set: u8, command: u8, payload: &[u8]) -> Result<Reply> {
        let (id, rx) = self.send(command_set, command, payload).await?;
        let _guard = DisposeGuard::new(&self.pending, id);
        rx.recv().await
    }

    /// Like [`call`](Self::call), mapping a non-zero code to
    /// [`JdwpError::Application`] through the session's error table.
    pub async fn call_checked(&self, command_set: u8, command: u8, payload: &[u8]) -> Result<Reply> {
        let reply = self.call(command_set, command, payload).await?;
        if !reply.is_ok() {
            return Err(self.errors.resolve(reply.error_code).into());
        }
        Ok(reply)
    }

    /// Like [`call_checked`](Self::call_checked), decoding the reply with `shape`.
    pub async fn call_decode(
        &self,
        command_set: u8,
        command: u8,
        payload: &[u8],
        shape: &Shape,
    ) -> Result<Value> {
        let reply = self.call_checked(command_set, command, payload).await?;
        self.decode(&reply.data, shape)
    }

    /// Decode bytes (typically an event payload) with the session registry.
    pub fn decode(&self, bytes: &[u8], shape: &Shape) -> Result<Value> {
        Ok(decode(bytes, shape, &self.registry)?)
    }

    /// Give up on a reply. A reply that still arrives is dropped.
    pub fn dispose(&self, id: u32) -> bool {
        self.pending.dispose(id)
    }

    /// Take the event stream. Only the first call succeeds.
    pub fn events(&self) -> Result<EventStream> {
        lock(&self.events)
            .take()
            .map(|rx| EventStream { rx })
            .ok_or(JdwpError::EventsTaken)
    }

    /// Shut the connection down.
    ///
    /// Stops the reader and writer tasks, waits for both to exit and fails
    /// every outstanding waiter with [`JdwpError::ConnectionClosed`]. A frame
    /// still being written is abandoned. Only the first call does anything.
    pub async fn close(&self) -> Result<()> {
        if !self
            .state
            .transition(ConnectionState::Open, ConnectionState::Closing)
        {
            return Ok(());
        }

        self.shutdown.send_replace(true);

        let writer = lock(&self.writer).take();
        let result = match writer {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::warn!("Writer task ended abnormally: {}", e);
                Ok(())
            }),
            None => Ok(()),
        };

        let reader = lock(&self.reader).take();
        if let Some(handle) = reader {
            if let Err(e) = handle.await {
                tracing::warn!("Reader task ended abnormally: {}", e);
            }
        }

        // Waits out a send that registered before the state change. Queueing
        // fails fast once the writer is gone, so nothing holds the lock long.
        drop(self.outbound.lock().await);

        let released = self.pending.clear();
        if released > 0 {
            tracing::debug!("Released {} pending requests on close", released);
        }
        self.state.set(ConnectionState::Closed);
        tracing::debug!("Session closed");

        result
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Number of commands still waiting for a reply.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Registry used to decode tagged values.
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Table used to resolve reply error codes.
    pub fn error_table(&self) -> &ErrorTable {
        &self.errors
    }
}
