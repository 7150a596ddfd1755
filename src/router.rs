//! Correlation router.
//!
//! One reader task owns the inbound half of the connection. For every frame
//! it consults the [`PendingTable`]:
//!
//! ```text
//!                     ┌─ id pending ───► Reply ──► oneshot slot (removed)
//! read_frame() ──► route
//!                     ├─ id abandoned ─► dropped (late reply to a disposed request)
//!                     └─ otherwise ────► Event ──► bounded mpsc (blocks when full)
//! ```
//!
//! Whether the 16-bit tail is an error code or a command pair follows from
//! that decision alone. A full event queue stalls the reader, and with it
//! reply delivery, until the consumer catches up.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{JdwpError, Result};
use crate::protocol::{Event, Frame, Reply};
use crate::transport::FrameReader;

/// Receiving end of a single reply slot.
#[derive(Debug)]
pub struct ReplyReceiver {
    id: u32,
    rx: oneshot::Receiver<Reply>,
}

impl ReplyReceiver {
    /// Id of the command this reply answers.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Wait for the reply.
    ///
    /// Fails with [`JdwpError::ConnectionClosed`] if the slot is dropped,
    /// which happens when the session closes or the id is disposed.
    pub async fn recv(self) -> Result<Reply> {
        self.rx.await.map_err(|_| JdwpError::ConnectionClosed)
    }
}

#[derive(Debug, Default)]
struct Slots {
    waiting: HashMap<u32, oneshot::Sender<Reply>>,
    abandoned: HashSet<u32>,
}

/// Outcome of routing one inbound frame.
#[derive(Debug)]
pub enum Route {
    /// Reply handed to its waiter.
    Delivered(u32),
    /// Reply matched a slot whose receiver was already dropped.
    Orphaned(u32),
    /// Late reply to a disposed request; dropped.
    Late(u32),
    /// Not a reply; forward to the event stream.
    Event(Event),
}

/// Outstanding request ids and their reply slots.
#[derive(Debug, Default)]
pub struct PendingTable {
    slots: Mutex<Slots>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a slot for `id`, replacing any stale one.
    pub fn register(&self, id: u32) -> ReplyReceiver {
        let (tx, rx) = oneshot::channel();
        let mut slots = self.lock();
        slots.abandoned.remove(&id);
        slots.waiting.insert(id, tx);
        ReplyReceiver { id, rx }
    }

    /// Whether `id` is pending or was disposed while pending.
    pub fn is_tracked(&self, id: u32) -> bool {
        let slots = self.lock();
        slots.waiting.contains_key(&id) || slots.abandoned.contains(&id)
    }

    /// Whether `id` still waits for a reply.
    pub fn is_pending(&self, id: u32) -> bool {
        self.lock().waiting.contains_key(&id)
    }

    /// Remove the slot for `id`.
    ///
    /// Returns `true` if a reply was still outstanding; the id is then
    /// remembered so that its late reply is dropped instead of being taken
    /// for an event.
    pub fn dispose(&self, id: u32) -> bool {
        let mut slots = self.lock();
        if slots.waiting.remove(&id).is_some() {
            slots.abandoned.insert(id);
            true
        } else {
            false
        }
    }

    /// Classify a frame and, for replies, deliver it.
    pub fn route(&self, frame: Frame) -> Route {
        let id = frame.id();
        let mut slots = self.lock();

        if let Some(tx) = slots.waiting.remove(&id) {
            drop(slots);
            return match tx.send(frame.into_reply()) {
                Ok(()) => Route::Delivered(id),
                Err(_) => Route::Orphaned(id),
            };
        }

        if slots.abandoned.remove(&id) {
            return Route::Late(id);
        }

        Route::Event(frame.into_event())
    }

    /// Drop every slot. Waiters observe [`JdwpError::ConnectionClosed`].
    pub fn clear(&self) -> usize {
        let mut slots = self.lock();
        let n = slots.waiting.len();
        slots.waiting.clear();
        slots.abandoned.clear();
        n
    }

    /// Number of requests waiting for a reply.
    pub fn len(&self) -> usize {
        self.lock().waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Main read loop - reads frames and routes them until EOF, error or shutdown.
///
/// Returns `Ok(())` on clean EOF or shutdown. Dropping `events` on return
/// ends the event stream.
pub async fn read_loop<R>(
    mut reader: FrameReader<R>,
    pending: &PendingTable,
    events: mpsc::Sender<Event>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            frame = reader.read_frame() => frame,
        };

        let frame = match frame {
            Ok(f) => f,
            Err(JdwpError::ConnectionClosed) => {
                tracing::debug!("Peer closed the connection");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match pending.route(frame) {
            Route::Delivered(id) => tracing::debug!("Delivered reply {}", id),
            Route::Orphaned(id) => tracing::debug!("Reply {} arrived after its waiter left", id),
            Route::Late(id) => tracing::debug!("Dropped late reply {} for disposed request", id),
            Route::Event(event) => {
                tracing::debug!(
                    "Event {}/{} ({} bytes)",
                    event.command_set,
                    event.command,
                    event.data.len()
                );
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => return Ok(()),
                    sent = events.send(event) => {
                        if sent.is_err() {
                            tracing::trace!("Event stream dropped, discarding event");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, Header};
    use bytes::Bytes;
    use tokio::io::{duplex, AsyncWriteExt};

    fn reply_frame(id: u32, code: u16) -> Frame {
        Frame::new(Header::reply(id, code, 0), Bytes::new())
    }

    #[tokio::test]
    async fn test_route_reply_to_waiter() {
        let table = PendingTable::new();
        let rx = table.register(5);

        assert!(matches!(table.route(reply_frame(5, 0)), Route::Delivered(5)));
        assert!(table.is_empty());
        assert_eq!(rx.recv().await.unwrap().id, 5);
    }

    #[test]
    fn test_route_unknown_id_is_event() {
        let table = PendingTable::new();
        let frame = Frame::new(Header::command(99, 64, 100, 0), Bytes::new());

        match table.route(frame) {
            Route::Event(event) => {
                assert_eq!(event.command_set, 64);
                assert_eq!(event.command, 100);
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_disposed_reply_is_dropped_once() {
        let table = PendingTable::new();
        let _rx = table.register(7);

        assert!(table.dispose(7));
        assert!(!table.dispose(7));
        assert!(table.is_tracked(7));
        assert!(matches!(table.route(reply_frame(7, 0)), Route::Late(7)));
        assert!(!table.is_tracked(7));
        assert!(matches!(table.route(reply_frame(7, 0)), Route::Event(_)));
    }

    #[test]
    fn test_orphaned_reply() {
        let table = PendingTable::new();
        drop(table.register(3));
        assert!(matches!(table.route(reply_frame(3, 0)), Route::Orphaned(3)));
    }

    #[tokio::test]
    async fn test_clear_wakes_waiters() {
        let table = PendingTable::new();
        let rx = table.register(1);
        assert_eq!(table.clear(), 1);
        assert!(matches!(rx.recv().await, Err(JdwpError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_read_loop_routes_and_ends_stream() {
        let (mut peer, client) = duplex(4096);
        let table = PendingTable::new();
        let rx = table.register(1);
        let (events_tx, mut events_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        peer.write_all(&build_frame(&Header::command(50, 64, 100, 1), &[9]))
            .await
            .unwrap();
        peer.write_all(&build_frame(&Header::reply(1, 0, 2), &[1, 2]))
            .await
            .unwrap();
        drop(peer);

        read_loop(FrameReader::new(client), &table, events_tx, shutdown_rx)
            .await
            .unwrap();

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.data(), &[1, 2]);
        let event = events_rx.recv().await.unwrap();
        assert_eq!(event.id, 50);
        assert_eq!(event.data(), &[9]);
        assert!(events_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_read_loop_stops_on_shutdown() {
        let (_peer, client) = duplex(64);
        let table = PendingTable::new();
        let (events_tx, _events_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            read_loop(FrameReader::new(client), &table, events_tx, shutdown_rx).await
        });
        shutdown_tx.send(true).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_read_loop_reports_framing_error() {
        let (mut peer, client) = duplex(64);
        let table = PendingTable::new();
        let (events_tx, _events_rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        peer.write_all(&Header::new(3, 1, 0, 0).encode()).await.unwrap();

        let err = read_loop(FrameReader::new(client), &table, events_tx, shutdown_rx)
            .await
            .unwrap_err();
        assert!(matches!(err, JdwpError::InvalidLength { .. }));
    }
}
