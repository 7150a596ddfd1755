//! Dedicated writer task that owns the write half of a connection.
//!
//! Callers hand complete frames to the task over a bounded channel; the task
//! writes each one whole. A caller that is cancelled after enqueueing cannot
//! leave half a frame on the wire.
//!
//! ```text
//! send ─┐
//! send ─┼─► mpsc::Sender<OutboundFrame> ─► writer task ─► write half
//! call ─┘
//! ```
//!
//! Each frame carries a oneshot that reports the outcome of its write, so
//! `send` still returns write errors to the caller that issued the frame.

use bytes::Bytes;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::framed::{payload_len_u32, FrameWriter};
use crate::error::{JdwpError, Result};
use crate::protocol::{Header, HEADER_SIZE};

/// Default capacity of the outbound frame queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Maximum frames written before one flush.
const MAX_BATCH_SIZE: usize = 64;

/// A frame queued for the writer task.
#[derive(Debug)]
pub struct OutboundFrame {
    header: Header,
    payload: Bytes,
    done: oneshot::Sender<Result<()>>,
}

impl OutboundFrame {
    /// Total size of this frame (header + payload).
    #[inline]
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    fn complete(self, result: Result<()>) {
        // The caller may have stopped waiting.
        let _ = self.done.send(result);
    }
}

/// Outcome of one queued frame.
///
/// Dropping it does not withdraw the frame.
#[derive(Debug)]
pub struct Written {
    rx: oneshot::Receiver<Result<()>>,
}

impl Written {
    /// Wait until the frame is flushed or the write failed.
    ///
    /// [`JdwpError::ConnectionClosed`] if the task stopped before writing it.
    pub async fn wait(self) -> Result<()> {
        self.rx.await.unwrap_or(Err(JdwpError::ConnectionClosed))
    }
}

/// Handle for queueing frames on the writer task.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Queue a command frame; the header's length is derived from `payload`.
    ///
    /// Waits for queue space. Fails with [`JdwpError::ConnectionClosed`] once
    /// the task has stopped.
    pub async fn send_command(
        &self,
        id: u32,
        command_set: u8,
        command: u8,
        payload: Bytes,
    ) -> Result<Written> {
        let len = payload_len_u32(&payload)?;
        let header = Header::command(id, command_set, command, len);
        self.send(header, payload).await
    }

    /// Queue a header and payload exactly as given.
    pub async fn send(&self, header: Header, payload: Bytes) -> Result<Written> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(OutboundFrame {
                header,
                payload,
                done,
            })
            .await
            .map_err(|_| JdwpError::ConnectionClosed)?;
        Ok(Written { rx })
    }

    /// Check if the writer task has stopped.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task.
///
/// The task runs until every handle is dropped, a write fails, or `shutdown`
/// changes (or its sender is dropped). A shutdown abandons a frame mid-write.
/// On exit it shuts the write half down and yields that result.
pub fn spawn_writer_task<W>(
    mut writer: FrameWriter<W>,
    capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let task = tokio::spawn(async move {
        writer_loop(rx, &mut writer, shutdown).await;
        let result = writer.shutdown().await;
        tracing::debug!("Writer task exiting");
        result
    });

    (WriterHandle { tx }, task)
}

async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    writer: &mut FrameWriter<W>,
    mut shutdown: watch::Receiver<bool>,
) where
    W: AsyncWrite + Unpin,
{
    let mut batch: Vec<OutboundFrame> = Vec::with_capacity(MAX_BATCH_SIZE);

    loop {
        let first = tokio::select! {
            biased;

            _ = shutdown.changed() => break,
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        batch.push(first);

        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        let result = tokio::select! {
            biased;

            _ = shutdown.changed() => {
                tracing::debug!("Writer stopped with a batch in flight");
                break;
            }
            result = write_batch(writer, &batch) => result,
        };

        match result {
            Ok(()) => {
                for frame in batch.drain(..) {
                    frame.complete(Ok(()));
                }
            }
            Err(e) => {
                tracing::error!("Writer error: {}", e);
                let mut frames = batch.drain(..);
                if let Some(frame) = frames.next() {
                    frame.complete(Err(e));
                }
                break;
            }
        }
    }
}

async fn write_batch<W>(writer: &mut FrameWriter<W>, batch: &[OutboundFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for frame in batch {
        writer.put_frame(&frame.header, &frame.payload).await?;
    }
    writer.flush().await?;

    if batch.len() > 1 {
        let bytes: usize = batch.iter().map(OutboundFrame::size).sum();
        tracing::trace!("Wrote batch of {} frames ({} bytes)", batch.len(), bytes);
    }
    Ok(())
}
