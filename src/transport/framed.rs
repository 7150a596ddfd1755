//! Frame-level reads and writes over a byte stream.
//!
//! [`FrameReader`] yields one complete [`Frame`] per call and distinguishes a
//! clean end of stream (EOF exactly on a frame boundary) from truncation.
//! [`FrameWriter`] emits header and payload with scatter/gather I/O,
//! continuing after partial writes until the whole frame is out.

use std::io::IoSlice;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{JdwpError, Result};
use crate::protocol::{Frame, Header, DEFAULT_MAX_FRAME_LENGTH, HEADER_SIZE};

/// Reads frames from the inbound half of a connection.
pub struct FrameReader<R> {
    reader: R,
    max_frame_length: u32,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader with the default frame length limit.
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_length(reader, DEFAULT_MAX_FRAME_LENGTH)
    }

    /// Create a reader that rejects frames longer than `max_frame_length`.
    pub fn with_max_frame_length(reader: R, max_frame_length: u32) -> Self {
        Self {
            reader,
            max_frame_length,
        }
    }

    /// Read one complete frame.
    ///
    /// - EOF before the first header byte: [`JdwpError::ConnectionClosed`]
    /// - EOF anywhere after that: [`JdwpError::Truncated`]
    /// - declared length below 11 or above the limit: [`JdwpError::InvalidLength`]
    pub async fn read_frame(&mut self) -> Result<Frame> {
        let mut raw = [0u8; HEADER_SIZE];
        let n = read_full(&mut self.reader, &mut raw).await?;
        if n == 0 {
            return Err(JdwpError::ConnectionClosed);
        }
        if n < HEADER_SIZE {
            return Err(JdwpError::Truncated {
                expected: HEADER_SIZE,
                received: n,
            });
        }

        let header = Header::decode(&raw).ok_or(JdwpError::Truncated {
            expected: HEADER_SIZE,
            received: n,
        })?;
        header.validate(self.max_frame_length)?;

        let len = header.payload_length();
        let mut payload = BytesMut::zeroed(len);
        let n = read_full(&mut self.reader, &mut payload).await?;
        if n < len {
            return Err(JdwpError::Truncated {
                expected: len,
                received: n,
            });
        }

        Ok(Frame::new(header, payload.freeze()))
    }

    /// Consume the reader, returning the inner stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Fill `buf` unless EOF comes first; returns the number of bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Writes frames to the outbound half of a connection.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a command frame. The header's length is derived from `payload`.
    pub async fn write_command(
        &mut self,
        id: u32,
        command_set: u8,
        command: u8,
        payload: &[u8],
    ) -> Result<()> {
        let len = payload_len_u32(payload)?;
        let header = Header::command(id, command_set, command, len);
        self.write_frame(&header, payload).await
    }

    /// Write a header and payload exactly as given, then flush.
    pub async fn write_frame(&mut self, header: &Header, payload: &[u8]) -> Result<()> {
        self.put_frame(header, payload).await?;
        self.flush().await
    }

    /// Write a header and payload without flushing.
    ///
    /// Uses `write_vectored` for header and payload together and keeps going
    /// after partial writes. A zero-length write is an error.
    pub async fn put_frame(&mut self, header: &Header, payload: &[u8]) -> Result<()> {
        let encoded = header.encode();
        let total_size = HEADER_SIZE + payload.len();
        let mut total_written = 0;

        while total_written < total_size {
            let slices = remaining_slices(&encoded, payload, total_written);
            let written = self.writer.write_vectored(&slices).await?;
            if written == 0 {
                return Err(JdwpError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write_vectored returned 0",
                )));
            }
            total_written += written;
        }
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the write half, signalling EOF to the peer.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Consume the writer, returning the inner stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(super) fn payload_len_u32(payload: &[u8]) -> Result<u32> {
    u32::try_from(payload.len())
        .ok()
        .filter(|len| len.checked_add(HEADER_SIZE as u32).is_some())
        .ok_or(JdwpError::InvalidLength {
            length: u32::MAX,
            min: HEADER_SIZE as u32,
            max: u32::MAX,
        })
}

/// IoSlices for whatever is left of header + payload after `skip_bytes`.
fn remaining_slices<'a>(header: &'a [u8], payload: &'a [u8], skip_bytes: usize) -> Vec<IoSlice<'a>> {
    let mut slices = Vec::with_capacity(2);

    if skip_bytes < header.len() {
        slices.push(IoSlice::new(&header[skip_bytes..]));
    }

    if !payload.is_empty() {
        let start_in_payload = skip_bytes.saturating_sub(header.len());
        if start_in_payload < payload.len() {
            slices.push(IoSlice::new(&payload[start_in_payload..]));
        }
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::build_frame;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::duplex;

    /// Writer that accepts at most `chunk` bytes per call.
    struct Trickle {
        out: Vec<u8>,
        chunk: usize,
    }

    impl AsyncWrite for Trickle {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            let n = buf.len().min(self.chunk);
            self.out.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn test_remaining_slices_no_skip() {
        let header = [0u8; HEADER_SIZE];
        let slices = remaining_slices(&header, b"hello", 0);
        assert_eq!(slices.len(), 2);
    }

    #[test]
    fn test_remaining_slices_partial_header() {
        let header = [0u8; HEADER_SIZE];
        let slices = remaining_slices(&header, b"hello", 5);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].len(), HEADER_SIZE - 5);
        assert_eq!(slices[1].len(), 5);
    }

    #[test]
    fn test_remaining_slices_inside_payload() {
        let header = [0u8; HEADER_SIZE];
        let slices = remaining_slices(&header, b"hello", HEADER_SIZE + 2);
        assert_eq!(slices.len(), 1);
        assert_eq!(&*slices[0], b"llo");
    }

    #[tokio::test]
    async fn test_write_command_length_field() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.write_command(1, 1, 7, b"abcd").await.unwrap();

        let written = writer.into_inner().into_inner();
        assert_eq!(written.len(), HEADER_SIZE + 4);
        assert_eq!(&written[0..4], &[0, 0, 0, 15]);
        assert_eq!(&written[4..8], &[0, 0, 0, 1]);
        assert_eq!(&written[8..11], &[0, 1, 7]);
        assert_eq!(&written[11..], b"abcd");
    }

    #[tokio::test]
    async fn test_write_frame_partial_writes() {
        let mut writer = FrameWriter::new(Trickle {
            out: Vec::new(),
            chunk: 3,
        });
        writer.write_command(9, 15, 1, b"payload").await.unwrap();

        let out = writer.into_inner().out;
        assert_eq!(out, build_frame(&Header::command(9, 15, 1, 7), b"payload"));
    }

    #[tokio::test]
    async fn test_read_frame() {
        let (mut peer, client) = duplex(1024);
        let bytes = build_frame(&Header::reply(3, 0, 4), b"data");
        peer.write_all(&bytes).await.unwrap();

        let mut reader = FrameReader::new(client);
        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.id(), 3);
        assert_eq!(&frame.payload[..], b"data");
    }

    #[tokio::test]
    async fn test_read_frame_clean_eof() {
        let (peer, client) = duplex(64);
        drop(peer);

        let mut reader = FrameReader::new(client);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, JdwpError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_read_frame_truncated_header() {
        let (mut peer, client) = duplex(64);
        peer.write_all(&[0, 0, 0, 20, 0]).await.unwrap();
        drop(peer);

        let mut reader = FrameReader::new(client);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(
            err,
            JdwpError::Truncated {
                expected: HEADER_SIZE,
                received: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_read_frame_truncated_payload() {
        let (mut peer, client) = duplex(64);
        let mut bytes = Header::reply(1, 0, 10).encode().to_vec();
        bytes.extend_from_slice(b"abc");
        peer.write_all(&bytes).await.unwrap();
        drop(peer);

        let mut reader = FrameReader::new(client);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(
            err,
            JdwpError::Truncated {
                expected: 10,
                received: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_read_frame_length_too_small() {
        let (mut peer, client) = duplex(64);
        peer.write_all(&Header::new(5, 1, 0, 0).encode()).await.unwrap();

        let mut reader = FrameReader::new(client);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, JdwpError::InvalidLength { length: 5, .. }));
    }

    #[tokio::test]
    async fn test_read_frame_length_over_limit() {
        let (mut peer, client) = duplex(64);
        peer.write_all(&Header::reply(1, 0, 100).encode()).await.unwrap();

        let mut reader = FrameReader::with_max_frame_length(client, 64);
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, JdwpError::InvalidLength { length: 111, .. }));
    }

    #[tokio::test]
    async fn test_read_back_to_back_frames() {
        let (mut peer, client) = duplex(1024);
        for id in 1..=3u32 {
            let payload = id.to_be_bytes();
            peer.write_all(&build_frame(&Header::reply(id, 0, 4), &payload))
                .await
                .unwrap();
        }

        let mut reader = FrameReader::new(client);
        for id in 1..=3u32 {
            let frame = reader.read_frame().await.unwrap();
            assert_eq!(frame.id(), id);
            assert_eq!(&frame.payload[..], &id.to_be_bytes());
        }
    }
}
