//! Connection handshake.
//!
//! Both sides exchange the same fixed literal once, before any frame. The
//! client writes it and expects the exact bytes echoed back.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{JdwpError, Result};

/// Default handshake literal.
pub const HANDSHAKE: &[u8] = b"JDWP-Handshake";

/// Write `literal` and wait for the peer to echo it.
///
/// A short read or any differing byte is a [`JdwpError::HandshakeMismatch`].
pub async fn handshake<S>(stream: &mut S, literal: &[u8]) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(literal).await?;
    stream.flush().await?;

    let mut echo = vec![0u8; literal.len()];
    let mut filled = 0;
    while filled < echo.len() {
        let n = stream.read(&mut echo[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if echo[..filled] != *literal {
        return Err(JdwpError::HandshakeMismatch {
            expected: String::from_utf8_lossy(literal).into_owned(),
            received: String::from_utf8_lossy(&echo[..filled]).into_owned(),
        });
    }

    tracing::debug!("Handshake complete");
    Ok(())
}

/// Peer side of the handshake: read the literal and echo it back.
///
/// Used by test doubles and loopback tooling that stand in for a debuggee.
pub async fn accept_handshake<S>(stream: &mut S, literal: &[u8]) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut received = vec![0u8; literal.len()];
    stream.read_exact(&mut received).await?;
    if received != literal {
        return Err(JdwpError::HandshakeMismatch {
            expected: String::from_utf8_lossy(literal).into_owned(),
            received: String::from_utf8_lossy(&received).into_owned(),
        });
    }
    stream.write_all(literal).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_handshake_echo() {
        let (mut client, mut server) = duplex(64);

        let peer = tokio::spawn(async move { accept_handshake(&mut server, HANDSHAKE).await });
        handshake(&mut client, HANDSHAKE).await.unwrap();
        peer.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_handshake_mismatch() {
        let (mut client, mut server) = duplex(64);

        tokio::spawn(async move {
            let mut buf = [0u8; 14];
            server.read_exact(&mut buf).await.unwrap();
            server.write_all(b"JDWP-Handshakx").await.unwrap();
        });

        let err = handshake(&mut client, HANDSHAKE).await.unwrap_err();
        assert!(matches!(err, JdwpError::HandshakeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_handshake_short_read() {
        let (mut client, mut server) = duplex(64);

        tokio::spawn(async move {
            let mut buf = [0u8; 14];
            server.read_exact(&mut buf).await.unwrap();
            server.write_all(b"JDWP").await.unwrap();
            // Dropping the server half closes the stream.
        });

        let err = handshake(&mut client, HANDSHAKE).await.unwrap_err();
        match err {
            JdwpError::HandshakeMismatch { received, .. } => assert_eq!(received, "JDWP"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
