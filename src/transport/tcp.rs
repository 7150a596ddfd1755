//! TCP connection setup.

use std::time::Duration;

use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{JdwpError, Result};

/// Connect to `addr`, optionally bounded by `timeout`.
///
/// `TCP_NODELAY` is enabled: commands are small and latency bound.
pub async fn connect<A: ToSocketAddrs>(addr: A, timeout: Option<Duration>) -> Result<TcpStream> {
    let stream = match timeout {
        Some(limit) => tokio::time::timeout(limit, TcpStream::connect(addr))
            .await
            .map_err(|_| JdwpError::ConnectTimeout(limit))??,
        None => TcpStream::connect(addr).await?,
    };
    stream.set_nodelay(true)?;
    if let Ok(peer) = stream.peer_addr() {
        tracing::debug!("Connected to {}", peer);
    }
    Ok(stream)
}
