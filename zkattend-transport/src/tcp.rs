//! TCP transport
//!
//! Every packet travels inside an 8-byte envelope:
//!
//! ```text
//! ┌──────────┬──────────┬────────────────────┬──────────────┐
//! │  0x5050  │  0x7D82  │ packet length (u32) │    packet    │
//! │ 2 bytes  │ 2 bytes  │      4 bytes        │   N bytes    │
//! └──────────┴──────────┴────────────────────┴──────────────┘
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use zkattend_core::constants::{
    DEFAULT_TIMEOUT_MS, TCP_ENVELOPE_SIZE, TCP_MAGIC_1, TCP_MAGIC_2, TCP_MAX_CHUNK, TCP_READ_CHUNK,
};
use zkattend_core::HEADER_SIZE;

use crate::{error::*, Transport};

/// Wrap an encoded packet in the TCP envelope
pub fn envelope(packet: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(TCP_ENVELOPE_SIZE + packet.len());

    buf.put_u16_le(TCP_MAGIC_1);
    buf.put_u16_le(TCP_MAGIC_2);
    buf.put_u32_le(packet.len() as u32);
    buf.put_slice(packet);

    buf
}

/// Check the magic words and return the packet length the envelope announces
pub fn parse_envelope(raw: &[u8]) -> Result<usize> {
    if raw.len() < TCP_ENVELOPE_SIZE {
        return Err(Error::ConnectionClosed);
    }

    let first = u16::from_le_bytes([raw[0], raw[1]]);
    let second = u16::from_le_bytes([raw[2], raw[3]]);
    if first != TCP_MAGIC_1 || second != TCP_MAGIC_2 {
        return Err(Error::InvalidMagic { first, second });
    }

    Ok(u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize)
}

/// TCP transport for ZKTeco devices
pub struct TcpTransport {
    host: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl TcpTransport {
    /// Create new TCP transport with 2 second timeouts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let default = Duration::from_millis(DEFAULT_TIMEOUT_MS);

        Self {
            host: host.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: default,
            read_timeout: default,
            write_timeout: default,
        }
    }

    /// Set connect, read and write timeouts at once
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_connect_timeout(timeout)
            .with_read_timeout(timeout)
            .with_write_timeout(timeout)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }

    /// Fill `buf` completely or fail
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let read_timeout = self.read_timeout;
        let stream = self.stream()?;

        match timeout(read_timeout, stream.read_exact(buf)).await {
            Err(_) => Err(Error::ReadTimeout),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(Error::ConnectionClosed)
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// One socket read of at most `buf.len()` bytes
    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read_timeout = self.read_timeout;
        let stream = self.stream()?;

        let n = timeout(read_timeout, stream.read(buf))
            .await
            .map_err(|_| Error::ReadTimeout)??;

        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(n)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addr = match self.socket_addr {
            Some(addr) => addr,
            None => crate::resolve(&self.host, self.port).await?,
        };
        self.socket_addr = Some(addr);

        debug!("Connecting to {} via TCP...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)??;

        stream.set_nodelay(true)?;

        debug!("Connected to {} via TCP", addr);

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.remote_addr());
            let _ = stream.shutdown().await;
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        let write_timeout = self.write_timeout;
        let frame = envelope(packet);
        let stream = self.stream()?;

        trace!("TCP send {} bytes: {}", frame.len(), hex::encode(&frame));

        timeout(write_timeout, async {
            stream.write_all(&frame).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::WriteTimeout)??;

        Ok(())
    }

    async fn receive(&mut self, max_len: usize) -> Result<BytesMut> {
        let mut header = [0u8; TCP_ENVELOPE_SIZE];
        self.read_exact(&mut header).await?;

        let frame_len = match parse_envelope(&header) {
            Ok(len) => len,
            Err(e) => {
                warn!("Discarding TCP frame from {}: {}", self.remote_addr(), e);
                return Err(e);
            }
        };

        let mut packet = BytesMut::zeroed(frame_len.min(max_len));
        self.read_exact(&mut packet).await?;

        trace!(
            "TCP received {}/{} bytes: {}",
            packet.len(),
            frame_len,
            hex::encode(&packet)
        );

        Ok(packet)
    }

    async fn receive_raw(&mut self, len: usize) -> Result<BytesMut> {
        let mut raw = BytesMut::zeroed(len);
        self.read_exact(&mut raw).await?;

        trace!("TCP received {} raw bytes", len);
        Ok(raw)
    }

    async fn receive_buffered(&mut self, expected_len: usize) -> Result<BytesMut> {
        let total = TCP_ENVELOPE_SIZE + HEADER_SIZE + expected_len;
        let mut buf = BytesMut::with_capacity(total);
        let mut chunk = [0u8; TCP_READ_CHUNK];
        let mut magic_checked = false;

        while buf.len() < total {
            let want = (total - buf.len()).min(TCP_READ_CHUNK);
            let n = self.read_some(&mut chunk[..want]).await?;
            buf.extend_from_slice(&chunk[..n]);

            if !magic_checked && buf.len() >= TCP_ENVELOPE_SIZE {
                parse_envelope(&buf)?;
                magic_checked = true;
            }
        }

        trace!("TCP received buffered block of {} bytes", expected_len);

        Ok(buf.split_off(TCP_ENVELOPE_SIZE + HEADER_SIZE))
    }

    fn max_chunk(&self) -> usize {
        TCP_MAX_CHUNK
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("TCP transport dropped while still connected");
        }
    }
}
