//! UDP transport for ZKTeco devices
//!
//! No envelope: one packet is one datagram.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use zkattend_core::constants::{DEFAULT_TIMEOUT_MS, UDP_MAX_CHUNK};
use zkattend_core::HEADER_SIZE;

use crate::{error::*, Transport};

/// Largest datagram we accept
const MAX_DATAGRAM: usize = 65_536;

/// UDP transport for ZKTeco devices
pub struct UdpTransport {
    host: String,
    port: u16,
    socket: Option<UdpSocket>,
    remote_addr: Option<SocketAddr>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl UdpTransport {
    /// Create new UDP transport with 2 second timeouts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let default = Duration::from_millis(DEFAULT_TIMEOUT_MS);

        Self {
            host: host.into(),
            port,
            socket: None,
            remote_addr: None,
            read_timeout: default,
            write_timeout: default,
        }
    }

    /// Set read and write timeouts at once
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_read_timeout(timeout).with_write_timeout(timeout)
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Receive one whole datagram
    async fn recv_datagram(&mut self) -> Result<BytesMut> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::zeroed(MAX_DATAGRAM);
        let n = timeout(self.read_timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| {
                warn!("UDP read timeout after {:?}", self.read_timeout);
                Error::ReadTimeout
            })??;

        buf.truncate(n);
        trace!("UDP received {} bytes: {}", n, hex::encode(&buf));

        Ok(buf)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let remote = match self.remote_addr {
            Some(addr) => addr,
            None => crate::resolve(&self.host, self.port).await?,
        };
        self.remote_addr = Some(remote);

        debug!("Connecting to {} via UDP...", remote);

        let local = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;

        // Fixes the default send target and filters foreign datagrams
        socket.connect(remote).await?;

        debug!("Connected to {} via UDP", remote);

        self.socket = Some(socket);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            debug!("Disconnecting from {}...", self.remote_addr());
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        trace!("UDP send {} bytes: {}", packet.len(), hex::encode(packet));

        timeout(self.write_timeout, socket.send(packet))
            .await
            .map_err(|_| Error::WriteTimeout)??;

        Ok(())
    }

    async fn receive(&mut self, _max_len: usize) -> Result<BytesMut> {
        self.recv_datagram().await
    }

    async fn receive_raw(&mut self, len: usize) -> Result<BytesMut> {
        let mut raw = BytesMut::with_capacity(len);

        while raw.len() < len {
            let datagram = self.recv_datagram().await?;
            raw.extend_from_slice(&datagram);
        }

        Ok(raw)
    }

    async fn receive_buffered(&mut self, expected_len: usize) -> Result<BytesMut> {
        let mut payload = BytesMut::with_capacity(expected_len);

        while payload.len() < expected_len {
            let datagram = self.recv_datagram().await?;

            if datagram.len() < HEADER_SIZE {
                return Err(Error::ShortDatagram(datagram.len()));
            }
            payload.extend_from_slice(&datagram[HEADER_SIZE..]);
        }

        trace!("UDP received buffered block of {} bytes", payload.len());
        Ok(payload)
    }

    fn max_chunk(&self) -> usize {
        UDP_MAX_CHUNK
    }

    fn remote_addr(&self) -> String {
        self.remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_udp_transport_create() {
        let transport = UdpTransport::new("192.168.1.201", 4370);
        assert!(!transport.is_connected());
        assert_eq!(transport.max_chunk(), 16_384);
    }

    #[tokio::test]
    async fn test_udp_transport_invalid_address() {
        let mut transport = UdpTransport::new("invalid..address", 4370);
        assert!(transport.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_receive_before_connect() {
        let mut transport = UdpTransport::new("127.0.0.1", 4370);
        assert!(matches!(
            transport.receive_buffered(16).await,
            Err(Error::NotConnected)
        ));
    }
}
