//! Transport layer for the ZKTeco protocol
//!
//! A [`Transport`] moves encoded packets to and from the device. The TCP
//! variant wraps every packet in an 8-byte envelope; the UDP variant maps one
//! packet to one datagram. Both hand whole packets (header included, envelope
//! stripped) back to the caller.

pub mod error;
pub mod event;
pub mod tcp;
pub mod udp;

pub use error::{Error, Result};
pub use event::{Event, EventBus};
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use async_trait::async_trait;
use bytes::BytesMut;

/// Byte-level connection to a device
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection; closing a closed transport is a no-op
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Send one encoded packet
    async fn send(&mut self, packet: &[u8]) -> Result<()>;

    /// Receive one packet
    ///
    /// Over TCP at most `max_len` bytes of the frame are read; the rest stays
    /// in the stream for [`Transport::receive_raw`]. A UDP datagram is always
    /// returned whole.
    async fn receive(&mut self, max_len: usize) -> Result<BytesMut>;

    /// Receive exactly `len` bytes that continue a previous packet
    async fn receive_raw(&mut self, len: usize) -> Result<BytesMut>;

    /// Receive the bulk payload that follows a `ReadBuffer` acknowledgement
    ///
    /// All framing is stripped; the result holds payload bytes only.
    async fn receive_buffered(&mut self, expected_len: usize) -> Result<BytesMut>;

    /// Largest chunk the device will serve over this transport
    fn max_chunk(&self) -> usize;

    fn remote_addr(&self) -> String;
}

/// Resolve `host:port` to the first socket address
pub(crate) async fn resolve(host: &str, port: u16) -> Result<std::net::SocketAddr> {
    let target = format!("{host}:{port}");

    tokio::net::lookup_host(&target)
        .await
        .map_err(|e| Error::InvalidAddress(format!("{target}: {e}")))?
        .next()
        .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {target}")))
}
