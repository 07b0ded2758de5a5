//! Protocol packet structure and encoding/decoding

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    error::{Error, Result},
};

/// Decoded 8-byte packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: Command,
    pub checksum: u16,
    pub connection_id: u16,
    pub reply_id: u16,
}

impl Header {
    /// Decode a header from the first 8 bytes of `buf`
    ///
    /// Unknown command codes become [`Command::Unknown`]; the checksum is
    /// carried through but not verified.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Packet::HEADER_SIZE {
            return Err(Error::PacketTooShort {
                expected: Packet::HEADER_SIZE,
                actual: buf.len(),
            });
        }

        Ok(Self {
            command: Command::from(LittleEndian::read_u16(&buf[0..2])),
            checksum: LittleEndian::read_u16(&buf[2..4]),
            connection_id: LittleEndian::read_u16(&buf[4..6]),
            reply_id: LittleEndian::read_u16(&buf[6..8]),
        })
    }
}

/// Protocol packet
///
/// # Packet Structure
///
/// ```text
/// ┌─────────────┬─────────────┬──────────────┬─────────────┬─────────────┐
/// │   Command   │  Checksum   │ ConnectionID │  ReplyID    │   Payload   │
/// │   2 bytes   │   2 bytes   │   2 bytes    │   2 bytes   │   N bytes   │
/// │ (LE u16)    │  (LE u16)   │  (LE u16)    │  (LE u16)   │   (bytes)   │
/// └─────────────┴─────────────┴──────────────┴─────────────┴─────────────┘
/// ```
///
/// All multi-byte values are in little-endian format.
///
/// # Examples
///
/// ```
/// use zkattend_core::{Packet, Command};
///
/// let packet = Packet::new(Command::Connect, 0, 0);
/// let encoded = packet.encode();
///
/// let decoded = Packet::decode(encoded).unwrap();
/// assert_eq!(packet.command, decoded.command);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command or status code
    pub command: Command,

    /// Connection identifier (assigned by device on connect)
    pub connection_id: u16,

    /// Reply number, echoed back by the device
    pub reply_id: u16,

    /// Packet payload (command-specific data)
    pub payload: Bytes,
}

impl Packet {
    /// Packet header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Maximum payload size
    pub const MAX_PAYLOAD_SIZE: usize = crate::MAX_PACKET_SIZE - Self::HEADER_SIZE;

    /// Create a new packet with empty payload
    pub fn new(command: Command, connection_id: u16, reply_id: u16) -> Self {
        Self {
            command,
            connection_id,
            reply_id,
            payload: Bytes::new(),
        }
    }

    /// Create a packet with payload
    ///
    /// # Examples
    ///
    /// ```
    /// use zkattend_core::{Packet, Command};
    ///
    /// let packet = Packet::with_payload(Command::Authenticate, 1234, 1, vec![1, 2, 3, 4]);
    /// assert_eq!(packet.payload.len(), 4);
    /// ```
    pub fn with_payload(
        command: Command,
        connection_id: u16,
        reply_id: u16,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            command,
            connection_id,
            reply_id,
            payload: payload.into(),
        }
    }

    /// Calculate checksum for this packet
    pub fn checksum(&self) -> u16 {
        checksum::calculate(
            self.command.into(),
            self.connection_id,
            self.reply_id,
            &self.payload,
        )
    }

    /// Encode packet to bytes, checksum included
    ///
    /// ```
    /// use zkattend_core::{Packet, Command};
    ///
    /// let packet = Packet::new(Command::Connect, 0, 0);
    /// assert_eq!(packet.encode().len(), 8); // Header only
    /// ```
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16_le(self.command.into());
        buf.put_u16_le(self.checksum());
        buf.put_u16_le(self.connection_id);
        buf.put_u16_le(self.reply_id);
        buf.put_slice(&self.payload);

        buf
    }

    /// Decode packet from bytes
    ///
    /// Only fails when the buffer cannot hold a header. The checksum is not
    /// checked: devices do not fill it consistently and nothing is gained by
    /// discarding an otherwise readable reply.
    pub fn decode(mut buf: BytesMut) -> Result<Self> {
        let header = Header::decode(&buf)?;
        let payload = buf.split_off(Self::HEADER_SIZE).freeze();

        Ok(Self {
            command: header.command,
            connection_id: header.connection_id,
            reply_id: header.reply_id,
            payload,
        })
    }

    /// Check if this is a success reply
    pub fn is_success(&self) -> bool {
        self.command.is_success()
    }

    /// Check if this is a failure reply
    pub fn is_failure(&self) -> bool {
        self.command.is_failure()
    }

    /// Get total packet size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("command", &self.command)
            .field("connection_id", &format!("0x{:04X}", self.connection_id))
            .field("reply_id", &format!("0x{:04X}", self.reply_id))
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload[..self.payload.len().min(32)]))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](connection={}, reply={}, len={})",
            self.command,
            self.connection_id,
            self.reply_id,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packet_new() {
        let packet = Packet::new(Command::Connect, 0, 0);
        assert_eq!(packet.command, Command::Connect);
        assert_eq!(packet.connection_id, 0);
        assert_eq!(packet.reply_id, 0);
        assert_eq!(packet.payload.len(), 0);
    }

    #[test]
    fn test_packet_layout() {
        let packet = Packet::with_payload(Command::DeleteUser, 0x1234, 0x0102, vec![7, 0]);
        let encoded = packet.encode();

        assert_eq!(&encoded[0..2], &18u16.to_le_bytes());
        assert_eq!(&encoded[2..4], &packet.checksum().to_le_bytes());
        assert_eq!(&encoded[4..6], &[0x34, 0x12]);
        assert_eq!(&encoded[6..8], &[0x02, 0x01]);
        assert_eq!(&encoded[8..], &[7, 0]);
    }

    #[test]
    fn test_encoded_checksum_resums() {
        let packet = Packet::with_payload(Command::SetDisplay, 77, 65535, b"hello".to_vec());
        let encoded = packet.encode();

        let stored = u16::from_le_bytes([encoded[2], encoded[3]]);
        assert_eq!(checksum::of_encoded(&encoded), Some(stored));
    }

    #[test]
    fn test_packet_encode_decode() {
        let original = Packet::with_payload(Command::Connect, 3, 9, vec![1, 2, 3, 4]);

        let decoded = Packet::decode(original.encode()).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn test_decode_ignores_bad_checksum() {
        let packet = Packet::new(Command::Success, 7, 1);
        let mut encoded = packet.encode();

        encoded[2] ^= 0xFF;
        encoded[3] ^= 0xFF;

        let decoded = Packet::decode(encoded).unwrap();
        assert_eq!(decoded.command, Command::Success);
        assert_eq!(decoded.connection_id, 7);
    }

    #[test]
    fn test_decode_unknown_command() {
        let mut encoded = Packet::new(Command::Success, 0, 0).encode();
        encoded[0..2].copy_from_slice(&4242u16.to_le_bytes());

        let decoded = Packet::decode(encoded).unwrap();
        assert_eq!(decoded.command, Command::Unknown(4242));
    }

    #[test]
    fn test_packet_too_short() {
        let buf = BytesMut::from(&[1, 2, 3][..]);
        let result = Packet::decode(buf);

        assert!(matches!(
            result,
            Err(Error::PacketTooShort { expected: 8, actual: 3 })
        ));
    }

    #[test]
    fn test_header_decode() {
        let encoded = Packet::with_payload(Command::Unauthorized, 7, 2, vec![0; 4]).encode();
        let header = Header::decode(&encoded).unwrap();

        assert_eq!(header.command, Command::Unauthorized);
        assert_eq!(header.connection_id, 7);
        assert_eq!(header.reply_id, 2);
    }

    #[test]
    fn test_is_success() {
        assert!(Packet::new(Command::Success, 0, 0).is_success());
        assert!(!Packet::new(Command::FailedExecute, 0, 0).is_success());
        assert!(Packet::new(Command::FailedExecute, 0, 0).is_failure());
    }
}
