//! Request/response exchange and the buffered bulk-read protocol

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};
use zkattend_core::constants::{data_types, DATA_REPLY_SIZE, READ_BUFFER_ACK_SIZE};
use zkattend_core::{Command, Packet, Session, HEADER_SIZE};
use zkattend_transport::{EventBus, Transport};

use crate::error::{Error, Result};

/// Table selector sent with `PrepareBuffers`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferedRequest {
    pub fct: i32,
    pub ext: i32,
}

impl BufferedRequest {
    pub fn users() -> Self {
        Self {
            fct: data_types::FCT_USER,
            ext: 0,
        }
    }

    pub fn attendance() -> Self {
        Self {
            fct: data_types::FCT_ATTLOG,
            ext: 0,
        }
    }
}

/// Sends commands over a [`Transport`] and correlates the replies
///
/// Stamps every request with the session's connection id and next reply id,
/// publishes the raw bytes on the [`EventBus`] and adopts the reply id the
/// device echoes back.
pub struct CommandChannel {
    transport: Box<dyn Transport>,
    session: Session,
    events: EventBus,
    max_chunk: usize,
}

impl CommandChannel {
    pub fn new(transport: Box<dyn Transport>, session: Session, events: EventBus) -> Self {
        let max_chunk = transport.max_chunk();
        Self {
            transport,
            session,
            events,
            max_chunk,
        }
    }

    /// Cap the size of each `ReadBuffer` request
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.max(1);
        self
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }

    /// Send one request and wait for its reply
    ///
    /// `expected_len` bounds the reply read; 8 for status-only answers.
    pub async fn send(
        &mut self,
        command: Command,
        payload: &[u8],
        expected_len: usize,
    ) -> Result<Packet> {
        if payload.len() > Packet::MAX_PAYLOAD_SIZE {
            return Err(zkattend_core::Error::PayloadTooLarge {
                size: payload.len(),
                max: Packet::MAX_PAYLOAD_SIZE,
            }
            .into());
        }

        let packet = Packet::with_payload(
            command,
            self.session.connection_id(),
            self.session.next_reply_id(),
            Bytes::copy_from_slice(payload),
        );
        trace!("Sending: {:?}", packet);

        let encoded = packet.encode();
        self.events.sent(&encoded);
        self.transport.send(&encoded).await?;

        let reply = self.receive_packet(expected_len).await?;
        debug!(request = %command, reply = %reply.command, "Exchange complete");

        Ok(reply)
    }

    /// Read one framed packet and adopt its reply id
    pub async fn receive_packet(&mut self, max_len: usize) -> Result<Packet> {
        let raw = self.transport.receive(max_len).await?;
        self.events.received(&raw);

        if raw.len() < HEADER_SIZE {
            return Err(Error::ShortResponse(raw.len()));
        }

        let packet = Packet::decode(raw)?;
        trace!("Received: {:?}", packet);

        self.session.acknowledge(packet.reply_id);
        Ok(packet)
    }

    /// Fetch a whole table with the buffered protocol
    ///
    /// The result starts with the 4-byte size prefix the device puts in front
    /// of every table. Any failure discards what was read so far.
    pub async fn read_buffered(
        &mut self,
        command: Command,
        request: BufferedRequest,
    ) -> Result<Bytes> {
        let mut prepare = BytesMut::with_capacity(11);
        prepare.put_u8(0x01);
        prepare.put_u16_le(command.code());
        prepare.put_i32_le(request.fct);
        prepare.put_i32_le(request.ext);

        let reply = self
            .send(Command::PrepareBuffers, &prepare, DATA_REPLY_SIZE)
            .await?;

        match reply.command {
            Command::Success => {
                if reply.payload.len() < 5 {
                    return Err(Error::BufferedRead(format!(
                        "size announcement is {} bytes",
                        reply.payload.len()
                    )));
                }

                let total = LittleEndian::read_u32(&reply.payload[1..5]) as usize;
                debug!(%command, total, "Device prepared buffer");
                self.read_chunks(total).await
            }
            Command::SendData => self.read_inline(reply.payload).await,
            status => Err(Error::rejected(Command::PrepareBuffers, status)),
        }
    }

    /// The device attached the data to its reply instead of buffering it
    async fn read_inline(&mut self, attached: Bytes) -> Result<Bytes> {
        if attached.len() < 4 {
            return Err(Error::BufferedRead(format!(
                "inline reply is {} bytes",
                attached.len()
            )));
        }

        let total = 4 + LittleEndian::read_u32(&attached[..4]) as usize;
        let mut data = BytesMut::with_capacity(total.min(attached.len().max(self.max_chunk)));
        data.extend_from_slice(&attached);

        if data.len() < total {
            let shortfall = total - data.len();
            debug!(shortfall, "Reading rest of inline data");

            let rest = self.transport.receive_raw(shortfall).await?;
            self.events.received(&rest);
            data.extend_from_slice(&rest);
        }

        if data.len() < total {
            return Err(Error::BufferedRead(format!(
                "inline data is {} of {} bytes",
                data.len(),
                total
            )));
        }

        data.truncate(total);
        Ok(data.freeze())
    }

    async fn read_chunks(&mut self, total: usize) -> Result<Bytes> {
        if total == 0 {
            self.free_buffers().await?;
            return Ok(Bytes::new());
        }

        let mut data = BytesMut::with_capacity(total.min(self.max_chunk));

        while data.len() < total {
            let offset = data.len();
            let size = (total - offset).min(self.max_chunk);

            let mut params = BytesMut::with_capacity(8);
            params.put_i32_le(offset as i32);
            params.put_i32_le(size as i32);

            let ack = self
                .send(Command::ReadBuffer, &params, READ_BUFFER_ACK_SIZE)
                .await?;
            if ack.command != Command::PrepareData {
                return Err(Error::rejected(Command::ReadBuffer, ack.command));
            }

            let block = self.transport.receive_buffered(size).await?;
            self.events.received(&block);

            if block.len() < size {
                return Err(Error::BufferedRead(format!(
                    "chunk at offset {offset} is {} of {size} bytes",
                    block.len()
                )));
            }

            data.extend_from_slice(&block[..size]);
            trace!(offset, size, "Chunk received");
        }

        // Terminal packet closing the transfer
        self.receive_packet(HEADER_SIZE).await?;
        self.free_buffers().await?;

        Ok(data.freeze())
    }

    async fn free_buffers(&mut self) -> Result<()> {
        let reply = self.send(Command::ClearBuffers, &[], HEADER_SIZE).await?;
        if !reply.is_success() {
            return Err(Error::rejected(Command::ClearBuffers, reply.command));
        }
        Ok(())
    }
}
