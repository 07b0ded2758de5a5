//! Scripted in-memory transport for channel and device tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use zkattend_core::{Command, Packet};
use zkattend_transport::{Error, Result, Transport};

/// One scripted answer, consumed in order
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// A packet echoing the reply id of the last request
    Packet(Command, Vec<u8>),

    /// Bytes handed back verbatim by `receive`
    Frame(Vec<u8>),

    /// Bytes for `receive_raw`
    Raw(Vec<u8>),

    /// Payload for `receive_buffered`
    Buffered(Vec<u8>),
}

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    connection_id: u16,
    sent: Vec<Packet>,
    replies: VecDeque<Reply>,
}

/// Test-side handle onto a [`MockTransport`]
#[derive(Debug, Clone, Default)]
pub(crate) struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Connection id stamped on every scripted reply
    pub fn set_connection_id(&self, id: u16) {
        self.state.lock().connection_id = id;
    }

    pub fn push(&self, reply: Reply) -> &Self {
        self.state.lock().replies.push_back(reply);
        self
    }

    pub fn reply(&self, command: Command, payload: &[u8]) -> &Self {
        self.push(Reply::Packet(command, payload.to_vec()))
    }

    pub fn success(&self) -> &Self {
        self.reply(Command::Success, &[])
    }

    pub fn sent(&self) -> Vec<Packet> {
        self.state.lock().sent.clone()
    }

    pub fn sent_commands(&self) -> Vec<Command> {
        self.state.lock().sent.iter().map(|p| p.command).collect()
    }

    pub fn pending(&self) -> usize {
        self.state.lock().replies.len()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

pub(crate) struct MockTransport {
    handle: MockHandle,
}

impl MockTransport {
    pub fn new() -> (Self, MockHandle) {
        let handle = MockHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    fn next_reply(&self) -> Result<Reply> {
        let mut state = self.handle.state.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        // An exhausted script behaves like a silent device
        state.replies.pop_front().ok_or(Error::ReadTimeout)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        self.handle.state.lock().connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.handle.state.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        let mut state = self.handle.state.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        let decoded =
            Packet::decode(BytesMut::from(packet)).map_err(|_| Error::ConnectionClosed)?;
        state.sent.push(decoded);
        Ok(())
    }

    async fn receive(&mut self, _max_len: usize) -> Result<BytesMut> {
        match self.next_reply()? {
            Reply::Packet(command, payload) => {
                let state = self.handle.state.lock();
                let reply_id = state.sent.last().map(|p| p.reply_id).unwrap_or_default();
                let packet = Packet::with_payload(
                    command,
                    state.connection_id,
                    reply_id,
                    Bytes::from(payload),
                );
                Ok(packet.encode())
            }
            Reply::Frame(bytes) => Ok(BytesMut::from(&bytes[..])),
            _ => Err(Error::ReadTimeout),
        }
    }

    async fn receive_raw(&mut self, _len: usize) -> Result<BytesMut> {
        match self.next_reply()? {
            Reply::Raw(bytes) => Ok(BytesMut::from(&bytes[..])),
            _ => Err(Error::ReadTimeout),
        }
    }

    async fn receive_buffered(&mut self, _expected_len: usize) -> Result<BytesMut> {
        match self.next_reply()? {
            Reply::Buffered(bytes) => Ok(BytesMut::from(&bytes[..])),
            _ => Err(Error::ReadTimeout),
        }
    }

    fn max_chunk(&self) -> usize {
        zkattend_core::constants::TCP_MAX_CHUNK
    }

    fn remote_addr(&self) -> String {
        "mock".into()
    }
}
