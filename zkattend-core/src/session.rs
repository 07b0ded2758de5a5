//! Session management
//!
//! A session represents one logical connection to a device and tracks:
//! - Connection ID (assigned by device)
//! - Reply ID (rolling sequence, echoed by the device)
//! - Connection state

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use tracing::trace;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Disconnected,

    /// Transport opening, `Connect` not yet answered
    Connecting,

    /// Connect answered, not authenticated
    Connected,

    /// Authenticated and ready for commands
    Authenticated,
}

/// Session manager
///
/// Holds the per-connection counters. Cloning is cheap and clones share
/// state (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Connection ID assigned by device (0 when not connected)
    connection_id: AtomicU16,

    /// Last reply ID sent or echoed (starts at USHRT_MAX - 1 = 65534)
    reply_id: AtomicU16,

    /// Current session state
    state: parking_lot::RwLock<SessionState>,
}

/// Reply id following `current`: increments mod 65536, never yields 0.
pub fn next_reply_id(current: u16) -> u16 {
    match current.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

impl Session {
    /// Initial reply ID (USHRT_MAX - 1)
    pub const INITIAL_REPLY_ID: u16 = 65534;

    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                connection_id: AtomicU16::new(0),
                reply_id: AtomicU16::new(Self::INITIAL_REPLY_ID),
                state: parking_lot::RwLock::new(SessionState::Disconnected),
            }),
        }
    }

    /// Get current connection ID
    pub fn connection_id(&self) -> u16 {
        self.inner.connection_id.load(Ordering::Acquire)
    }

    /// Get the last reply ID sent or echoed
    pub fn reply_id(&self) -> u16 {
        self.inner.reply_id.load(Ordering::Acquire)
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Check if the device has answered `Connect`
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            SessionState::Connected | SessionState::Authenticated
        )
    }

    /// Check if authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated)
    }

    /// Enter `Connecting` while the transport opens
    pub fn begin_connect(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot connect from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Connecting;
        Ok(())
    }

    /// Record the device-assigned connection ID
    pub fn initialize(&self, connection_id: u16) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Connecting {
            return Err(Error::InvalidSessionState(format!(
                "Cannot initialize from state: {:?}",
                *state
            )));
        }

        self.inner.connection_id.store(connection_id, Ordering::Release);
        *state = SessionState::Connected;

        Ok(())
    }

    /// Mark session as authenticated
    pub fn authenticate(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Connected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot authenticate from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Authenticated;
        Ok(())
    }

    /// Close session, resetting connection and reply IDs
    pub fn close(&self) {
        let mut state = self.inner.state.write();
        self.inner.connection_id.store(0, Ordering::Release);
        self.inner
            .reply_id
            .store(Self::INITIAL_REPLY_ID, Ordering::Release);
        *state = SessionState::Disconnected;
    }

    /// Advance and return the reply ID for the next outgoing packet
    pub fn next_reply_id(&self) -> u16 {
        let mut current = self.reply_id();
        loop {
            let next = next_reply_id(current);
            match self.inner.reply_id.compare_exchange(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Adopt the reply ID echoed by the device
    pub fn acknowledge(&self, echoed: u16) {
        let sent = self.inner.reply_id.swap(echoed, Ordering::AcqRel);
        if sent != echoed {
            trace!(sent, echoed, "Device echoed a different reply id");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
