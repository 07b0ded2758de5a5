//! Error types for zkattend-core

use crate::command::Command;

/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Packet is too short to be valid
    #[error("Packet too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort { expected: usize, actual: usize },

    /// Illegal session state transition
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Device answered with something other than the expected status
    #[error("Device rejected {request}: {status}")]
    DeviceError { request: Command, status: Command },

    /// Device rejected the commkey
    #[error("Authentication failed - device rejected the password")]
    AuthenticationFailed,

    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },
}
