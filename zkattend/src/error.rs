//! High-level error types

use zkattend_core::Command;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] zkattend_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zkattend_transport::Error),

    #[error("Record error: {0}")]
    Types(#[from] zkattend_types::Error),

    #[error("Device not connected")]
    NotConnected,

    /// Fewer bytes than a packet header came back
    #[error("Short response from device: {0} bytes")]
    ShortResponse(usize),

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),

    #[error("Buffered read failed: {0}")]
    BufferedRead(String),

    #[error("Invalid settings: {0}")]
    Config(String),
}

impl Error {
    /// The device answered `request` with `status` instead of the expected reply
    pub(crate) fn rejected(request: Command, status: Command) -> Self {
        Self::Core(zkattend_core::Error::DeviceError { request, status })
    }
}
