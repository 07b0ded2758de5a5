//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    /// TCP envelope did not start with the two magic words
    #[error("Invalid envelope magic: {first:#06X} {second:#06X}")]
    InvalidMagic { first: u16, second: u16 },

    /// UDP datagram too short to carry a packet header
    #[error("Datagram of {0} bytes is shorter than a packet header")]
    ShortDatagram(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
