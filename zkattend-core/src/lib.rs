//! # zkattend-core
//!
//! Core protocol implementation for ZKTeco time-clock terminals.
//!
//! This crate provides the low-level protocol primitives:
//! - Packet structure and encoding/decoding
//! - Checksum calculation
//! - Command and status code table
//! - Commkey password transform
//! - Session counters (connection id, reply id, state)

pub mod auth;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod session;

pub use auth::make_commkey;
pub use command::Command;
pub use error::{Error, Result};
pub use packet::{Header, Packet};
pub use session::{Session, SessionState};

/// Default device port
pub const DEFAULT_PORT: u16 = 4370;

/// Maximum packet size (64KB)
pub const MAX_PACKET_SIZE: usize = 65535;

/// Packet header size
pub const HEADER_SIZE: usize = 8;
