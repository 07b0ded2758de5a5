//! # zkattend
//!
//! Client for the binary protocol spoken by ZKTeco biometric time clocks.
//!
//! ## Features
//!
//! - TCP and UDP transports
//! - Commkey authentication
//! - Buffered reads of the user table and attendance log
//! - User enrollment, device control, clock and display
//! - Traffic and failure notifications over a broadcast channel
//!
//! ## Quick Start
//!
//! ```no_run
//! use zkattend::Device;
//!
//! #[tokio::main]
//! async fn main() -> zkattend::Result<()> {
//!     let mut device = Device::new("192.168.1.201", 4370);
//!     device.connect().await?;
//!
//!     for punch in device.get_attendance().await? {
//!         println!("{punch}");
//!     }
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

mod attendance;
pub mod channel;
pub mod config;
pub mod device;
pub mod error;
mod users;

#[cfg(test)]
mod testing;

// Re-exports
pub use channel::{BufferedRequest, CommandChannel};
pub use config::{DeviceSettings, Protocol};
pub use device::Device;
pub use error::{Error, Result};

// Re-export protocol and record types
pub use zkattend_core::{Command, Packet, Session, SessionState};
pub use zkattend_transport::{Event, Transport};
pub use zkattend_types::{
    AttendancePunch, DeviceInfo, DeviceTime, Privilege, StorageCounts, User,
};
