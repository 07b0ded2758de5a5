//! Record layouts exchanged with ZKTeco terminals

pub mod attendance;
pub mod device_info;
pub mod error;
mod field;
pub mod storage;
pub mod timestamp;
pub mod user;

pub use attendance::AttendancePunch;
pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use storage::StorageCounts;
pub use timestamp::DeviceTime;
pub use user::{Privilege, User};
