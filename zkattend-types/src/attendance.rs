//! Attendance punches

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::field::read_text;
use crate::timestamp::DeviceTime;

/// One attendance log entry
///
/// # Record layout (40 bytes, wider records carry trailing reserved bytes)
///
/// ```text
/// offset  size  field
///      0     2  index (LE u16)
///      2    24  user id
///     26     1  status
///     27     4  device timestamp (LE u32)
///     31     1  punch
///     32     8  reserved
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendancePunch {
    /// Device-assigned slot of the user
    pub index: u16,

    /// External id of the user
    pub user_id: String,

    /// Time of the punch in device encoding
    pub timestamp: DeviceTime,

    /// Verification status code
    pub status: u8,

    /// Punch state (check-in, check-out, ...)
    pub punch: u8,
}

impl AttendancePunch {
    /// Minimum record size
    pub const MIN_RECORD_SIZE: usize = 40;

    /// Decode one record of at least 40 bytes
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() < Self::MIN_RECORD_SIZE {
            return Err(Error::RecordSize {
                kind: "attendance record",
                actual: record.len(),
                expected: Self::MIN_RECORD_SIZE,
            });
        }

        Ok(Self {
            index: LittleEndian::read_u16(&record[0..2]),
            user_id: read_text(&record[2..26]),
            status: record[26],
            timestamp: DeviceTime::decode(LittleEndian::read_u32(&record[27..31])),
            punch: record[31],
        })
    }
}

impl fmt::Display for AttendancePunch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Punch[{}](user={}, at={}, status={}, punch={})",
            self.index, self.user_id, self.timestamp, self.status, self.punch
        )
    }
}
