//! Storage counters reported by `CheckStorage`

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Current, available and maximum record counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageCounts {
    pub users: i32,
    pub available_users: i32,
    pub maximum_users: i32,
    pub records: i32,
    pub available_records: i32,
    pub maximum_records: i32,
    pub fingers: i32,
    pub available_fingers: i32,
    pub maximum_fingers: i32,
}

impl StorageCounts {
    /// Smallest payload that holds every counter
    pub const MIN_PAYLOAD_SIZE: usize = 80;

    /// Decode from a `CheckStorage` reply payload
    ///
    /// The payload is a table of LE i32 words; the counters sit at fixed word
    /// indices.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::MIN_PAYLOAD_SIZE {
            return Err(Error::RecordSize {
                kind: "storage payload",
                actual: payload.len(),
                expected: Self::MIN_PAYLOAD_SIZE,
            });
        }

        let word = |i: usize| LittleEndian::read_i32(&payload[i * 4..i * 4 + 4]);

        Ok(Self {
            users: word(4),
            fingers: word(6),
            records: word(8),
            maximum_fingers: word(14),
            maximum_users: word(15),
            maximum_records: word(16),
            available_fingers: word(17),
            available_users: word(18),
            available_records: word(19),
        })
    }
}

impl fmt::Display for StorageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users {}/{}, records {}/{}, fingers {}/{}",
            self.users,
            self.maximum_users,
            self.records,
            self.maximum_records,
            self.fingers,
            self.maximum_fingers
        )
    }
}
