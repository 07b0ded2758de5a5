//! Device timestamp
//!
//! Terminals count seconds from 2000-01-01 as if every month had 31 days.
//! The encoding is therefore not Unix time and cannot be converted with
//! calendar arithmetic; it has to be taken apart field by field.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

const MINUTE: u32 = 60;
const HOUR: u32 = 60 * MINUTE;
const DAY: u32 = 24 * HOUR;
const MONTH: u32 = 31 * DAY;
const YEAR: u32 = 12 * MONTH;

/// Wall-clock components as the device stores them
///
/// `day` may be 31 in any month: the device's fixed 31-day months make such
/// values reachable and they must survive a round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DeviceTime {
    /// Encode into the device's integer representation
    ///
    /// Years past 2132 do not fit the device's 32 bits and wrap.
    pub fn encode(&self) -> u32 {
        let year = (self.year as u64).saturating_sub(2000);
        let month = (self.month as u64).saturating_sub(1);
        let day = (self.day as u64).saturating_sub(1);

        let seconds = year * YEAR as u64
            + month * MONTH as u64
            + day * DAY as u64
            + self.hour as u64 * HOUR as u64
            + self.minute as u64 * MINUTE as u64
            + self.second as u64;

        seconds as u32
    }

    /// Decode from the device's integer representation
    pub fn decode(mut value: u32) -> Self {
        let second = (value % 60) as u8;
        value /= 60;

        let minute = (value % 60) as u8;
        value /= 60;

        let hour = (value % 24) as u8;
        value /= 24;

        let day = (value % 31) as u8 + 1;
        value /= 31;

        let month = (value % 12) as u8 + 1;
        value /= 12;

        Self {
            year: value as u16 + 2000,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Convert to a calendar date-time; fails for dates like 31 February
    pub fn to_datetime(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|date| {
                date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            })
            .ok_or_else(|| Error::InvalidDate(self.to_string()))
    }
}

impl TryFrom<NaiveDateTime> for DeviceTime {
    type Error = Error;

    fn try_from(value: NaiveDateTime) -> Result<Self> {
        if !(2000..=2132).contains(&value.year()) {
            return Err(Error::YearOutOfRange(value.year()));
        }

        Ok(Self {
            year: value.year() as u16,
            month: value.month() as u8,
            day: value.day() as u8,
            hour: value.hour() as u8,
            minute: value.minute() as u8,
            second: value.second() as u8,
        })
    }
}

impl TryFrom<DeviceTime> for NaiveDateTime {
    type Error = Error;

    fn try_from(value: DeviceTime) -> Result<Self> {
        value.to_datetime()
    }
}

impl fmt::Display for DeviceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn at(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> DeviceTime {
        DeviceTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    #[test]
    fn test_epoch() {
        assert_eq!(at(2000, 1, 1, 0, 0, 0).encode(), 0);
        assert_eq!(DeviceTime::decode(0), at(2000, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_known_value() {
        // ((24 * 12 + 2) * 31 + 14) * 86400 + 8 * 3600 + 30 * 60 + 15
        let t = at(2024, 3, 15, 8, 30, 15);
        assert_eq!(t.encode(), 777_976_215);
        assert_eq!(DeviceTime::decode(777_976_215), t);
    }

    #[test]
    fn test_month_is_31_days() {
        // One device day after 31 January is 1 February
        let jan31 = at(2001, 1, 31, 0, 0, 0).encode();
        assert_eq!(DeviceTime::decode(jan31 + DAY), at(2001, 2, 1, 0, 0, 0));

        // 31 February is representable but not a calendar date
        let feb31 = DeviceTime::decode(at(2001, 2, 31, 0, 0, 0).encode());
        assert_eq!(feb31.day, 31);
        assert!(feb31.to_datetime().is_err());
    }

    #[test]
    fn test_chrono_conversion() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        let device = DeviceTime::try_from(dt).unwrap();
        assert_eq!(device, at(2023, 12, 31, 23, 59, 59));
        assert_eq!(DeviceTime::decode(device.encode()).to_datetime().unwrap(), dt);
    }

    #[test]
    fn test_year_before_2000_rejected() {
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(DeviceTime::try_from(dt).is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            year in 2000u16..=2099,
            month in 1u8..=12,
            day in 1u8..=31,
            hour in 0u8..=23,
            minute in 0u8..=59,
            second in 0u8..=59,
        ) {
            let t = at(year, month, day, hour, minute, second);
            prop_assert_eq!(DeviceTime::decode(t.encode()), t);
        }
    }
}
