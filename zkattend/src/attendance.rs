//! Attendance log operations

use tracing::{debug, info};
use zkattend_core::Command;
use zkattend_types::AttendancePunch;

use crate::channel::BufferedRequest;
use crate::device::{split_records, Device};
use crate::error::{Error, Result};

impl Device {
    /// Read the whole attendance log
    pub async fn get_attendance(&mut self) -> Result<Vec<AttendancePunch>> {
        let result = self.read_attendance().await;
        self.report(result)
    }

    /// Erase the attendance log on the device
    pub async fn clear_attendance(&mut self) -> Result<()> {
        let result = self.command(Command::DeleteAttendance, &[]).await;
        if result.is_ok() {
            info!("Attendance log cleared");
        }
        self.report(result)
    }

    async fn read_attendance(&mut self) -> Result<Vec<AttendancePunch>> {
        let counts = self.read_storage().await?;
        if counts.records <= 0 {
            return Ok(Vec::new());
        }

        self.ensure_connected()?;
        let data = self
            .channel
            .read_buffered(Command::ReadAttendance, BufferedRequest::attendance())
            .await?;

        let (width, records) = split_records(&data, counts.records as usize)?;
        if width < AttendancePunch::MIN_RECORD_SIZE {
            return Err(Error::InvalidResponse(format!(
                "attendance records are {width} bytes, expected at least {}",
                AttendancePunch::MIN_RECORD_SIZE
            )));
        }

        let punches = records
            .map(AttendancePunch::decode)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = punches.len(), width, "Read attendance");

        Ok(punches)
    }
}
