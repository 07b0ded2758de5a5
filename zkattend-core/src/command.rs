//! Device command and status codes
//!
//! Requests and replies share one 16-bit code space: a reply carries its
//! status (`Success`, `Unauthorized`, ...) in the same header field a request
//! uses for its command. Which request a status answers is known only to the
//! caller that just sent it.

use std::fmt;

/// Protocol command codes
///
/// Grouped as control commands, data commands, buffered-transfer commands and
/// status codes. Codes outside the table decode to [`Command::Unknown`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    // Control
    Connect,
    Disconnect,
    EnableDevice,
    DisableDevice,
    Restart,
    PowerOff,
    Sleep,
    WakeUp,
    RefreshData,
    FirmwareVersion,
    Authenticate,
    GetTime,
    SetTime,
    SetDisplay,
    ClearDisplay,

    // Data
    CreateUser,
    ReadUsers,
    ReadConfiguration,
    ReadAttendance,
    DeleteAttendance,
    DeleteUser,
    CheckStorage,

    // Buffered transfer
    PrepareData,
    SendData,
    ClearBuffers,
    PrepareBuffers,
    ReadBuffer,

    // Status (replies from device)
    Success,
    FailedExecute,
    DataAvailable,
    Retry,
    Repeat,
    Unauthorized,
    UnknownResponse,
    FailedCommand,
    FailedInitialization,
    FailedParameterValidation,

    /// Code not in the table, kept verbatim
    Unknown(u16),
}

impl Command {
    /// Wire code of this command
    pub fn code(self) -> u16 {
        match self {
            Self::Connect => 1000,
            Self::Disconnect => 1001,
            Self::EnableDevice => 1002,
            Self::DisableDevice => 1003,
            Self::Restart => 1004,
            Self::PowerOff => 1005,
            Self::Sleep => 1006,
            Self::WakeUp => 1007,
            Self::RefreshData => 1013,
            Self::FirmwareVersion => 1100,
            Self::Authenticate => 1102,
            Self::GetTime => 201,
            Self::SetTime => 202,
            Self::SetDisplay => 66,
            Self::ClearDisplay => 67,
            Self::CreateUser => 8,
            Self::ReadUsers => 9,
            Self::ReadConfiguration => 11,
            Self::ReadAttendance => 13,
            Self::DeleteAttendance => 15,
            Self::DeleteUser => 18,
            Self::CheckStorage => 50,
            Self::PrepareData => 1500,
            Self::SendData => 1501,
            Self::ClearBuffers => 1502,
            Self::PrepareBuffers => 1503,
            Self::ReadBuffer => 1504,
            Self::Success => 2000,
            Self::FailedExecute => 2001,
            Self::DataAvailable => 2002,
            Self::Retry => 2003,
            Self::Repeat => 2004,
            Self::Unauthorized => 2005,
            Self::UnknownResponse => 0xFFFF,
            Self::FailedCommand => 0xFFFD,
            Self::FailedInitialization => 0xFFFC,
            Self::FailedParameterValidation => 0xFFFB,
            Self::Unknown(code) => code,
        }
    }

    /// Control commands (session, power, display, time)
    pub fn is_control(self) -> bool {
        matches!(
            self,
            Self::Connect
                | Self::Disconnect
                | Self::EnableDevice
                | Self::DisableDevice
                | Self::Restart
                | Self::PowerOff
                | Self::Sleep
                | Self::WakeUp
                | Self::RefreshData
                | Self::FirmwareVersion
                | Self::Authenticate
                | Self::GetTime
                | Self::SetTime
                | Self::SetDisplay
                | Self::ClearDisplay
        )
    }

    /// Data commands (users, attendance, configuration, storage)
    pub fn is_data(self) -> bool {
        matches!(
            self,
            Self::CreateUser
                | Self::ReadUsers
                | Self::ReadConfiguration
                | Self::ReadAttendance
                | Self::DeleteAttendance
                | Self::DeleteUser
                | Self::CheckStorage
        )
    }

    /// Commands of the two-phase buffered transfer
    pub fn is_buffered(self) -> bool {
        matches!(
            self,
            Self::PrepareData
                | Self::SendData
                | Self::ClearBuffers
                | Self::PrepareBuffers
                | Self::ReadBuffer
        )
    }

    /// Status codes sent by the device in place of a command
    pub fn is_status(self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::FailedExecute
                | Self::DataAvailable
                | Self::Retry
                | Self::Repeat
                | Self::Unauthorized
                | Self::UnknownResponse
                | Self::FailedCommand
                | Self::FailedInitialization
                | Self::FailedParameterValidation
        )
    }

    /// Check if this is a success status
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if this is a failure status
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::FailedExecute
                | Self::UnknownResponse
                | Self::FailedCommand
                | Self::FailedInitialization
                | Self::FailedParameterValidation
        )
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Connect => "CMD_CONNECT",
            Self::Disconnect => "CMD_EXIT",
            Self::EnableDevice => "CMD_ENABLEDEVICE",
            Self::DisableDevice => "CMD_DISABLEDEVICE",
            Self::Restart => "CMD_RESTART",
            Self::PowerOff => "CMD_POWEROFF",
            Self::Sleep => "CMD_SLEEP",
            Self::WakeUp => "CMD_RESUME",
            Self::RefreshData => "CMD_REFRESHDATA",
            Self::FirmwareVersion => "CMD_GET_VERSION",
            Self::Authenticate => "CMD_AUTH",
            Self::GetTime => "CMD_GET_TIME",
            Self::SetTime => "CMD_SET_TIME",
            Self::SetDisplay => "CMD_WRITE_LCD",
            Self::ClearDisplay => "CMD_CLEAR_LCD",
            Self::CreateUser => "CMD_USER_WRQ",
            Self::ReadUsers => "CMD_USERTEMP_RRQ",
            Self::ReadConfiguration => "CMD_OPTIONS_RRQ",
            Self::ReadAttendance => "CMD_ATTLOG_RRQ",
            Self::DeleteAttendance => "CMD_CLEAR_ATTLOG",
            Self::DeleteUser => "CMD_DELETE_USER",
            Self::CheckStorage => "CMD_GET_FREE_SIZES",
            Self::PrepareData => "CMD_PREPARE_DATA",
            Self::SendData => "CMD_DATA",
            Self::ClearBuffers => "CMD_FREE_DATA",
            Self::PrepareBuffers => "CMD_PREPARE_BUFFER",
            Self::ReadBuffer => "CMD_READ_BUFFER",
            Self::Success => "CMD_ACK_OK",
            Self::FailedExecute => "CMD_ACK_ERROR",
            Self::DataAvailable => "CMD_ACK_DATA",
            Self::Retry => "CMD_ACK_RETRY",
            Self::Repeat => "CMD_ACK_REPEAT",
            Self::Unauthorized => "CMD_ACK_UNAUTH",
            Self::UnknownResponse => "CMD_ACK_UNKNOWN",
            Self::FailedCommand => "CMD_ACK_ERROR_CMD",
            Self::FailedInitialization => "CMD_ACK_ERROR_INIT",
            Self::FailedParameterValidation => "CMD_ACK_ERROR_DATA",
            Self::Unknown(_) => "CMD_UNKNOWN",
        }
    }
}

impl From<Command> for u16 {
    fn from(cmd: Command) -> u16 {
        cmd.code()
    }
}

impl From<u16> for Command {
    fn from(value: u16) -> Self {
        match value {
            1000 => Self::Connect,
            1001 => Self::Disconnect,
            1002 => Self::EnableDevice,
            1003 => Self::DisableDevice,
            1004 => Self::Restart,
            1005 => Self::PowerOff,
            1006 => Self::Sleep,
            1007 => Self::WakeUp,
            1013 => Self::RefreshData,
            1100 => Self::FirmwareVersion,
            1102 => Self::Authenticate,
            201 => Self::GetTime,
            202 => Self::SetTime,
            66 => Self::SetDisplay,
            67 => Self::ClearDisplay,
            8 => Self::CreateUser,
            9 => Self::ReadUsers,
            11 => Self::ReadConfiguration,
            13 => Self::ReadAttendance,
            15 => Self::DeleteAttendance,
            18 => Self::DeleteUser,
            50 => Self::CheckStorage,
            1500 => Self::PrepareData,
            1501 => Self::SendData,
            1502 => Self::ClearBuffers,
            1503 => Self::PrepareBuffers,
            1504 => Self::ReadBuffer,
            2000 => Self::Success,
            2001 => Self::FailedExecute,
            2002 => Self::DataAvailable,
            2003 => Self::Retry,
            2004 => Self::Repeat,
            2005 => Self::Unauthorized,
            0xFFFF => Self::UnknownResponse,
            0xFFFD => Self::FailedCommand,
            0xFFFC => Self::FailedInitialization,
            0xFFFB => Self::FailedParameterValidation,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}
