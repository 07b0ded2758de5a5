//! Protocol constants

/// TCP envelope magic words, sent ahead of every stream-framed packet
pub const TCP_MAGIC_1: u16 = 0x5050;
pub const TCP_MAGIC_2: u16 = 0x7D82;

/// Size of the TCP envelope (two magic words + u32 length)
pub const TCP_ENVELOPE_SIZE: usize = 8;

/// Default send/receive timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Largest buffered-read chunk requested over TCP
pub const TCP_MAX_CHUNK: usize = 0xFFC0;

/// Largest buffered-read chunk requested over UDP
pub const UDP_MAX_CHUNK: usize = 16_384;

/// Socket read size used while streaming a TCP chunk
pub const TCP_READ_CHUNK: usize = 4_096;

/// Reply size to expect for commands that return data
pub const DATA_REPLY_SIZE: usize = 1_024;

/// Size of the `PrepareData` acknowledgement to a `ReadBuffer` request
pub const READ_BUFFER_ACK_SIZE: usize = 16;

/// Fixed XOR value used by the commkey transform
pub const COMMKEY_TICKS: u8 = 50;

/// Data type selectors for `PrepareBuffers`
pub mod data_types {
    /// Attendance log
    pub const FCT_ATTLOG: i32 = 0;

    /// User record
    pub const FCT_USER: i32 = 5;
}

/// Configuration keys understood by `ReadConfiguration`
pub mod options {
    pub const EXTENDED_FORMAT: &str = "~ExtendFmt";
    pub const FACE_VERSION: &str = "ZKFaceVersion";
    pub const FINGERPRINT_VERSION: &str = "~ZKFPVersion";
    pub const IP_ADDRESS: &str = "IPAddress";
    pub const GATEWAY: &str = "GATEIPAddress";
    pub const MAC: &str = "MAC";
    pub const DEVICE_NAME: &str = "~DeviceName";
    pub const OLD_FIRMWARE: &str = "CompatOldFirmware";
    pub const PLATFORM: &str = "~Platform";
    pub const SERIAL_NUMBER: &str = "~SerialNumber";
    pub const NETMASK: &str = "NetMask";
    pub const USER_EXTENDED_FORMAT: &str = "~UserExtFmt";
}
