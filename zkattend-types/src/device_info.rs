//! Device identification

use std::fmt;

/// Identification and network settings read from the device
///
/// Everything except the firmware version comes from configuration keys,
/// which older firmware may not know; those fields are optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub firmware_version: String,
    pub serial_number: Option<String>,
    pub platform: Option<String>,
    pub device_name: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub subnet_mask: Option<String>,
    pub gateway: Option<String>,
}

impl DeviceInfo {
    pub fn new(firmware_version: impl Into<String>) -> Self {
        Self {
            firmware_version: firmware_version.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "?".into());

        write!(
            f,
            "Device[{}](SN: {}, FW: {}, IP: {}, MAC: {})",
            or_unknown(&self.device_name),
            or_unknown(&self.serial_number),
            self.firmware_version,
            or_unknown(&self.ip_address),
            or_unknown(&self.mac_address),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fills_missing_fields() {
        let info = DeviceInfo {
            serial_number: Some("ABC123".into()),
            ..DeviceInfo::new("Ver 6.60")
        };

        assert_eq!(
            info.to_string(),
            "Device[?](SN: ABC123, FW: Ver 6.60, IP: ?, MAC: ?)"
        );
    }
}
