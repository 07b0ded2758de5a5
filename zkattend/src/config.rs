//! Connection settings

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use zkattend_core::constants::DEFAULT_TIMEOUT_MS;
use zkattend_core::DEFAULT_PORT;

use crate::error::{Error, Result};

/// Socket flavour used to reach the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(Error::Config(format!("unknown protocol {other:?}"))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        })
    }
}

/// Where and how to reach a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub ip: String,
    pub port: u16,
    pub protocol: Protocol,

    /// Commkey password, 0 when the device has none
    pub password: u32,

    /// Connect, read and write timeout
    pub timeout: Duration,
}

impl DeviceSettings {
    pub const ENV_IP: &'static str = "ZK_DEVICE_IP";
    pub const ENV_PORT: &'static str = "ZK_DEVICE_PORT";
    pub const ENV_PROTOCOL: &'static str = "ZK_DEVICE_PROTOCOL";
    pub const ENV_PASSWORD: &'static str = "ZK_DEVICE_PASSWORD";
    pub const ENV_TIMEOUT_MS: &'static str = "ZK_DEVICE_TIMEOUT_MS";

    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: DEFAULT_PORT,
            protocol: Protocol::default(),
            password: 0,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read settings from `ZK_DEVICE_*` environment variables
    ///
    /// `ZK_DEVICE_IP` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ip = lookup(Self::ENV_IP)
            .filter(|ip| !ip.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", Self::ENV_IP)))?;

        let mut settings = Self::new(ip.trim());

        if let Some(port) = lookup(Self::ENV_PORT) {
            settings.port = parse_number(Self::ENV_PORT, &port)?;
        }
        if let Some(protocol) = lookup(Self::ENV_PROTOCOL) {
            settings.protocol = protocol.parse()?;
        }
        if let Some(password) = lookup(Self::ENV_PASSWORD) {
            settings.password = parse_number(Self::ENV_PASSWORD, &password)?;
        }
        if let Some(timeout) = lookup(Self::ENV_TIMEOUT_MS) {
            settings.timeout = Duration::from_millis(parse_number(Self::ENV_TIMEOUT_MS, &timeout)?);
        }

        Ok(settings)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = DeviceSettings::new("10.0.0.5");

        assert_eq!(settings.port, 4370);
        assert_eq!(settings.protocol, Protocol::Tcp);
        assert_eq!(settings.password, 0);
        assert_eq!(settings.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_from_lookup_full() {
        let settings = DeviceSettings::from_lookup(lookup(&[
            ("ZK_DEVICE_IP", "192.168.1.201"),
            ("ZK_DEVICE_PORT", "4371"),
            ("ZK_DEVICE_PROTOCOL", "UDP"),
            ("ZK_DEVICE_PASSWORD", "123456"),
            ("ZK_DEVICE_TIMEOUT_MS", "750"),
        ]))
        .unwrap();

        assert_eq!(
            settings,
            DeviceSettings::new("192.168.1.201")
                .with_port(4371)
                .with_protocol(Protocol::Udp)
                .with_password(123_456)
                .with_timeout(Duration::from_millis(750))
        );
    }

    #[test]
    fn test_from_lookup_requires_ip() {
        assert!(DeviceSettings::from_lookup(lookup(&[])).is_err());
        assert!(DeviceSettings::from_lookup(lookup(&[("ZK_DEVICE_IP", "  ")])).is_err());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let bad_port = lookup(&[("ZK_DEVICE_IP", "h"), ("ZK_DEVICE_PORT", "70000")]);
        assert!(DeviceSettings::from_lookup(bad_port).is_err());

        let bad_protocol = lookup(&[("ZK_DEVICE_IP", "h"), ("ZK_DEVICE_PROTOCOL", "serial")]);
        assert!(DeviceSettings::from_lookup(bad_protocol).is_err());
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!(" tcp ".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!(Protocol::Udp.to_string(), "udp");
    }
}
