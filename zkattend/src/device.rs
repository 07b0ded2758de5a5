//! High-level device interface

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, BytesMut};
use chrono::NaiveDateTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use zkattend_core::auth::commkey;
use zkattend_core::constants::{options, DATA_REPLY_SIZE};
use zkattend_core::{Command, Packet, Session, HEADER_SIZE};
use zkattend_transport::{Event, EventBus, TcpTransport, Transport, UdpTransport};
use zkattend_types::{DeviceInfo, DeviceTime, StorageCounts};

use crate::channel::CommandChannel;
use crate::config::{DeviceSettings, Protocol};
use crate::error::{Error, Result};

/// ZKTeco device
///
/// High-level interface for communicating with ZKTeco time clocks. One
/// request is in flight at a time; every operation takes `&mut self`.
///
/// Every public operation that fails also publishes one
/// [`Event::CommandError`] to subscribers.
///
/// # Examples
///
/// ```no_run
/// use zkattend::Device;
///
/// #[tokio::main]
/// async fn main() -> zkattend::Result<()> {
///     let mut device = Device::new("192.168.1.201", 4370);
///
///     device.connect().await?;
///     println!("Firmware: {}", device.get_firmware_version().await?);
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    pub(crate) channel: CommandChannel,
    session: Session,
    events: EventBus,
    password: u32,
}

impl Device {
    /// Create a device reached over TCP
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(TcpTransport::new(ip, port)))
    }

    /// Create a device reached over UDP
    pub fn new_udp(ip: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(UdpTransport::new(ip, port)))
    }

    /// Create a device from settings
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        let transport: Box<dyn Transport> = match settings.protocol {
            Protocol::Tcp => Box::new(
                TcpTransport::new(settings.ip.clone(), settings.port)
                    .with_timeout(settings.timeout),
            ),
            Protocol::Udp => Box::new(
                UdpTransport::new(settings.ip.clone(), settings.port)
                    .with_timeout(settings.timeout),
            ),
        };

        Self::with_transport(transport).with_password(settings.password)
    }

    /// Create a device on top of any transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        let session = Session::new();
        let events = EventBus::default();

        Self {
            channel: CommandChannel::new(transport, session.clone(), events.clone()),
            session,
            events,
            password: 0,
        }
    }

    /// Set CommKey password (default: 0)
    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    /// Cap the chunk size of buffered reads below the transport's maximum
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.channel = self.channel.with_max_chunk(max_chunk);
        self
    }

    /// Receive traffic and failure notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Authenticated session over an open transport
    pub fn is_connected(&self) -> bool {
        self.session.is_authenticated() && self.channel.transport().is_connected()
    }

    /// Connect and, if the device asks for it, authenticate
    ///
    /// Succeeds immediately when already connected. On failure the transport
    /// is closed and the session reset.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let result = self.open_session().await;
        if result.is_err() {
            self.abort_session().await;
        }
        self.report(result)
    }

    /// End the session; a no-op when not connected
    ///
    /// The session is reset and the transport closed only when the device
    /// acknowledges the disconnect.
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }

        let result = self.close_session().await;
        self.report(result)
    }

    pub async fn enable_device(&mut self) -> Result<()> {
        let result = self.command(Command::EnableDevice, &[]).await;
        self.report(result)
    }

    /// Lock the keypad and sensors ("Working..." on the display)
    pub async fn disable_device(&mut self) -> Result<()> {
        let result = self.command(Command::DisableDevice, &[]).await;
        self.report(result)
    }

    pub async fn restart_device(&mut self) -> Result<()> {
        warn!("Restarting device...");
        let result = self.command(Command::Restart, &[]).await;
        self.report(result)
    }

    pub async fn shutdown_device(&mut self) -> Result<()> {
        warn!("Powering off device...");
        let result = self.command(Command::PowerOff, &[]).await;
        self.report(result)
    }

    /// Release any device-side transfer buffer
    pub async fn clear_buffer(&mut self) -> Result<()> {
        let result = self.command(Command::ClearBuffers, &[]).await;
        self.report(result)
    }

    /// Make the device reload its tables after a change
    pub async fn refresh_data(&mut self) -> Result<()> {
        let result = self.command(Command::RefreshData, &[]).await;
        self.report(result)
    }

    /// Show `text` on display line `line`
    pub async fn set_display_text(&mut self, text: &str, line: i16) -> Result<()> {
        let mut payload = BytesMut::with_capacity(3 + text.len());
        payload.put_i16_le(line);
        payload.put_u8(0);
        payload.put_slice(text.as_bytes());

        let result = self.command(Command::SetDisplay, &payload).await;
        self.report(result)
    }

    pub async fn clear_display_text(&mut self) -> Result<()> {
        let result = self.command(Command::ClearDisplay, &[]).await;
        self.report(result)
    }

    /// Acknowledge a pending error state on the device
    ///
    /// Sends `FailedExecute` four times and expects `Success` to each. Some
    /// firmware follows the first exchange with a dedicated clear-error code
    /// instead; that code is undocumented, so devices which need it will
    /// answer with an error status here.
    pub async fn clear_error(&mut self) -> Result<()> {
        let result = self.clear_error_state().await;
        self.report(result)
    }

    pub async fn get_time(&mut self) -> Result<NaiveDateTime> {
        let result = self.read_time().await;
        self.report(result)
    }

    /// Set the device clock, to local time when `time` is `None`
    pub async fn set_time(&mut self, time: Option<NaiveDateTime>) -> Result<()> {
        let result = self.write_time(time).await;
        self.report(result)
    }

    pub async fn get_firmware_version(&mut self) -> Result<String> {
        let result = self.read_firmware_version().await;
        self.report(result)
    }

    /// Read any configuration option by key
    pub async fn get_option(&mut self, key: &str) -> Result<String> {
        let result = self.read_option(key).await;
        self.report(result)
    }

    pub async fn get_device_extended_format(&mut self) -> Result<String> {
        self.get_option(options::EXTENDED_FORMAT).await
    }

    pub async fn get_device_face_version(&mut self) -> Result<String> {
        self.get_option(options::FACE_VERSION).await
    }

    pub async fn get_device_fingerprint_version(&mut self) -> Result<String> {
        self.get_option(options::FINGERPRINT_VERSION).await
    }

    pub async fn get_device_ip(&mut self) -> Result<String> {
        self.get_option(options::IP_ADDRESS).await
    }

    pub async fn get_device_gateway_ip(&mut self) -> Result<String> {
        self.get_option(options::GATEWAY).await
    }

    pub async fn get_device_mac(&mut self) -> Result<String> {
        self.get_option(options::MAC).await
    }

    pub async fn get_device_name(&mut self) -> Result<String> {
        self.get_option(options::DEVICE_NAME).await
    }

    pub async fn get_device_old_firmware_version(&mut self) -> Result<String> {
        self.get_option(options::OLD_FIRMWARE).await
    }

    pub async fn get_device_platform(&mut self) -> Result<String> {
        self.get_option(options::PLATFORM).await
    }

    pub async fn get_device_serial(&mut self) -> Result<String> {
        self.get_option(options::SERIAL_NUMBER).await
    }

    pub async fn get_device_subnet_mask(&mut self) -> Result<String> {
        self.get_option(options::NETMASK).await
    }

    pub async fn get_device_user_extended_format(&mut self) -> Result<String> {
        self.get_option(options::USER_EXTENDED_FORMAT).await
    }

    /// Firmware version plus whatever identification options the device knows
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        let result = self.read_device_info().await;
        self.report(result)
    }

    /// User, record and fingerprint counters
    pub async fn get_storage_details(&mut self) -> Result<StorageCounts> {
        let result = self.read_storage().await;
        self.report(result)
    }

    // Helper methods

    /// Publish the failure of a public operation
    pub(crate) fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "Device operation failed");
            self.events.command_error(e.to_string());
        }
        result
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// One exchange on an established session
    pub(crate) async fn exchange(
        &mut self,
        command: Command,
        payload: &[u8],
        expected_len: usize,
    ) -> Result<Packet> {
        self.ensure_connected()?;
        self.channel.send(command, payload, expected_len).await
    }

    /// Like [`Device::exchange`], requiring a `Success` reply
    pub(crate) async fn expect_success(
        &mut self,
        command: Command,
        payload: &[u8],
        expected_len: usize,
    ) -> Result<Packet> {
        let reply = self.exchange(command, payload, expected_len).await?;
        if !reply.is_success() {
            warn!(request = %command, status = %reply.command, "Device rejected command");
            return Err(Error::rejected(command, reply.command));
        }
        Ok(reply)
    }

    /// Status-only command
    pub(crate) async fn command(&mut self, command: Command, payload: &[u8]) -> Result<()> {
        self.expect_success(command, payload, HEADER_SIZE).await?;
        Ok(())
    }

    async fn open_session(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.channel.transport().remote_addr());

        self.session.close();
        self.session.begin_connect()?;

        if !self.channel.transport().is_connected() {
            self.channel.transport_mut().connect().await?;
        }

        let reply = self.channel.send(Command::Connect, &[], HEADER_SIZE).await?;
        let connection_id = reply.connection_id;
        self.session.initialize(connection_id)?;

        match reply.command {
            Command::Unauthorized => {
                info!("Device requires authentication, sending password...");

                let key = commkey(self.password, connection_id);
                let auth = self
                    .channel
                    .send(Command::Authenticate, &key, HEADER_SIZE)
                    .await?;

                if !auth.is_success() {
                    warn!(status = %auth.command, "Authentication rejected");
                    return Err(zkattend_core::Error::AuthenticationFailed.into());
                }
            }
            status if !status.is_success() => {
                debug!(%status, "Connect answered without Success, treating as open");
            }
            _ => {}
        }

        self.session.authenticate()?;
        info!(connection_id, "Connected to {}", self.channel.transport().remote_addr());

        Ok(())
    }

    async fn abort_session(&mut self) {
        self.session.close();
        if let Err(e) = self.channel.transport_mut().disconnect().await {
            debug!(error = %e, "Closing transport after failed connect");
        }
    }

    async fn close_session(&mut self) -> Result<()> {
        info!("Disconnecting from {}...", self.channel.transport().remote_addr());

        self.command(Command::Disconnect, &[]).await?;

        self.session.close();
        self.channel.transport_mut().disconnect().await?;

        info!("Disconnected");
        Ok(())
    }

    /// The first exchange carries the error status itself; the device
    /// answers each with `Success` once the condition is acknowledged.
    async fn clear_error_state(&mut self) -> Result<()> {
        for _ in 0..4 {
            self.expect_success(Command::FailedExecute, &[], DATA_REPLY_SIZE)
                .await?;
        }
        Ok(())
    }

    async fn read_time(&mut self) -> Result<NaiveDateTime> {
        let reply = self
            .expect_success(Command::GetTime, &[], DATA_REPLY_SIZE)
            .await?;

        if reply.payload.len() < 4 {
            return Err(Error::InvalidResponse(format!(
                "time payload is {} bytes",
                reply.payload.len()
            )));
        }

        let time = DeviceTime::decode(LittleEndian::read_u32(&reply.payload[..4]));
        debug!(%time, "Device time");
        Ok(time.to_datetime()?)
    }

    async fn write_time(&mut self, time: Option<NaiveDateTime>) -> Result<()> {
        let time = time.unwrap_or_else(|| chrono::Local::now().naive_local());
        let encoded = DeviceTime::try_from(time)?.encode();

        self.command(Command::SetTime, &encoded.to_le_bytes()).await
    }

    async fn read_firmware_version(&mut self) -> Result<String> {
        let reply = self
            .expect_success(Command::FirmwareVersion, &[], DATA_REPLY_SIZE)
            .await?;

        Ok(text_payload(&reply.payload))
    }

    /// Ask for `key`; the device answers `key=value`
    async fn read_option(&mut self, key: &str) -> Result<String> {
        let mut request = Vec::with_capacity(key.len() + 2);
        request.extend_from_slice(key.as_bytes());
        request.push(0);
        if request.len() % 2 != 0 {
            request.push(0);
        }

        let reply = self
            .expect_success(Command::ReadConfiguration, &request, DATA_REPLY_SIZE)
            .await?;

        let text = text_payload(&reply.payload);
        let value = text.rsplit('=').next().unwrap_or_default().to_string();
        debug!(key, value, "Read option");

        Ok(value)
    }

    async fn read_device_info(&mut self) -> Result<DeviceInfo> {
        let mut info = DeviceInfo::new(self.read_firmware_version().await?);

        info.serial_number = self.read_optional(options::SERIAL_NUMBER).await;
        info.platform = self.read_optional(options::PLATFORM).await;
        info.device_name = self.read_optional(options::DEVICE_NAME).await;
        info.mac_address = self.read_optional(options::MAC).await;
        info.ip_address = self.read_optional(options::IP_ADDRESS).await;
        info.subnet_mask = self.read_optional(options::NETMASK).await;
        info.gateway = self.read_optional(options::GATEWAY).await;

        debug!(%info, "Device info");
        Ok(info)
    }

    async fn read_optional(&mut self, key: &str) -> Option<String> {
        match self.read_option(key).await {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(key, error = %e, "Option unavailable");
                None
            }
        }
    }

    pub(crate) async fn read_storage(&mut self) -> Result<StorageCounts> {
        let reply = self
            .expect_success(Command::CheckStorage, &[], DATA_REPLY_SIZE)
            .await?;

        let counts = StorageCounts::decode(&reply.payload)?;
        debug!(%counts, "Storage");
        Ok(counts)
    }
}

/// Decode a text payload, dropping NUL padding
fn text_payload(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_matches(char::from(0))
        .to_string()
}

/// Split a buffered table into `count` equal records after the size prefix
pub(crate) fn split_records(
    data: &[u8],
    count: usize,
) -> Result<(usize, std::slice::ChunksExact<'_, u8>)> {
    let body = data.get(4..).ok_or_else(|| {
        Error::InvalidResponse(format!("table of {} bytes has no size prefix", data.len()))
    })?;

    let width = body.len() / count.max(1);
    if width == 0 || body.len() % count.max(1) != 0 {
        return Err(Error::InvalidResponse(format!(
            "{} bytes do not split into {} records",
            body.len(),
            count
        )));
    }

    Ok((width, body.chunks_exact(width)))
}
