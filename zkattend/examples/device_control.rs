//! Device control example
//!
//! ```text
//! ZK_DEVICE_IP=192.168.1.201 cargo run --example device_control
//! ```

use std::time::Duration;

use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use zkattend::{Device, DeviceSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = DeviceSettings::from_env()?;
    let mut device = Device::from_settings(&settings);
    device.connect().await?;

    println!("Connected to {} over {}", settings.ip, settings.protocol);
    println!("Firmware: {}", device.get_firmware_version().await?);
    println!("Clock:    {}", device.get_time().await?);

    // Lock the keypad while we write to the display
    device.disable_device().await?;
    device.set_display_text("Maintenance", 1).await?;
    sleep(Duration::from_secs(3)).await;
    device.clear_display_text().await?;
    device.enable_device().await?;

    device.set_time(None).await?;
    println!("Clock synchronised");

    device.disconnect().await?;
    Ok(())
}
