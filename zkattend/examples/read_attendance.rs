//! Dump users and the attendance log
//!
//! ```text
//! ZK_DEVICE_IP=192.168.1.201 ZK_DEVICE_PROTOCOL=udp cargo run --example read_attendance
//! ```

use tracing_subscriber::EnvFilter;
use zkattend::{Device, DeviceSettings, Event};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut device = Device::from_settings(&DeviceSettings::from_env()?);

    let mut events = device.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Event::CommandError(message) = event {
                eprintln!("device error: {message}");
            }
        }
    });

    device.connect().await?;

    let info = device.get_device_info().await?;
    let storage = device.get_storage_details().await?;
    println!("{info}");
    println!("{storage}");

    device.disable_device().await?;
    let users = device.get_users().await;
    let punches = device.get_attendance().await;
    device.enable_device().await?;

    for user in users? {
        println!("{user}");
    }
    for punch in punches? {
        println!("{punch}");
    }

    device.disconnect().await?;
    Ok(())
}
