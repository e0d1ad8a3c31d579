use std::sync::Arc;
use clap::Parser;
use log::info;
use tokio::time::sleep;
use ecleaning_connect::init_logging;
use ecleaning_connect::config::io::ConfigIO;
use ecleaning_connect::device::btle::BtleBluetooth;
use ecleaning_connect::permission::btle::BtlePermissions;
use ecleaning_connect::screen::controller::ConnectionController;

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Searches for E-Cleaning devices without opening a window, and optionally connects to one.\n\nExample: ./target/release/ecleaning-scan --address 00:11:22:33:44:55 --hold 10s", long_about = None)]
struct Args {
    /// Connect to the device with this address after the scan, then disconnect again
    #[arg(long)]
    address: Option<String>,

    /// How long to stay connected before disconnecting
    #[arg(long, default_value = "2s")]
    hold: humantime::Duration,

    /// How long to scan for; overrides the config file
    #[arg(long)]
    scan_duration: Option<humantime::Duration>,

    /// Request permissions like Android at this API level
    #[arg(long)]
    android_api_level: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let config_io = ConfigIO::new_sync()?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let mut config = match config_io.read().await {
        Ok(config) => config,
        Err(err) if err.is_file_not_found_error() => Default::default(),
        Err(err) => return Err(err.into()),
    };
    if let Some(scan_duration) = args.scan_duration {
        config.set_scan_duration(*scan_duration);
    }
    if args.android_api_level.is_some() {
        config.android_api_level = args.android_api_level;
    }

    let mut controller = ConnectionController::new(
        Arc::new(BtleBluetooth::new(config.scan_duration())),
        Arc::new(BtlePermissions),
        config.platform(),
    );

    controller.mount().await;
    info!("Bluetooth adapter enabled: {}", controller.state().is_adapter_enabled());

    controller.discover_devices().await;
    for device in controller.state().devices() {
        println!("{}\t{}", device.address, device.display_name());
    }

    if let Some(address) = &args.address {
        let device = controller.state().devices()
            .iter()
            .find(|device| device.address.eq_ignore_ascii_case(address))
            .cloned();

        match device {
            None => println!("Device {} was not found", address),
            Some(device) => {
                controller.connect(&device).await;

                if controller.state().connected_device().is_some() {
                    println!("Connected to {}", device);
                    sleep(*args.hold).await;
                    controller.disconnect().await;

                    if controller.state().connected_device().is_none() {
                        println!("Disconnected from {}", device);
                    }
                }
            },
        }
    }

    let alerts: Vec<&str> = controller.state().alerts().collect();
    if alerts.is_empty() {
        Ok(())
    } else {
        for alert in &alerts {
            eprintln!("{}", alert);
        }
        Err(alerts.join("\n").into())
    }
}
