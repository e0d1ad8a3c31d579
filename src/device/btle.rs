use std::sync::Arc;
use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::OnceCell;
use tokio::time::{sleep, Duration};

use crate::device::types::{dedup_by_address, BluetoothAdapter, Device, DeviceHandle};
use crate::error::BluetoothError;

/// `BluetoothAdapter` backed by btleplug. The btleplug manager is created lazily, so that it is
/// created on the runtime that first uses it.
pub struct BtleBluetooth {
    manager: OnceCell<Manager>,
    scan_duration: Duration,
}

impl BtleBluetooth {
    pub fn new(scan_duration: Duration) -> Self {
        BtleBluetooth {
            manager: OnceCell::new(),
            scan_duration,
        }
    }

    async fn adapters(&self) -> Result<Vec<Adapter>, BluetoothError> {
        let manager = self.manager
            .get_or_try_init(|| async { Manager::new().await })
            .await?;

        Ok(manager.adapters().await?)
    }
}

async fn adapter_name(adapter: &Adapter) -> String {
    adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string())
}

async fn collect_peripherals(adapter: &Adapter, found: &mut Vec<Device>) -> Result<(), BluetoothError> {
    for peripheral in adapter.peripherals().await? {
        let properties = match peripheral.properties().await {
            Ok(Some(properties)) => properties,
            Ok(None) => {
                debug!("Peripheral has no properties");
                continue;
            },
            Err(err) => {
                warn!("Could not query peripheral for properties: {:?}", err);
                continue;
            },
        };

        debug!(
            "Found peripheral {} {:?} {}",
            properties.address,
            properties.address_type,
            properties.local_name.as_deref().unwrap_or("NONE"),
        );

        let handle = Arc::new(BtleDevice { peripheral });
        found.push(Device::new(properties.local_name, properties.address.to_string(), handle));
    }

    Ok(())
}

#[async_trait]
impl BluetoothAdapter for BtleBluetooth {
    async fn is_enabled(&self) -> Result<bool, BluetoothError> {
        for adapter in self.adapters().await? {
            match adapter.adapter_state().await? {
                CentralState::PoweredOn => return Ok(true),
                state => debug!("Adapter {} is in state {:?}", adapter_name(&adapter).await, state),
            }
        }

        Ok(false)
    }

    async fn discover(&self) -> Result<Vec<Device>, BluetoothError> {
        let adapters = self.adapters().await?;
        if adapters.is_empty() {
            return Err(BluetoothError::NoAdapter);
        }

        for adapter in &adapters {
            info!("Scanning using adapter {}...", adapter_name(adapter).await);
            adapter.start_scan(ScanFilter::default()).await?;
        }

        sleep(self.scan_duration).await;

        let mut found = Vec::new();

        for adapter in &adapters {
            if let Err(err) = adapter.stop_scan().await {
                warn!("Failed to stop scanning: {:?}", err);
            }

            if let Err(err) = collect_peripherals(adapter, &mut found).await {
                warn!("Failed to query adapter for peripherals: {:?}", err);
            }
        }

        // adapters may report the same peripheral more than once
        let devices = dedup_by_address(found);
        info!("Discovery found {} device(s)", devices.len());
        Ok(devices)
    }

    async fn disconnections(&self) -> Result<BoxStream<'static, String>, BluetoothError> {
        let mut streams = Vec::new();

        for adapter in self.adapters().await? {
            let events = adapter.events().await?;

            let addresses = events.filter_map(move |event| {
                let adapter = adapter.clone();

                async move {
                    let CentralEvent::DeviceDisconnected(id) = event else {
                        return None;
                    };

                    let peripheral = adapter.peripheral(&id).await.ok()?;
                    match peripheral.properties().await {
                        Ok(Some(properties)) => Some(properties.address.to_string()),
                        _ => Some(peripheral.address().to_string()),
                    }
                }
            });

            streams.push(addresses.boxed());
        }

        Ok(stream::select_all(streams).boxed())
    }
}

pub struct BtleDevice {
    peripheral: Peripheral,
}

#[async_trait]
impl DeviceHandle for BtleDevice {
    async fn connect(&self) -> Result<bool, BluetoothError> {
        info!("Connecting to peripheral {}...", self.peripheral.address());
        self.peripheral.connect().await?;
        Ok(self.peripheral.is_connected().await?)
    }

    async fn disconnect(&self) -> Result<bool, BluetoothError> {
        info!("Disconnecting from peripheral {}...", self.peripheral.address());
        self.peripheral.disconnect().await?;
        Ok(!self.peripheral.is_connected().await?)
    }
}
