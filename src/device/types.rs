use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use indexmap::IndexMap;

use crate::device::constants::UNNAMED_DEVICE;
use crate::error::BluetoothError;

/// A single peripheral as exposed by the native bluetooth library.
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Returns `Ok(false)` if the device refused the connection.
    async fn connect(&self) -> Result<bool, BluetoothError>;

    /// Returns `Ok(false)` if the link is still up afterwards.
    async fn disconnect(&self) -> Result<bool, BluetoothError>;
}

/// The bluetooth radio of this machine.
#[async_trait]
pub trait BluetoothAdapter: Send + Sync {
    async fn is_enabled(&self) -> Result<bool, BluetoothError>;

    /// Scan for a while and return a snapshot of the devices that were seen.
    async fn discover(&self) -> Result<Vec<Device>, BluetoothError>;

    /// Addresses of devices that dropped their connection, as they happen.
    async fn disconnections(&self) -> Result<BoxStream<'static, String>, BluetoothError> {
        Ok(Box::pin(stream::empty()))
    }
}

#[derive(Clone)]
pub struct Device {
    pub name: Option<String>,
    pub address: String,
    handle: Arc<dyn DeviceHandle>,
}

impl Device {
    pub fn new(name: Option<String>, address: String, handle: Arc<dyn DeviceHandle>) -> Self {
        Device { name, address, handle }
    }

    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED_DEVICE,
        }
    }

    pub fn handle(&self) -> Arc<dyn DeviceHandle> {
        self.handle.clone()
    }
}

/// Keeps the first device seen for every address, in the order they were first seen.
pub fn dedup_by_address(devices: impl IntoIterator<Item = Device>) -> Vec<Device> {
    let mut found: IndexMap<String, Device> = IndexMap::new();
    for device in devices {
        found.entry(device.address.clone()).or_insert(device);
    }
    found.into_values().collect()
}

// devices are identified by their address, the handle is not part of the identity
impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Device {}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandle;

    #[async_trait]
    impl DeviceHandle for NoopHandle {
        async fn connect(&self) -> Result<bool, BluetoothError> { Ok(true) }
        async fn disconnect(&self) -> Result<bool, BluetoothError> { Ok(true) }
    }

    fn device(name: Option<&str>, address: &str) -> Device {
        Device::new(name.map(String::from), address.to_string(), Arc::new(NoopHandle))
    }

    #[test]
    fn identity_is_the_address() {
        assert_eq!(device(Some("E-Cleaning"), "AA:BB"), device(None, "AA:BB"));
        assert_ne!(device(Some("E-Cleaning"), "AA:BB"), device(Some("E-Cleaning"), "AA:BC"));
    }

    #[test]
    fn unnamed_devices_get_a_placeholder() {
        assert_eq!(device(None, "AA:BB").display_name(), UNNAMED_DEVICE);
        assert_eq!(device(Some(""), "AA:BB").display_name(), UNNAMED_DEVICE);
        assert_eq!(device(Some("E-Cleaning"), "AA:BB").to_string(), "E-Cleaning (AA:BB)");
    }

    #[test]
    fn duplicates_keep_the_first_seen_device() {
        let devices = dedup_by_address(vec![
            device(Some("E-Cleaning"), "AA:01"),
            device(Some("Headset"), "AA:02"),
            device(None, "AA:01"),
            device(Some("Watch"), "AA:03"),
            device(Some("Headset 2"), "AA:02"),
            device(Some("E-Cleaning"), "AA:01"),
        ]);

        let addresses: Vec<&str> = devices.iter().map(|d| d.address.as_str()).collect();
        assert_eq!(addresses, ["AA:01", "AA:02", "AA:03"]);
        assert_eq!(devices[0].name.as_deref(), Some("E-Cleaning"));
        assert_eq!(devices[1].name.as_deref(), Some("Headset"));
    }

    #[test]
    fn no_devices_stay_empty() {
        assert!(dedup_by_address(Vec::new()).is_empty());
    }
}
