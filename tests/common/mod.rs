use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use ecleaning_connect::device::types::{BluetoothAdapter, Device, DeviceHandle};
use ecleaning_connect::error::{BluetoothError, PermissionError};
use ecleaning_connect::permission::types::{Capability, PermissionService, PermissionStatus};

/// What a fake call should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Refuse,
    Fail,
}

impl Outcome {
    fn result(self) -> Result<bool, BluetoothError> {
        match self {
            Outcome::Succeed => Ok(true),
            Outcome::Refuse => Ok(false),
            Outcome::Fail => Err(BluetoothError::NoAdapter),
        }
    }
}

pub struct FakeDevice {
    pub connect: Mutex<Outcome>,
    pub disconnect: Mutex<Outcome>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
}

impl FakeDevice {
    pub fn new(connect: Outcome, disconnect: Outcome) -> Arc<FakeDevice> {
        Arc::new(FakeDevice {
            connect: Mutex::new(connect),
            disconnect: Mutex::new(disconnect),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        })
    }

    pub fn device(self: &Arc<Self>, name: &str, address: &str) -> Device {
        Device::new(Some(name.to_string()), address.to_string(), self.clone())
    }
}

#[async_trait]
impl DeviceHandle for FakeDevice {
    async fn connect(&self) -> Result<bool, BluetoothError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect.lock().unwrap().result()
    }

    async fn disconnect(&self) -> Result<bool, BluetoothError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.disconnect.lock().unwrap().result()
    }
}

pub struct FakeBluetooth {
    pub enabled: Mutex<Result<bool, ()>>,
    pub devices: Mutex<Result<Vec<Device>, ()>>,
    pub disconnected: Mutex<Vec<String>>,
    pub enabled_calls: AtomicUsize,
    pub discover_calls: AtomicUsize,
}

impl FakeBluetooth {
    pub fn new(enabled: bool, devices: Vec<Device>) -> Arc<FakeBluetooth> {
        Arc::new(FakeBluetooth {
            enabled: Mutex::new(Ok(enabled)),
            devices: Mutex::new(Ok(devices)),
            disconnected: Mutex::new(Vec::new()),
            enabled_calls: AtomicUsize::new(0),
            discover_calls: AtomicUsize::new(0),
        })
    }

    pub fn enabled_calls(&self) -> usize {
        self.enabled_calls.load(Ordering::SeqCst)
    }

    pub fn discover_calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BluetoothAdapter for FakeBluetooth {
    async fn is_enabled(&self) -> Result<bool, BluetoothError> {
        self.enabled_calls.fetch_add(1, Ordering::SeqCst);
        self.enabled.lock().unwrap().map_err(|_| BluetoothError::NoAdapter)
    }

    async fn discover(&self) -> Result<Vec<Device>, BluetoothError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        self.devices.lock().unwrap().clone().map_err(|_| BluetoothError::NoAdapter)
    }

    async fn disconnections(&self) -> Result<BoxStream<'static, String>, BluetoothError> {
        let addresses = self.disconnected.lock().unwrap().clone();
        Ok(stream::iter(addresses).boxed())
    }
}

pub struct FakePermissions {
    pub answer: Mutex<Result<PermissionStatus, ()>>,
    pub requested: Mutex<Vec<Vec<Capability>>>,
}

impl FakePermissions {
    pub fn new(answer: PermissionStatus) -> Arc<FakePermissions> {
        Arc::new(FakePermissions {
            answer: Mutex::new(Ok(answer)),
            requested: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<FakePermissions> {
        Arc::new(FakePermissions {
            answer: Mutex::new(Err(())),
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PermissionService for FakePermissions {
    async fn request(&self, capabilities: &[Capability]) -> Result<HashMap<Capability, PermissionStatus>, PermissionError> {
        self.requested.lock().unwrap().push(capabilities.to_vec());

        let status = self.answer.lock().unwrap()
            .map_err(|_| PermissionError::Bluetooth { source: BluetoothError::NoAdapter })?;

        Ok(capabilities.iter().map(|capability| (*capability, status)).collect())
    }
}
