use std::future::Future;
use std::sync::Arc;
use log::{debug, info, warn};

use crate::device::types::{dedup_by_address, BluetoothAdapter, Device};
use crate::error::ScreenError;
use crate::permission::types::{all_granted, PermissionService, Platform};
use crate::screen::state::ScreenState;

/// Asks the adapter whether it is turned on. Any failure counts as "disabled".
pub async fn check_adapter_enabled(bluetooth: Arc<dyn BluetoothAdapter>) -> bool {
    match bluetooth.is_enabled().await {
        Ok(enabled) => enabled,
        Err(err) => {
            warn!("Failed to check whether bluetooth is enabled: {:?}", err);
            false
        },
    }
}

pub async fn request_permissions(permissions: Arc<dyn PermissionService>, platform: Platform) -> bool {
    let capabilities = platform.required_capabilities();
    info!("Requesting permissions {:?} for {:?}", capabilities, platform);

    let answers = match permissions.request(&capabilities).await {
        Ok(answers) => answers,
        Err(err) => {
            warn!("Failed to request permissions: {:?}", err);
            return false;
        },
    };

    match all_granted(&capabilities, &answers) {
        Ok(granted) => {
            if !granted {
                warn!("Permissions not granted: {:?}", answers);
            }
            granted
        },
        Err(err) => {
            warn!("{}", err);
            false
        },
    }
}

pub async fn discover_devices(
    bluetooth: Arc<dyn BluetoothAdapter>,
    permissions: Arc<dyn PermissionService>,
    platform: Platform,
) -> Result<Vec<Device>, ScreenError> {
    if !request_permissions(permissions, platform).await {
        return Err(ScreenError::PermissionDenied);
    }

    if !check_adapter_enabled(bluetooth.clone()).await {
        return Err(ScreenError::AdapterDisabled);
    }

    bluetooth.discover().await
        .map(dedup_by_address)
        .map_err(|source| ScreenError::DiscoveryFailed { source: Arc::new(source) })
}

pub async fn connect_device(device: Device) -> Result<(), ScreenError> {
    match device.handle().connect().await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ScreenError::ConnectFailed { address: device.address, source: None }),
        Err(err) => Err(ScreenError::ConnectFailed { address: device.address, source: Some(Arc::new(err)) }),
    }
}

pub async fn disconnect_device(device: Device) -> Result<(), ScreenError> {
    match device.handle().disconnect().await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ScreenError::DisconnectFailed { address: device.address, source: None }),
        Err(err) => Err(ScreenError::DisconnectFailed { address: device.address, source: Some(Arc::new(err)) }),
    }
}

/// Drives the connection screen. Every operation is split into a `start_*` half that updates the
/// state and hands out an owned future, and a `finish_*` half that applies its outcome. The GUI
/// runs the future as a command in between; the `async` methods run both halves back to back.
pub struct ConnectionController {
    state: ScreenState,
    bluetooth: Arc<dyn BluetoothAdapter>,
    permissions: Arc<dyn PermissionService>,
    platform: Platform,
}

impl ConnectionController {
    pub fn new(bluetooth: Arc<dyn BluetoothAdapter>, permissions: Arc<dyn PermissionService>, platform: Platform) -> Self {
        ConnectionController {
            state: ScreenState::default(),
            bluetooth,
            permissions,
            platform,
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn bluetooth(&self) -> Arc<dyn BluetoothAdapter> {
        self.bluetooth.clone()
    }

    pub fn dismiss_alert(&mut self) {
        self.state.dismiss_alert();
    }

    pub fn device_lost(&mut self, address: &str) {
        self.state.device_lost(address);
    }

    pub fn start_adapter_check(&self) -> impl Future<Output = bool> + Send + 'static {
        check_adapter_enabled(self.bluetooth.clone())
    }

    pub fn finish_adapter_check(&mut self, enabled: bool) {
        self.state.set_adapter_enabled(enabled);
    }

    pub fn start_discovery(&mut self) -> Option<impl Future<Output = Result<Vec<Device>, ScreenError>> + Send + 'static> {
        if let Err(err) = self.state.begin_scan() {
            debug!("Not starting discovery: {}", err);
            return None;
        }

        Some(discover_devices(self.bluetooth.clone(), self.permissions.clone(), self.platform))
    }

    /// Returns the adapter check that must follow a failed discovery.
    pub fn finish_discovery(&mut self, result: Result<Vec<Device>, ScreenError>) -> Option<impl Future<Output = bool> + Send + 'static> {
        let recheck = matches!(result, Err(ScreenError::DiscoveryFailed { .. }));
        self.state.finish_scan(result);

        if recheck {
            Some(self.start_adapter_check())
        } else {
            None
        }
    }

    pub fn start_connect(&mut self, device: Device) -> Option<impl Future<Output = Result<(), ScreenError>> + Send + 'static> {
        if let Err(err) = self.state.begin_connect(device.clone()) {
            debug!("Not connecting to {}: {}", device, err);
            return None;
        }

        Some(connect_device(device))
    }

    pub fn finish_connect(&mut self, result: Result<(), ScreenError>) {
        self.state.finish_connect(result);
    }

    pub fn start_disconnect(&mut self) -> Option<impl Future<Output = Result<(), ScreenError>> + Send + 'static> {
        self.state.begin_disconnect().map(disconnect_device)
    }

    pub fn finish_disconnect(&mut self, result: Result<(), ScreenError>) {
        self.state.finish_disconnect(result);
    }

    pub async fn mount(&mut self) {
        self.check_adapter_enabled().await;
    }

    pub async fn check_adapter_enabled(&mut self) -> bool {
        let enabled = self.start_adapter_check().await;
        self.finish_adapter_check(enabled);
        enabled
    }

    pub async fn request_permissions(&self) -> bool {
        request_permissions(self.permissions.clone(), self.platform).await
    }

    pub async fn discover_devices(&mut self) {
        let Some(discovery) = self.start_discovery() else {
            return;
        };

        let result = discovery.await;
        if let Some(check) = self.finish_discovery(result) {
            let enabled = check.await;
            self.finish_adapter_check(enabled);
        }
    }

    pub async fn connect(&mut self, device: &Device) {
        if let Some(connect) = self.start_connect(device.clone()) {
            let result = connect.await;
            self.finish_connect(result);
        }
    }

    pub async fn disconnect(&mut self) {
        if let Some(disconnect) = self.start_disconnect() {
            let result = disconnect.await;
            self.finish_disconnect(result);
        }
    }
}
