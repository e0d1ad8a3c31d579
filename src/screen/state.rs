use std::collections::VecDeque;
use log::{debug, error, info, warn};

use crate::device::types::Device;
use crate::error::ScreenError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting(Device),
    Connected(Device),
    Disconnecting(Device),
}

/// Everything the connection screen shows. Only mutated through the transitions below, which keep
/// the flags consistent no matter how an operation ends.
#[derive(Debug)]
pub struct ScreenState {
    devices: Vec<Device>,
    connection: ConnectionState,
    scanning: bool,
    adapter_enabled: bool,

    // messages that the user must click away
    alerts: VecDeque<String>,
}

impl Default for ScreenState {
    fn default() -> Self {
        ScreenState {
            devices: Vec::new(),
            connection: ConnectionState::Disconnected,
            scanning: false,
            adapter_enabled: false,
            alerts: VecDeque::new(),
        }
    }
}

impl ScreenState {
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn connected_device(&self) -> Option<&Device> {
        match &self.connection {
            ConnectionState::Connected(device) => Some(device),
            _ => None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// A connect or disconnect is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.connection, ConnectionState::Connecting(_) | ConnectionState::Disconnecting(_))
    }

    pub fn is_adapter_enabled(&self) -> bool {
        self.adapter_enabled
    }

    pub fn can_discover(&self) -> bool {
        !self.scanning && !self.is_loading()
    }

    pub fn can_connect(&self) -> bool {
        self.can_discover() && self.connection == ConnectionState::Disconnected
    }

    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn alerts(&self) -> impl Iterator<Item = &str> {
        self.alerts.iter().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    pub fn report(&mut self, err: &ScreenError) {
        match err.user_message() {
            Some(message) => {
                error!("{}", err);
                self.alerts.push_back(message);
            },
            None => debug!("{}", err),
        }
    }

    pub fn set_adapter_enabled(&mut self, enabled: bool) {
        if self.adapter_enabled != enabled {
            info!("Bluetooth adapter is now {}", if enabled { "enabled" } else { "disabled" });
        }
        self.adapter_enabled = enabled;
    }

    pub fn begin_scan(&mut self) -> Result<(), ScreenError> {
        if !self.can_discover() {
            return Err(ScreenError::Busy);
        }

        self.scanning = true;
        self.devices.clear();
        Ok(())
    }

    pub fn finish_scan(&mut self, result: Result<Vec<Device>, ScreenError>) {
        self.scanning = false;

        match result {
            Ok(devices) => {
                info!("Discovered {} device(s)", devices.len());
                self.devices = devices;
            },
            Err(err) => {
                if let ScreenError::AdapterDisabled = err {
                    self.set_adapter_enabled(false);
                }
                self.report(&err);
            },
        }
    }

    pub fn begin_connect(&mut self, device: Device) -> Result<(), ScreenError> {
        if !self.can_connect() {
            return Err(ScreenError::Busy);
        }

        self.connection = ConnectionState::Connecting(device);
        Ok(())
    }

    pub fn finish_connect(&mut self, result: Result<(), ScreenError>) {
        let device = match std::mem::replace(&mut self.connection, ConnectionState::Disconnected) {
            ConnectionState::Connecting(device) => device,
            ConnectionState::Disconnected => {
                debug!("Connect finished after the link was lost: {:?}", result);
                return;
            },
            other => {
                warn!("Connect finished while in state {:?}", other);
                self.connection = other;
                return;
            },
        };

        match result {
            Ok(()) => {
                info!("Connected to {}", device);
                self.connection = ConnectionState::Connected(device);
            },
            Err(err) => self.report(&err),
        }
    }

    /// Returns the device to disconnect from, or `None` if there is nothing to do.
    pub fn begin_disconnect(&mut self) -> Option<Device> {
        let device = match &self.connection {
            ConnectionState::Connected(device) => device.clone(),
            other => {
                debug!("Ignoring disconnect while in state {:?}", other);
                return None;
            },
        };

        self.connection = ConnectionState::Disconnecting(device.clone());
        Some(device)
    }

    pub fn finish_disconnect(&mut self, result: Result<(), ScreenError>) {
        let device = match std::mem::replace(&mut self.connection, ConnectionState::Disconnected) {
            ConnectionState::Disconnecting(device) => device,
            other => {
                debug!("Disconnect finished while in state {:?}", other);
                self.connection = other;
                return;
            },
        };

        match result {
            Ok(()) => info!("Disconnected from {}", device),
            Err(err) => {
                self.connection = ConnectionState::Connected(device);
                self.report(&err);
            },
        }
    }

    /// The link to `address` went down without us asking for it.
    pub fn device_lost(&mut self, address: &str) {
        match &self.connection {
            ConnectionState::Connected(device) if device.address == address => {
                let err = ScreenError::ConnectionLost { address: address.to_string() };
                self.connection = ConnectionState::Disconnected;
                self.report(&err);
            },
            ConnectionState::Connecting(device) if device.address == address => {
                // finish_connect will see that the attempt no longer matters
                let err = ScreenError::ConnectionLost { address: address.to_string() };
                self.connection = ConnectionState::Disconnected;
                self.report(&err);
            },
            ConnectionState::Disconnecting(device) if device.address == address => {
                // finish_disconnect will see that we are already disconnected
                self.connection = ConnectionState::Disconnected;
            },
            _ => debug!("Ignoring disconnection of {}", address),
        }
    }
}
