use std::io;
use std::sync::Arc;
use thiserror::Error;
use msgbox::IconType;
use std::fmt::Display;
use std::str::Utf8Error;
use btleplug;
use iced;
use serde_json;

use crate::permission::types::Capability;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },
}

#[derive(Error, Debug)]
pub enum BluetoothError {
    #[error("Error communicating with bluetooth adapter (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,
}

impl BluetoothError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, BluetoothError::Btle { source: btleplug::Error::PermissionDenied })
    }
}

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("Failed to request permissions: {source}")]
    Bluetooth { #[from] source: BluetoothError },

    #[error("Permission service gave no answer for {capability}")]
    Unanswered { capability: Capability },
}

/// Everything that can go wrong on the connection screen. The `Display` output is the diagnostic
/// detail that ends up in the log, `user_message` is what the user gets to see.
#[derive(Error, Debug, Clone)]
pub enum ScreenError {
    #[error("Bluetooth permissions were not granted")]
    PermissionDenied,

    #[error("Bluetooth adapter is disabled")]
    AdapterDisabled,

    #[error("Device discovery failed: {source}")]
    DiscoveryFailed { source: Arc<BluetoothError> },

    #[error("Connecting to {address} failed: {}", describe(.source))]
    ConnectFailed { address: String, source: Option<Arc<BluetoothError>> },

    #[error("Disconnecting from {address} failed: {}", describe(.source))]
    DisconnectFailed { address: String, source: Option<Arc<BluetoothError>> },

    #[error("Connection to {address} was lost")]
    ConnectionLost { address: String },

    /// A refused trigger. Only logged, never shown to the user.
    #[error("Another bluetooth operation is still in progress")]
    Busy,
}

fn describe(source: &Option<Arc<BluetoothError>>) -> String {
    match source {
        Some(err) => err.to_string(),
        None => "device refused".to_string(),
    }
}

impl ScreenError {
    /// `None` for errors that are not worth interrupting the user for.
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            ScreenError::PermissionDenied =>
                "Bluetooth permissions are required to search for the E-Cleaning device. \
                Please grant them in the system settings and try again.".to_string(),
            ScreenError::AdapterDisabled =>
                "Bluetooth is turned off. Please enable Bluetooth and try again.".to_string(),
            ScreenError::DiscoveryFailed { source } =>
                format!("Searching for devices failed: {}", source),
            ScreenError::ConnectFailed { .. } =>
                "Could not connect to the device. Make sure it is switched on and nearby.".to_string(),
            ScreenError::DisconnectFailed { .. } =>
                "Could not disconnect from the device.".to_string(),
            ScreenError::ConnectionLost { .. } =>
                "The connection to the device was lost.".to_string(),
            ScreenError::Busy => return None,
        };
        Some(message)
    }
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read/write manifest: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build manifest: {source}")]
    JsonError { #[from] source: serde_json::Error },

    #[error("The manifest has no dictionary at the given path")]
    NotADictionary,
}

pub fn error_msgbox<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("E-Cleaning Connect ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}
