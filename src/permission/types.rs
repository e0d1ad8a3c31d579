use std::collections::HashMap;
use std::fmt;
use async_trait::async_trait;

use crate::error::PermissionError;

/**
 * From this Android API level (Android 12) on, scanning and connecting require their own runtime
 * permissions on top of the location permission.
 */
pub const ANDROID_MODERN_BLUETOOTH_API_LEVEL: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AccessCoarseLocation,
    BluetoothScan,
    BluetoothConnect,
    Bluetooth,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::AccessCoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
            Capability::BluetoothScan => "android.permission.BLUETOOTH_SCAN",
            Capability::BluetoothConnect => "android.permission.BLUETOOTH_CONNECT",
            Capability::Bluetooth => "ios.permission.BLUETOOTH",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    // denied, and the platform will not ask the user again
    Blocked,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android { api_level: u32 },
    Ios,
    Desktop,
}

impl Platform {
    #[cfg(target_os = "android")]
    pub fn current(android_api_level: Option<u32>) -> Platform {
        Platform::Android { api_level: android_api_level.unwrap_or(ANDROID_MODERN_BLUETOOTH_API_LEVEL) }
    }

    #[cfg(target_os = "ios")]
    pub fn current(android_api_level: Option<u32>) -> Platform {
        match android_api_level {
            Some(api_level) => Platform::Android { api_level },
            None => Platform::Ios,
        }
    }

    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    pub fn current(android_api_level: Option<u32>) -> Platform {
        match android_api_level {
            Some(api_level) => Platform::Android { api_level },
            None => Platform::Desktop,
        }
    }

    /// The capability set that must be granted before bluetooth discovery may start.
    pub fn required_capabilities(&self) -> Vec<Capability> {
        match self {
            Platform::Android { api_level } if *api_level >= ANDROID_MODERN_BLUETOOTH_API_LEVEL => vec![
                Capability::AccessCoarseLocation,
                Capability::BluetoothScan,
                Capability::BluetoothConnect,
            ],
            Platform::Android { .. } => vec![Capability::AccessCoarseLocation],
            Platform::Ios | Platform::Desktop => vec![Capability::Bluetooth],
        }
    }
}

/// Asks the platform for runtime permissions.
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn request(&self, capabilities: &[Capability]) -> Result<HashMap<Capability, PermissionStatus>, PermissionError>;
}

/// True only if every requested capability was answered with `Granted`.
pub fn all_granted(
    requested: &[Capability],
    answers: &HashMap<Capability, PermissionStatus>,
) -> Result<bool, PermissionError> {
    for capability in requested {
        match answers.get(capability) {
            None => return Err(PermissionError::Unanswered { capability: *capability }),
            Some(PermissionStatus::Granted) => {},
            Some(_) => return Ok(false),
        }
    }

    Ok(true)
}
