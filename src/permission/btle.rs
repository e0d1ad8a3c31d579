use std::collections::HashMap;
use async_trait::async_trait;
use btleplug::api::Manager as _;
use btleplug::platform::Manager;
use log::{info, warn};

use crate::error::{BluetoothError, PermissionError};
use crate::permission::types::{Capability, PermissionService, PermissionStatus};

/// Desktop operating systems do not have a runtime prompt we can trigger ourselves; the OS asks
/// the user the first time the radio is accessed. So "requesting" a permission means touching the
/// adapter and looking at whether btleplug reports `PermissionDenied`.
pub struct BtlePermissions;

async fn count_adapters() -> Result<usize, BluetoothError> {
    let manager = Manager::new().await?;
    Ok(manager.adapters().await?.len())
}

async fn probe_adapter_access() -> Result<PermissionStatus, BluetoothError> {
    match count_adapters().await {
        Ok(count) => {
            info!("Bluetooth access granted ({} adapter(s))", count);
            Ok(PermissionStatus::Granted)
        },
        Err(err) if err.is_permission_denied() => {
            warn!("Not allowed to access bluetooth");
            Ok(PermissionStatus::Denied)
        },
        Err(err) => Err(err),
    }
}

#[async_trait]
impl PermissionService for BtlePermissions {
    async fn request(&self, capabilities: &[Capability]) -> Result<HashMap<Capability, PermissionStatus>, PermissionError> {
        let status = probe_adapter_access().await?;

        Ok(capabilities.iter().map(|capability| (*capability, status)).collect())
    }
}
