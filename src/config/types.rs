use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::device::constants::DEFAULT_SCAN_DURATION;
use crate::permission::types::Platform;

fn default_scan_duration_ms() -> u64 {
    DEFAULT_SCAN_DURATION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_scan_duration_ms")]
    pub scan_duration_ms: u64,

    /// Use the Android permission model of this API level instead of the one of the platform we
    /// were compiled for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_api_level: Option<u32>,
}

impl Config {
    pub fn scan_duration(&self) -> Duration {
        // a scan of 0ms never finds anything
        Duration::from_millis(self.scan_duration_ms.max(100))
    }

    /// Durations that do not fit in `scanDurationMs` are clamped.
    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn platform(&self) -> Platform {
        Platform::current(self.android_api_level)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scan_duration_ms: DEFAULT_SCAN_DURATION,
            android_api_level: None,
        }
    }
}
