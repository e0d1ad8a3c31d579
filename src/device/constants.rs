/**
 * How long (milliseconds) one discovery scans for devices, unless configured otherwise.
 */
pub const DEFAULT_SCAN_DURATION: u64 = 5000;

/**
 * How long (milliseconds) to wait before watching for disconnections again after the event
 * stream failed or ended.
 */
pub const WATCH_RETRY_DELAY: u64 = 1000;

/**
 * Placeholder shown for devices that do not advertise a name.
 */
pub const UNNAMED_DEVICE: &str = "Unknown device";
