use std::env;
use log::info;
use msgbox::IconType;
use ecleaning_connect::{init_logging, run};
use ecleaning_connect::error::{error_msgbox, AppRunError, ConfigError};

// This embedded Info.plist carries the bluetooth usage descriptions, macOS refuses bluetooth
// access to binaries without them.
// Example: `open ./target/debug/ecleaning-connect`
#[cfg(target_os = "macos")]
embed_plist::embed_info_plist!(concat!(env!("OUT_DIR"), "/Info.plist"));

fn main() -> Result<(), AppRunError> {
    init_logging();
    info!(concat!("E-Cleaning Connect ", env!("CARGO_PKG_VERSION")));

    let args = env::args();

    match run(args) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            if let Err(err) = msgbox::create(
                concat!("E-Cleaning Connect ", env!("CARGO_PKG_VERSION")),
                "This application has already been started",
                IconType::Error,
            ) {
                eprintln!("Failed to create msgbox: {:?}", err);
            }
            Ok(())
        },
        Err(err) => {
            error_msgbox("Unexpected error", &err);
            Err(err)
        }
        Ok(_) => Ok(())
    }
}
