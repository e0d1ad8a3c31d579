pub mod btle;
pub mod constants;
pub mod types;
pub mod watch;
