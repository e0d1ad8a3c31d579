pub mod btle;
pub mod types;
