pub mod adb;
pub mod devices;

#[cfg(test)]
pub(crate) mod fake;

pub use adb::{AdbBackend, AdbClient, BackgroundProcess};
pub use devices::{list_devices, parse_devices, Device};
