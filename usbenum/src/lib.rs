//! # usbenum
//!
//! A library for enumerating attached USB serial devices.
//!
//! This crate lists the devices known to a platform device registry and
//! reports them as an ordered list of [`DeviceDescriptor`]s, or as a
//! structured [`Error`] when the registry cannot be queried. It does not
//! open, read from or write to any device.
//!
//! ## Supported Platforms
//!
//! - **Native** (default): Linux, macOS, Windows via the `serialport` crate
//! - Any other registry: implement [`DeviceRegistry`] and hand it to
//!   [`DeviceLister::new`]
//!
//! ## Features
//!
//! - `native` (default): Native serial port registry
//! - `serde`: Serialization support for data types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use usbenum::{DeviceLister, SerialPortRegistry, format_device_names};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lister = DeviceLister::new(SerialPortRegistry::new())
//!         .with_timeout(Duration::from_secs(1));
//!
//!     let devices = lister.list_devices()?;
//!     println!("{}", format_device_names(&devices));
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod error;
pub mod lister;
pub mod registry;

// Re-exports for convenience
#[cfg(feature = "native")]
pub use registry::{SerialPortDevice, SerialPortRegistry};
pub use {
    device::{
        DeviceDescriptor, DeviceKind, NO_DEVICES_MESSAGE, UsbInfo, format_device_list,
        format_device_names,
    },
    error::{Error, ErrorKind, Result},
    lister::{DeviceLister, EnumerationResult},
    registry::{
        DeviceHandle, DeviceRegistry, RegistryError, RegistryResult, StaticDevice,
        StaticRegistry,
    },
};

/// List USB serial devices through the operating system's serial port list.
#[cfg(feature = "native")]
pub fn list_devices() -> EnumerationResult {
    DeviceLister::new(SerialPortRegistry::new()).list_devices()
}
