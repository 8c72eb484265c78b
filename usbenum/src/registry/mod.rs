//! Device registry abstraction.
//!
//! The lister never reaches for a platform service on its own: it is handed a
//! [`DeviceRegistry`] and asks it for the attached devices. This module
//! defines that seam and ships two implementations:
//!
//! - [`SerialPortRegistry`]: native platforms via the `serialport` crate
//!   (feature `native`, enabled by default)
//! - [`StaticRegistry`]: a fixed snapshot, for embedding and tests
//!
//! ```text
//! +------------------+
//! |   DeviceLister   |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! | DeviceRegistry   |
//! +--------+---------+
//!          |
//!    +-----+------------------+
//!    v                        v
//! SerialPortRegistry     StaticRegistry
//!   (serialport)          (in memory)
//! ```

#[cfg(feature = "native")]
pub mod native;

use thiserror::Error;

use crate::device::UsbInfo;

/// Result type for registry queries.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Failure reported by a device registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RegistryError {
    message: String,
}

impl RegistryError {
    /// Create an error carrying the platform's message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The platform's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Handle to one device as returned by a registry.
pub trait DeviceHandle {
    /// Platform-assigned device name.
    fn device_name(&self) -> &str;

    /// USB metadata, when the registry knows it.
    fn usb_info(&self) -> Option<UsbInfo> {
        None
    }
}

/// Platform subsystem tracking currently attached devices.
///
/// Implementations must be safe to query from several threads at once; a
/// query is read-only with respect to device state.
pub trait DeviceRegistry: Send + Sync {
    /// Handle type returned for each device.
    type Device: DeviceHandle;

    /// List attached devices as `(identifier, handle)` pairs, in the
    /// registry's own enumeration order.
    fn device_list(&self) -> RegistryResult<Vec<(String, Self::Device)>>;
}

/// Device entry held by a [`StaticRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDevice {
    name: String,
    usb: Option<UsbInfo>,
}

impl StaticDevice {
    /// Create an entry with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usb: None,
        }
    }

    /// Attach USB metadata.
    #[must_use]
    pub fn with_usb(mut self, usb: UsbInfo) -> Self {
        self.usb = Some(usb);
        self
    }
}

impl DeviceHandle for StaticDevice {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn usb_info(&self) -> Option<UsbInfo> {
        self.usb.clone()
    }
}

/// Registry answering every query with the same snapshot.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    snapshot: RegistryResult<Vec<StaticDevice>>,
}

impl StaticRegistry {
    /// Registry reporting the given devices, keyed by their names.
    pub fn new(devices: impl IntoIterator<Item = StaticDevice>) -> Self {
        Self {
            snapshot: Ok(devices.into_iter().collect()),
        }
    }

    /// Registry with nothing attached.
    pub fn empty() -> Self {
        Self::new([])
    }

    /// Registry whose every query fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            snapshot: Err(RegistryError::new(message)),
        }
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl DeviceRegistry for StaticRegistry {
    type Device = StaticDevice;

    fn device_list(&self) -> RegistryResult<Vec<(String, StaticDevice)>> {
        let devices = self.snapshot.clone()?;
        Ok(devices
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect())
    }
}

#[cfg(feature = "native")]
pub use native::{SerialPortDevice, SerialPortRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_registry_keys_by_name() {
        let registry = StaticRegistry::new([
            StaticDevice::new("/dev/ttyUSB0"),
            StaticDevice::new("/dev/ttyUSB1").with_usb(UsbInfo::new(0x0403, 0x6001)),
        ]);

        let list = registry.device_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].0, "/dev/ttyUSB0");
        assert_eq!(list[0].1.device_name(), "/dev/ttyUSB0");
        assert!(list[0].1.usb_info().is_none());
        assert_eq!(list[1].1.usb_info().map(|u| u.vid), Some(0x0403));
    }

    #[test]
    fn test_static_registry_failing() {
        let err = StaticRegistry::failing("permission denied")
            .device_list()
            .unwrap_err();
        assert_eq!(err.message(), "permission denied");
        assert_eq!(err.to_string(), "permission denied");
    }

    #[test]
    fn test_static_registry_default_is_empty() {
        assert!(StaticRegistry::default().device_list().unwrap().is_empty());
    }

    #[test]
    fn test_registry_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = RegistryError::from(io);
        assert_eq!(err.message(), "permission denied");
    }
}
