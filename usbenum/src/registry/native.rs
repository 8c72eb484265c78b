//! Native device registry using the `serialport` crate.
//!
//! Works on every platform `serialport` supports (Linux, macOS, Windows,
//! FreeBSD). USB metadata comes from the OS; on Linux that means udev.

use {
    crate::{
        device::UsbInfo,
        registry::{DeviceHandle, DeviceRegistry, RegistryError, RegistryResult},
    },
    log::trace,
    serialport::SerialPortType,
};

impl From<serialport::Error> for RegistryError {
    fn from(err: serialport::Error) -> Self {
        Self::new(err.description)
    }
}

/// Serial port reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortDevice {
    name: String,
    usb: Option<UsbInfo>,
}

impl DeviceHandle for SerialPortDevice {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn usb_info(&self) -> Option<UsbInfo> {
        self.usb.clone()
    }
}

/// Registry backed by the operating system's serial port list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortRegistry {
    include_non_usb: bool,
}

impl SerialPortRegistry {
    /// Registry listing USB serial ports only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also list built-in, PCI and Bluetooth serial ports.
    #[must_use]
    pub fn include_non_usb(mut self, include: bool) -> Self {
        self.include_non_usb = include;
        self
    }
}

impl DeviceRegistry for SerialPortRegistry {
    type Device = SerialPortDevice;

    fn device_list(&self) -> RegistryResult<Vec<(String, SerialPortDevice)>> {
        let ports = serialport::available_ports()?;
        let mut result = Vec::with_capacity(ports.len());

        for port in ports {
            let usb = match port.port_type {
                SerialPortType::UsbPort(info) => {
                    trace!(
                        "Found USB port: {} (VID: {:04X}, PID: {:04X})",
                        port.port_name, info.vid, info.pid
                    );
                    Some(UsbInfo {
                        vid: info.vid,
                        pid: info.pid,
                        manufacturer: info.manufacturer,
                        product: info.product,
                        serial_number: info.serial_number,
                    })
                },
                other => {
                    trace!("Found non-USB port: {} ({other:?})", port.port_name);
                    None
                },
            };

            if usb.is_none() && !self.include_non_usb {
                continue;
            }

            result.push((
                port.port_name.clone(),
                SerialPortDevice {
                    name: port.port_name,
                    usb,
                },
            ));
        }

        Ok(result)
    }
}
