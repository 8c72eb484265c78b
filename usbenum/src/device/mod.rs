//! Device descriptors and classification utilities.
//!
//! A [`DeviceDescriptor`] is the normalized record the lister produces for
//! each attached device. Descriptors are immutable once built; the optional
//! USB metadata is whatever the registry could report.

/// Known USB bridge kinds commonly found behind USB serial devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeviceKind {
    /// CH340/CH341 USB-to-Serial converter.
    Ch340,
    /// Silicon Labs CP210x USB-to-Serial converter.
    Cp210x,
    /// FTDI FT232/FT2232/FT4232 USB-to-Serial converter.
    Ftdi,
    /// Prolific PL2303 USB-to-Serial converter.
    Prolific,
    /// Unknown device.
    Unknown,
}

/// Known USB VID/PID pairs for common USB-to-UART bridges.
const KNOWN_USB_DEVICES: &[(u16, &[u16], DeviceKind)] = &[
    (
        0x1A86,
        &[0x7523, 0x7522, 0x5523, 0x5512, 0x55D4],
        DeviceKind::Ch340,
    ),
    (0x10C4, &[0xEA60, 0xEA70, 0xEA71, 0xEA63], DeviceKind::Cp210x),
    (
        0x0403,
        &[0x6001, 0x6010, 0x6011, 0x6014, 0x6015],
        DeviceKind::Ftdi,
    ),
    (0x067B, &[0x2303, 0x23A3, 0x23C3, 0x23D3], DeviceKind::Prolific),
];

impl DeviceKind {
    /// Classify a VID/PID pair.
    #[must_use]
    pub fn from_vid_pid(vid: u16, pid: u16) -> Self {
        for (known_vid, pids, kind) in KNOWN_USB_DEVICES {
            if vid == *known_vid && (pids.is_empty() || pids.contains(&pid)) {
                return *kind;
            }
        }
        Self::Unknown
    }

    /// Get a human-readable name for the device kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ch340 => "CH340/CH341",
            Self::Cp210x => "CP210x",
            Self::Ftdi => "FTDI",
            Self::Prolific => "PL2303",
            Self::Unknown => "Unknown",
        }
    }

    /// Check if this is a known bridge kind.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// USB metadata reported by the registry for a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsbInfo {
    /// USB Vendor ID.
    pub vid: u16,
    /// USB Product ID.
    pub pid: u16,
    /// Manufacturer string (if available).
    pub manufacturer: Option<String>,
    /// Product string (if available).
    pub product: Option<String>,
    /// Serial number (if available).
    pub serial_number: Option<String>,
}

impl UsbInfo {
    /// Create metadata with only VID/PID set.
    pub fn new(vid: u16, pid: u16) -> Self {
        Self {
            vid,
            pid,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }
}

/// Normalized record identifying one attached device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceDescriptor {
    name: String,
    kind: DeviceKind,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    usb: Option<UsbInfo>,
}

impl DeviceDescriptor {
    /// Create a descriptor that carries only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeviceKind::Unknown,
            usb: None,
        }
    }

    /// Create a descriptor with USB metadata; the kind is derived from VID/PID.
    pub fn with_usb(name: impl Into<String>, usb: UsbInfo) -> Self {
        Self {
            name: name.into(),
            kind: DeviceKind::from_vid_pid(usb.vid, usb.pid),
            usb: Some(usb),
        }
    }

    /// Platform-assigned identifier (e.g. "/dev/bus/usb/001/002", "COM3").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classified bridge kind.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// USB metadata, if the registry reported any.
    pub fn usb(&self) -> Option<&UsbInfo> {
        self.usb.as_ref()
    }
}

/// Wording used by presentation layers when no devices are attached.
pub const NO_DEVICES_MESSAGE: &str = "No USB devices found.";

/// Join device names with newlines, or return [`NO_DEVICES_MESSAGE`].
pub fn format_device_names(devices: &[DeviceDescriptor]) -> String {
    if devices.is_empty() {
        return NO_DEVICES_MESSAGE.to_string();
    }

    devices
        .iter()
        .map(DeviceDescriptor::name)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a list of devices with their metadata, one line per device.
pub fn format_device_list(devices: &[DeviceDescriptor]) -> Vec<String> {
    let mut result = Vec::new();

    for device in devices {
        let kind_info = if device.kind.is_known() {
            format!(" [{}]", device.kind.name())
        } else {
            String::new()
        };

        let vid_pid = device
            .usb
            .as_ref()
            .map(|usb| format!(" ({:04X}:{:04X})", usb.vid, usb.pid))
            .unwrap_or_default();

        let product_info = device
            .usb
            .as_ref()
            .and_then(|usb| usb.product.as_ref())
            .map(|p| format!(" - {p}"))
            .unwrap_or_default();

        result.push(format!(
            "{}{}{}{}",
            device.name, kind_info, vid_pid, product_info
        ));
    }

    result
}
