//! `list` command: enumerate attached devices and print them.

use {
    crate::config::Config,
    anyhow::{Context, Result},
    console::style,
    log::debug,
    std::{
        io::{self, Write},
        time::Duration,
    },
    usbenum::{
        DeviceDescriptor, DeviceLister, DeviceRegistry, EnumerationResult, NO_DEVICES_MESSAGE,
        SerialPortRegistry, format_device_list, format_device_names,
    },
};

/// Timeout applied when neither the command line nor a config file sets one.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Effective settings for one `list` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListOptions {
    /// Emit JSON.
    pub json: bool,
    /// Show USB metadata.
    pub long: bool,
    /// Include non-USB serial ports.
    pub include_non_usb: bool,
    /// Bound on the registry query; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ListOptions {
    /// Combine command-line flags with configuration; flags win.
    pub(crate) fn resolve(
        json: bool,
        long: bool,
        all_ports: bool,
        timeout_ms: Option<u64>,
        config: &Config,
    ) -> Self {
        let timeout_ms = timeout_ms
            .or(config.enumeration.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            json: json || config.output.json,
            long: long || config.output.long,
            include_non_usb: all_ports || config.enumeration.include_non_usb,
            timeout: (timeout_ms > 0).then_some(Duration::from_millis(timeout_ms)),
        }
    }
}

/// List command implementation.
pub(crate) fn cmd_list(options: &ListOptions) -> Result<()> {
    let registry = SerialPortRegistry::new().include_non_usb(options.include_non_usb);
    let devices = enumerate(registry, options)?;

    let stdout = io::stdout();
    render(&devices, options, &mut stdout.lock())?;

    if devices.is_empty() && !options.json {
        eprintln!("{}", style(NO_DEVICES_MESSAGE).dim());
    }

    Ok(())
}

/// Run one enumeration against `registry` with the configured bound.
pub(crate) fn enumerate<R: DeviceRegistry + 'static>(
    registry: R,
    options: &ListOptions,
) -> EnumerationResult {
    let mut lister = DeviceLister::new(registry);
    if let Some(timeout) = options.timeout {
        debug!("Registry query bounded to {}ms", timeout.as_millis());
        lister = lister.with_timeout(timeout);
    }
    lister.list_devices()
}

/// Write the device list to `out`.
///
/// Human output writes nothing for an empty list; the caller decides how to
/// tell the user. JSON output always writes an array.
pub(crate) fn render(
    devices: &[DeviceDescriptor],
    options: &ListOptions,
    out: &mut impl Write,
) -> Result<()> {
    if options.json {
        let text =
            serde_json::to_string_pretty(devices).context("Failed to serialize device list")?;
        writeln!(out, "{text}")?;
    } else if options.long {
        for line in format_device_list(devices) {
            writeln!(out, "{line}")?;
        }
    } else if !devices.is_empty() {
        writeln!(out, "{}", format_device_names(devices))?;
    }

    Ok(())
}

/// JSON object describing an enumeration failure.
pub(crate) fn error_json(err: &usbenum::Error) -> serde_json::Value {
    serde_json::json!({
        "code": err.code(),
        "kind": err.kind(),
        "message": err.message(),
    })
}
