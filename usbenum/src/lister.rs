//! The device lister.
//!
//! Turns one registry query into an [`EnumerationResult`]: an ordered, possibly
//! empty list of descriptors, or a structured error. The lister keeps no state
//! between calls and never retries.

use {
    crate::{
        device::DeviceDescriptor,
        error::{Error, Result},
        registry::{DeviceHandle, DeviceRegistry},
    },
    log::{debug, trace, warn},
    std::{
        sync::{Arc, mpsc},
        thread,
        time::Duration,
    },
};

/// Outcome of one enumeration: `Ok` with the devices (possibly none) or the
/// failure.
pub type EnumerationResult = Result<Vec<DeviceDescriptor>>;

/// Lists the devices known to an injected [`DeviceRegistry`].
#[derive(Debug)]
pub struct DeviceLister<R> {
    registry: Arc<R>,
    timeout: Option<Duration>,
}

impl<R> Clone for DeviceLister<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            timeout: self.timeout,
        }
    }
}

impl<R: DeviceRegistry + 'static> DeviceLister<R> {
    /// Create a lister over `registry`, without a timeout.
    pub fn new(registry: R) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    /// Create a lister over a registry shared with other owners.
    pub fn from_shared(registry: Arc<R>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bound each query by `timeout`.
    ///
    /// The query then runs on a worker thread. If the registry has not
    /// answered when the bound expires, the call returns [`Error::Timeout`]
    /// and the late answer is discarded.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The registry this lister queries.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Query the registry once and normalize the answer.
    pub fn list_devices(&self) -> EnumerationResult {
        match self.timeout {
            None => query(self.registry.as_ref()),
            Some(timeout) => self.list_devices_bounded(timeout),
        }
    }

    fn list_devices_bounded(&self, timeout: Duration) -> EnumerationResult {
        let (tx, rx) = mpsc::channel();
        let registry = Arc::clone(&self.registry);

        thread::Builder::new()
            .name("usbenum-query".to_string())
            .spawn(move || {
                // The receiver is gone once the caller timed out
                let _ = tx.send(query(registry.as_ref()));
            })
            .map_err(|e| Error::platform_unavailable(format!("failed to spawn query: {e}")))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    "Device registry did not answer within {}ms",
                    timeout.as_millis()
                );
                Err(Error::Timeout(timeout))
            },
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::platform_unavailable(
                "device registry query aborted",
            )),
        }
    }
}

fn query<R: DeviceRegistry + ?Sized>(registry: &R) -> EnumerationResult {
    debug!("Querying device registry");

    let entries = registry.device_list().map_err(|e| {
        debug!("Failed to enumerate devices: {e}");
        Error::platform_unavailable(e.message())
    })?;

    let devices: Vec<DeviceDescriptor> = entries
        .into_iter()
        .map(|(id, handle)| {
            let name = handle.device_name();
            trace!("Found device {name} (registry id {id})");
            match handle.usb_info() {
                Some(usb) => DeviceDescriptor::with_usb(name, usb),
                None => DeviceDescriptor::new(name),
            }
        })
        .collect();

    debug!("Enumerated {} device(s)", devices.len());
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            device::{DeviceKind, UsbInfo},
            error::ErrorKind,
            registry::{RegistryError, RegistryResult, StaticDevice, StaticRegistry},
        },
        std::{
            sync::atomic::{AtomicUsize, Ordering},
            time::Instant,
        },
    };

    fn init_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .try_init();
    }

    fn names(devices: &[DeviceDescriptor]) -> Vec<&str> {
        devices
            .iter()
            .map(DeviceDescriptor::name)
            .collect()
    }

    #[test]
    fn test_empty_registry_is_empty_success() {
        let lister = DeviceLister::new(StaticRegistry::empty());
        assert_eq!(lister.list_devices(), Ok(Vec::new()));
    }

    #[test]
    fn test_single_device() {
        let lister = DeviceLister::new(StaticRegistry::new([StaticDevice::new(
            "/dev/bus/usb/001/002",
        )]));
        assert_eq!(
            lister.list_devices(),
            Ok(vec![DeviceDescriptor::new("/dev/bus/usb/001/002")])
        );
    }

    #[test]
    fn test_registry_failure_is_platform_unavailable() {
        let lister = DeviceLister::new(StaticRegistry::failing("permission denied"));
        let err = lister.list_devices().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformUnavailable);
        assert_eq!(err.message(), "permission denied");
        assert_eq!(err.code(), "USB_ERROR");
    }

    #[test]
    fn test_registry_failure_without_message_still_has_message() {
        let lister = DeviceLister::new(StaticRegistry::failing(""));
        let err = lister.list_devices().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformUnavailable);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_preserves_registry_order() {
        init_logger();
        let input = [
            "/dev/bus/usb/003/007",
            "/dev/bus/usb/001/002",
            "/dev/bus/usb/002/004",
        ];
        let lister = DeviceLister::new(StaticRegistry::new(input.map(StaticDevice::new)));

        let devices = lister.list_devices().unwrap();
        assert_eq!(devices.len(), input.len());
        assert_eq!(names(&devices), input);
    }

    #[test]
    fn test_usb_metadata_is_carried() {
        let lister = DeviceLister::new(StaticRegistry::new([
            StaticDevice::new("/dev/ttyUSB0").with_usb(UsbInfo::new(0x1A86, 0x7523))
        ]));

        let devices = lister.list_devices().unwrap();
        assert_eq!(devices[0].kind(), DeviceKind::Ch340);
        assert_eq!(devices[0].usb().map(|u| u.vid), Some(0x1A86));
    }

    #[test]
    fn test_idempotent_without_state_change() {
        let lister = DeviceLister::new(StaticRegistry::new([
            StaticDevice::new("COM3"),
            StaticDevice::new("COM4"),
        ]));
        assert_eq!(lister.list_devices(), lister.list_devices());

        let failing = DeviceLister::new(StaticRegistry::failing("permission denied"));
        assert_eq!(failing.list_devices(), failing.list_devices());
    }

    /// Handle whose name differs from the registry key.
    struct KeyedHandle(&'static str);

    impl DeviceHandle for KeyedHandle {
        fn device_name(&self) -> &str {
            self.0
        }
    }

    struct KeyedRegistry;

    impl DeviceRegistry for KeyedRegistry {
        type Device = KeyedHandle;

        fn device_list(&self) -> RegistryResult<Vec<(String, KeyedHandle)>> {
            Ok(vec![("1002".to_string(), KeyedHandle("/dev/bus/usb/001/002"))])
        }
    }

    #[test]
    fn test_name_comes_from_handle() {
        let devices = DeviceLister::new(KeyedRegistry).list_devices().unwrap();
        assert_eq!(names(&devices), ["/dev/bus/usb/001/002"]);
    }

    struct SlowRegistry {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl DeviceRegistry for SlowRegistry {
        type Device = StaticDevice;

        fn device_list(&self) -> RegistryResult<Vec<(String, StaticDevice)>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(vec![("COM1".to_string(), StaticDevice::new("COM1"))])
        }
    }

    #[test]
    fn test_timeout_on_slow_registry() {
        let lister = DeviceLister::new(SlowRegistry {
            delay: Duration::from_secs(2),
            calls: AtomicUsize::new(0),
        })
        .with_timeout(Duration::from_millis(50));

        let start = Instant::now();
        let err = lister.list_devices().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.code(), "USB_TIMEOUT");
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_timeout_not_hit_by_fast_registry() {
        let lister = DeviceLister::new(SlowRegistry {
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
        .with_timeout(Duration::from_secs(5));

        let devices = lister.list_devices().unwrap();
        assert_eq!(names(&devices), ["COM1"]);
        assert_eq!(lister.registry().calls.load(Ordering::SeqCst), 1);
    }

    struct PanickingRegistry;

    impl DeviceRegistry for PanickingRegistry {
        type Device = StaticDevice;

        fn device_list(&self) -> RegistryResult<Vec<(String, StaticDevice)>> {
            panic!("registry service crashed");
        }
    }

    #[test]
    fn test_worker_panic_is_platform_unavailable() {
        let lister = DeviceLister::new(PanickingRegistry).with_timeout(Duration::from_secs(5));
        let err = lister.list_devices().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformUnavailable);
        assert!(!err.message().is_empty());
    }

    struct CountingRegistry(AtomicUsize);

    impl DeviceRegistry for CountingRegistry {
        type Device = StaticDevice;

        fn device_list(&self) -> RegistryResult<Vec<(String, StaticDevice)>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(RegistryError::new("service not bound"))
        }
    }

    #[test]
    fn test_failure_is_not_retried() {
        let lister = DeviceLister::new(CountingRegistry(AtomicUsize::new(0)));
        assert!(lister.list_devices().is_err());
        assert_eq!(lister.registry().0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_callers() {
        let lister = DeviceLister::new(StaticRegistry::new([
            StaticDevice::new("/dev/ttyACM0"),
            StaticDevice::new("/dev/ttyACM1"),
        ]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lister = lister.clone();
                thread::spawn(move || lister.list_devices())
            })
            .collect();

        for handle in handles {
            let devices = handle.join().unwrap().unwrap();
            assert_eq!(names(&devices), ["/dev/ttyACM0", "/dev/ttyACM1"]);
        }
    }
}
