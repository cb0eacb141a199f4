//! The provider root of the virtual camera triad.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::device::VirtualDevice;
use crate::properties::{Capability, CapabilityValue, MANUFACTURER};
use crate::stream::VirtualStream;
use crate::{DeviceError, DeviceResult};

/// The provider object the OS instantiates once per extension process.
///
/// Owns exactly one [`VirtualDevice`], attached after construction by
/// [`build_camera_stack`].
pub struct CameraProvider {
    manufacturer: &'static str,
    device: RwLock<Option<Arc<VirtualDevice>>>,
}

impl CameraProvider {
    /// Create a provider with no device attached yet.
    pub fn new() -> Self {
        Self {
            manufacturer: MANUFACTURER,
            device: RwLock::new(None),
        }
    }

    /// Manufacturer string advertised to the OS.
    pub fn manufacturer(&self) -> &'static str {
        self.manufacturer
    }

    /// Attach the provider's device. A provider owns exactly one device.
    pub fn add_device(&self, device: Arc<VirtualDevice>) -> DeviceResult<()> {
        let mut slot = self.device.write();
        if slot.is_some() {
            return Err(DeviceError::DeviceAlreadyAttached);
        }
        *slot = Some(device);
        Ok(())
    }

    /// The attached device, if wiring has happened.
    pub fn device(&self) -> Option<Arc<VirtualDevice>> {
        self.device.read().clone()
    }

    /// The capability set this provider can be asked about.
    pub fn capabilities(&self) -> &'static [Capability] {
        &[Capability::ProviderManufacturer]
    }

    /// Query a capability. Pure: answers never change at runtime.
    pub fn describe(&self, capability: Capability) -> Option<CapabilityValue> {
        match capability {
            Capability::ProviderManufacturer => Some(CapabilityValue::Text(self.manufacturer)),
            _ => None,
        }
    }

    /// Accept a property-set request. Deliberately a no-op: the
    /// provider's declared identity is immutable after construction.
    pub fn set_property(&self, _capability: Capability, _value: CapabilityValue) -> DeviceResult<()> {
        warn!("ignoring property-set request; provider properties are immutable");
        Ok(())
    }
}

impl Default for CameraProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// The fully wired provider/device/stream triad.
pub struct CameraStack {
    /// Provider root.
    pub provider: Arc<CameraProvider>,

    /// The provider's single device.
    pub device: Arc<VirtualDevice>,

    /// The device's single stream.
    pub stream: Arc<VirtualStream>,
}

/// Build the provider/device/stream triad.
///
/// Construction is two-phase: all three objects are created standalone
/// first, then the ownership edges are wired in one place. A partially
/// wired triad is never observable outside this function.
pub fn build_camera_stack() -> CameraStack {
    let provider = Arc::new(CameraProvider::new());
    let device = Arc::new(VirtualDevice::new());
    let stream = Arc::new(VirtualStream::new());

    // new() guarantees both attachment slots are empty
    let _ = device.add_stream(Arc::clone(&stream));
    let _ = provider.add_device(Arc::clone(&device));

    info!(
        device = %device.id(),
        stream = %stream.id(),
        format = %stream.format(),
        "camera stack assembled"
    );

    CameraStack {
        provider,
        device,
        stream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_advertises_manufacturer() {
        let provider = CameraProvider::new();

        assert_eq!(
            provider.describe(Capability::ProviderManufacturer),
            Some(CapabilityValue::Text("Mirrorcam"))
        );
        assert!(provider.describe(Capability::StreamFormat).is_none());
    }

    #[test]
    fn only_one_device_may_attach() {
        let provider = CameraProvider::new();
        provider.add_device(Arc::new(VirtualDevice::new())).unwrap();

        assert!(matches!(
            provider.add_device(Arc::new(VirtualDevice::new())),
            Err(DeviceError::DeviceAlreadyAttached)
        ));
    }

    #[test]
    fn stack_is_fully_wired() {
        let stack = build_camera_stack();

        let device = stack.provider.device().unwrap();
        assert_eq!(device.id(), stack.device.id());

        let stream = device.stream().unwrap();
        assert_eq!(stream.id(), stack.stream.id());
    }

    #[test]
    fn identities_are_unique_per_stack() {
        let first = build_camera_stack();
        let second = build_camera_stack();

        assert_ne!(first.device.id(), second.device.id());
        assert_ne!(first.stream.id(), second.stream.id());
    }
}
