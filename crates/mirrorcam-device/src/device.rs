//! The OS-facing virtual camera device.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::properties::{Capability, CapabilityValue, DEVICE_MODEL, DEVICE_NAME, TRANSPORT_TYPE};
use crate::stream::VirtualStream;
use crate::{DeviceError, DeviceResult};

/// The virtual camera device.
///
/// Owns exactly one [`VirtualStream`], attached after construction by
/// the two-phase setup in [`crate::build_camera_stack`]. Identity is
/// generated once and never changes for the provider process lifetime.
pub struct VirtualDevice {
    device_id: Uuid,
    localized_name: &'static str,
    stream: RwLock<Option<Arc<VirtualStream>>>,
}

impl VirtualDevice {
    /// Create a device with no stream attached yet.
    pub fn new() -> Self {
        Self {
            device_id: Uuid::new_v4(),
            localized_name: DEVICE_NAME,
            stream: RwLock::new(None),
        }
    }

    /// Stable device identity.
    pub fn id(&self) -> Uuid {
        self.device_id
    }

    /// Human-visible device name.
    pub fn name(&self) -> &'static str {
        self.localized_name
    }

    /// Attach the device's stream. A device owns exactly one stream.
    pub fn add_stream(&self, stream: Arc<VirtualStream>) -> DeviceResult<()> {
        let mut slot = self.stream.write();
        if slot.is_some() {
            return Err(DeviceError::StreamAlreadyAttached);
        }
        *slot = Some(stream);
        Ok(())
    }

    /// The attached stream, if wiring has happened.
    pub fn stream(&self) -> Option<Arc<VirtualStream>> {
        self.stream.read().clone()
    }

    /// The capability set this device can be asked about.
    pub fn capabilities(&self) -> &'static [Capability] {
        &[Capability::DeviceTransportType, Capability::DeviceModel]
    }

    /// Query a capability. Pure: answers never change at runtime.
    pub fn describe(&self, capability: Capability) -> Option<CapabilityValue> {
        match capability {
            Capability::DeviceTransportType => Some(CapabilityValue::Text(TRANSPORT_TYPE)),
            Capability::DeviceModel => Some(CapabilityValue::Text(DEVICE_MODEL)),
            _ => None,
        }
    }

    /// Accept a property-set request. Deliberately a no-op: the device's
    /// declared identity is immutable after construction.
    pub fn set_property(&self, _capability: Capability, _value: CapabilityValue) -> DeviceResult<()> {
        warn!("ignoring property-set request; device properties are immutable");
        Ok(())
    }
}

impl Default for VirtualDevice {
    fn default() -> Self {
        Self::new()
    }
}
