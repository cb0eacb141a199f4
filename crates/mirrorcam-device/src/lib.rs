//! Virtual camera provider runtime.
//!
//! This crate is the device-provider process's half of the pipeline:
//! a stream server that accepts the capture process's frame connection
//! and decodes messages, and the provider/device/stream triad that
//! presents those frames to the OS as a synthetic camera. Registration
//! of the extension with the OS happens outside this crate; the runtime
//! assumes the device is already registered.

mod device;
mod error;
mod properties;
mod provider;
mod server;
mod stream;

pub use device::VirtualDevice;
pub use error::DeviceError;
pub use properties::{Capability, CapabilityValue, StreamFormat};
pub use provider::{build_camera_stack, CameraProvider, CameraStack};
pub use server::StreamServer;
pub use stream::{ChannelConsumer, FrameConsumer, PublishedFrame, PublishingState, VirtualStream};

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
