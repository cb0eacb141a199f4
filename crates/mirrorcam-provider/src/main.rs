//! Virtual camera provider binary.
//!
//! Assembles the provider/device/stream triad and serves the loopback
//! frame endpoint until interrupted. Registration of the device with the
//! OS happens outside this process; consumers attach to the stream the
//! triad exposes.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirrorcam_device::{build_camera_stack, FrameConsumer, PublishedFrame, StreamServer};
use mirrorcam_protocol::default_endpoint;

/// Initialize logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mirrorcam=debug,mirrorcam_device=debug,mirrorcam_protocol=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logs frame cadence. Stands in for the OS-side consumer that relays
/// published frames to applications.
struct LoggingConsumer;

impl FrameConsumer for LoggingConsumer {
    fn frame(&self, frame: &PublishedFrame) {
        // One line per second at the target cadence.
        if frame.sequence % 30 == 0 {
            debug!(
                sequence = frame.sequence,
                pts_100ns = frame.pts_100ns,
                "frames flowing"
            );
        }
    }

    fn idled(&self) {
        info!("stream returned to idle");
    }
}

fn main() -> Result<()> {
    init_logging();

    let stack = build_camera_stack();
    stack.stream.attach_consumer(Arc::new(LoggingConsumer));

    let endpoint = default_endpoint();
    let server = StreamServer::new(Arc::clone(&stack.stream), endpoint.to_string());
    info!(
        %endpoint,
        device = stack.device.name(),
        format = %stack.stream.format(),
        "virtual camera provider starting"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        tokio::select! {
            result = server.run() => result.map_err(anyhow::Error::from),
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                Ok(())
            }
        }
    })
}
