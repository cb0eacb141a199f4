//! Shell bridge binary.
//!
//! Speaks newline-delimited JSON: each stdin line is a `BridgeCommand`,
//! each stdout line a `BridgeEvent`. Logging goes to stderr so stdout
//! stays machine-readable. EOF on stdin shuts the engine down.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirrorcam_capture::StubBackend;
use mirrorcam_engine::Engine;
use mirrorcam_ipc::{command_channel, event_channel, BridgeCommand, EngineConfig};

/// Initialize logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mirrorcam=debug,mirrorcam_engine=debug,mirrorcam_capture=debug,mirrorcam_transport=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    info!("mirrorcam bridge starting");

    let (command_tx, command_rx) = command_channel();
    let (event_tx, event_rx) = event_channel();

    // TODO: swap the stub for a host capture backend once one lands.
    let backend = Arc::new(StubBackend::new(Vec::new()));
    let engine_thread = thread::spawn(move || {
        Engine::new(command_rx, event_tx, EngineConfig::default(), backend).run();
    });

    // Events out. Ends when the engine drops its event sender.
    let printer = thread::spawn(move || -> Result<()> {
        let stdout = std::io::stdout();
        for event in event_rx.iter() {
            let line = serde_json::to_string(&event)?;
            let mut out = stdout.lock();
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
            out.flush()?;
        }
        Ok(())
    });

    // Commands in.
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<BridgeCommand>(line) {
            Ok(command) => {
                let shutdown = matches!(command, BridgeCommand::Shutdown);
                if command_tx.send(command).is_err() {
                    warn!("engine is gone, exiting");
                    break;
                }
                if shutdown {
                    break;
                }
            }
            Err(e) => warn!("ignoring undecodable command: {}", e),
        }
    }

    let _ = command_tx.send(BridgeCommand::Shutdown);
    drop(command_tx);

    if engine_thread.join().is_err() {
        warn!("engine thread panicked");
    }
    match printer.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("event printer failed: {}", e),
        Err(_) => warn!("event printer panicked"),
    }

    info!("mirrorcam bridge exiting");
    Ok(())
}
