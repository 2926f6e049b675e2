//! vnicd daemon entry point.
//!
//! Brings up one virtual device against the in-process host, pushes a
//! few demonstration frames through the transmit path, reads the
//! published stats back, and tears everything down again.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use vnic_common::ethertype;
use vnicd::hostsim::{HostJournal, SimAllocator, SimDiagMount, SimRegistrar};
use vnicd::{DeviceConfig, DeviceMgr, NetDeviceOps};

/// Initialize tracing/logging.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Loads device configuration from the file named by `VNIC_CONFIG`,
/// falling back to defaults when the variable is unset.
fn load_config() -> anyhow::Result<DeviceConfig> {
    match std::env::var("VNIC_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            let config: DeviceConfig =
                serde_json::from_str(&raw).with_context(|| format!("parsing config file {path}"))?;
            info!("Loaded device config from {}", path);
            Ok(config)
        }
        Err(_) => Ok(DeviceConfig::default()),
    }
}

fn run() -> anyhow::Result<()> {
    let config = load_config()?;

    let journal = Arc::new(HostJournal::default());
    let registrar = Arc::new(SimRegistrar::new(journal.clone()));
    let diag_mount = Arc::new(SimDiagMount::new(journal));
    let allocator = Arc::new(SimAllocator::new());

    let mut mgr = DeviceMgr::new(registrar, diag_mount.clone());
    let device = mgr.create_and_register(config)?;
    info!("Module loaded, device={}", device.name());

    device.open()?;

    // Hand a few demonstration frames through the host transmit path.
    // The host consults the queue gate before every hand-off.
    for (len, protocol) in [
        (64, ethertype::IPV4),
        (128, ethertype::IPV6),
        (42, ethertype::ARP),
    ] {
        if device.is_queue_running() {
            device.transmit(allocator.frame(len, protocol));
        }
    }

    if let Some(stats) = diag_mount.read(device.name()) {
        info!("Stats for {}:\n{}", device.name(), stats);
    }
    debug!(
        outstanding = allocator.outstanding(),
        "Frame descriptors outstanding"
    );
    info!(
        "Final snapshot: {}",
        serde_json::to_string(&device.counters().snapshot())?
    );

    device.stop()?;
    mgr.teardown();
    info!("Module unloaded");
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    info!("--- Starting vnicd (Rust) ---");

    match run() {
        Ok(()) => {
            info!("vnicd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("vnicd error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
