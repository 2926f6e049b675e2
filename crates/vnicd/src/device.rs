//! The virtual device: state machine, queue gate, and transmit path.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::{debug, info};

use vnic_common::{PacketDescriptor, VnicError, VnicResult};

use crate::config::DeviceConfig;
use crate::counters::CounterBlock;

const STATE_CREATED: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_STOPPED: u8 = 2;
const STATE_UNREGISTERED: u8 = 3;

/// Device lifecycle states.
///
/// `Created → Open ⇄ Stopped`, and any state to `Unregistered`, which is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Allocated and registered, never opened.
    Created,
    /// Accepting transmit requests.
    Open,
    /// Suspended; the host holds new transmit requests.
    Stopped,
    /// Torn down. Terminal.
    Unregistered,
}

impl DeviceState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            STATE_CREATED => DeviceState::Created,
            STATE_OPEN => DeviceState::Open,
            STATE_STOPPED => DeviceState::Stopped,
            _ => DeviceState::Unregistered,
        }
    }

    /// Returns the state name as a string for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Created => "created",
            DeviceState::Open => "open",
            DeviceState::Stopped => "stopped",
            DeviceState::Unregistered => "unregistered",
        }
    }
}

/// Outcome of handing a frame to the device.
///
/// A virtual medium cannot fail at the link layer, so the only outcome
/// today is `Accepted`. A future backing medium that can fail adds a
/// `Dropped` variant; frame release stays exactly-once either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// The frame was handed off and its resources released.
    Accepted,
}

/// The operations a host drives a network device through.
///
/// One trait, exactly the three entry points a minimal device needs.
pub trait NetDeviceOps: Send + Sync {
    /// Activates the device and raises the transmit-queue gate.
    fn open(&self) -> VnicResult<()>;

    /// Suspends the device and lowers the transmit-queue gate.
    fn stop(&self) -> VnicResult<()>;

    /// Hands an outbound frame to the device.
    ///
    /// The host only calls this while the queue gate is raised; the
    /// device does not re-check its own state here.
    fn transmit(&self, frame: PacketDescriptor) -> TxStatus;
}

/// One instance of the virtual interface.
///
/// The state field is the only shared mutable field besides the counter
/// block, and it is updated with single compare-and-swap transitions.
/// Lifecycle calls (open/stop/teardown) are serialized by the host;
/// transmit and diagnostics reads are not.
#[derive(Debug)]
pub struct VirtualDevice {
    name: String,
    state: AtomicU8,
    queue_running: AtomicBool,
    counters: CounterBlock,
    config: DeviceConfig,
}

impl VirtualDevice {
    pub(crate) fn new(name: String, config: DeviceConfig) -> Self {
        Self {
            name,
            state: AtomicU8::new(STATE_CREATED),
            queue_running: AtomicBool::new(false),
            counters: CounterBlock::new(),
            config,
        }
    }

    /// Host-assigned interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DeviceState {
        DeviceState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// The device's transmit counters.
    pub fn counters(&self) -> &CounterBlock {
        &self.counters
    }

    /// Configuration the device was created with.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// True while the host may hand the device transmit requests.
    ///
    /// This is the gate `open`/`stop` signal to the host; the host
    /// consults it before every hand-off.
    pub fn is_queue_running(&self) -> bool {
        self.queue_running.load(Ordering::Acquire)
    }

    /// Moves the device to its terminal state during teardown.
    pub(crate) fn mark_unregistered(&self) {
        self.queue_running.store(false, Ordering::Release);
        self.state.store(STATE_UNREGISTERED, Ordering::Release);
        debug!("Device {} marked unregistered", self.name);
    }

    /// One atomic state transition. On contention returns the state
    /// actually observed.
    fn swap_state(&self, from: u8, to: u8) -> Result<(), u8> {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
    }
}

impl NetDeviceOps for VirtualDevice {
    fn open(&self) -> VnicResult<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            match current {
                // Redundant open must not fail.
                STATE_OPEN => {
                    debug!("Device {} already open", self.name);
                    return Ok(());
                }
                STATE_UNREGISTERED => {
                    return Err(VnicError::invalid_transition("open", "unregistered"));
                }
                _ => {}
            }
            match self.swap_state(current, STATE_OPEN) {
                Ok(()) => break,
                Err(actual) => current = actual,
            }
        }
        self.queue_running.store(true, Ordering::Release);
        info!("Device {} opened", self.name);
        Ok(())
    }

    fn stop(&self) -> VnicResult<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            match current {
                // Redundant stop must not fail, and a never-opened
                // device stays in Created.
                STATE_STOPPED | STATE_CREATED => {
                    debug!("Device {} not open; stop is a no-op", self.name);
                    return Ok(());
                }
                STATE_UNREGISTERED => {
                    return Err(VnicError::invalid_transition("stop", "unregistered"));
                }
                _ => {}
            }
            match self.swap_state(current, STATE_STOPPED) {
                Ok(()) => break,
                Err(actual) => current = actual,
            }
        }
        // Stopping only blocks acceptance of new frames; nothing already
        // queued on the host side is dropped.
        self.queue_running.store(false, Ordering::Release);
        info!("Device {} stopped", self.name);
        Ok(())
    }

    fn transmit(&self, frame: PacketDescriptor) -> TxStatus {
        self.counters.record_transmit(u64::from(frame.len()));
        debug!(
            device = %self.name,
            len = frame.len(),
            protocol = %format_args!("{:#06x}", frame.protocol()),
            "xmit"
        );
        // No medium: the frame goes nowhere. Return it to the allocator.
        frame.release();
        TxStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::hostsim::SimAllocator;

    fn test_device() -> VirtualDevice {
        VirtualDevice::new("vnic0".to_string(), DeviceConfig::default())
    }

    #[test]
    fn test_created_device_is_gated() {
        let dev = test_device();

        assert_eq!(dev.state(), DeviceState::Created);
        assert!(!dev.is_queue_running());
    }

    #[test]
    fn test_open_stop_open() {
        let dev = test_device();

        dev.open().unwrap();
        assert_eq!(dev.state(), DeviceState::Open);
        assert!(dev.is_queue_running());

        dev.stop().unwrap();
        assert_eq!(dev.state(), DeviceState::Stopped);
        assert!(!dev.is_queue_running());

        dev.open().unwrap();
        assert_eq!(dev.state(), DeviceState::Open);
        assert!(dev.is_queue_running());
    }

    #[test]
    fn test_redundant_open_is_noop() {
        let dev = test_device();

        dev.open().unwrap();
        dev.open().unwrap();

        assert_eq!(dev.state(), DeviceState::Open);
    }

    #[test]
    fn test_stop_before_open_leaves_created() {
        let dev = test_device();

        dev.stop().unwrap();
        assert_eq!(dev.state(), DeviceState::Created);
    }

    #[test]
    fn test_redundant_stop_is_noop() {
        let dev = test_device();

        dev.open().unwrap();
        dev.stop().unwrap();
        dev.stop().unwrap();
        assert_eq!(dev.state(), DeviceState::Stopped);
    }

    #[test]
    fn test_ops_rejected_after_unregister() {
        let dev = test_device();

        dev.mark_unregistered();

        assert!(dev.open().is_err());
        assert!(dev.stop().is_err());
        assert_eq!(dev.state(), DeviceState::Unregistered);
    }

    #[test]
    fn test_transmit_accounts_and_releases() {
        let dev = test_device();
        let alloc = Arc::new(SimAllocator::new());
        dev.open().unwrap();

        let status = dev.transmit(alloc.frame(64, vnic_common::ethertype::IPV4));

        assert_eq!(status, TxStatus::Accepted);
        let snap = dev.counters().snapshot();
        assert_eq!(snap.tx_packets, 1);
        assert_eq!(snap.tx_bytes, 64);
        assert_eq!(alloc.outstanding(), 0);
        assert_eq!(alloc.reclaimed(), 1);
    }

    #[test]
    fn test_transmit_zero_length_frame() {
        let dev = test_device();
        let alloc = Arc::new(SimAllocator::new());
        dev.open().unwrap();

        dev.transmit(alloc.frame(0, vnic_common::ethertype::ARP));

        let snap = dev.counters().snapshot();
        assert_eq!(snap.tx_packets, 1);
        assert_eq!(snap.tx_bytes, 0);
        assert_eq!(alloc.reclaimed(), 1);
    }

    #[test]
    fn test_state_as_str() {
        assert_eq!(DeviceState::Created.as_str(), "created");
        assert_eq!(DeviceState::Open.as_str(), "open");
        assert_eq!(DeviceState::Stopped.as_str(), "stopped");
        assert_eq!(DeviceState::Unregistered.as_str(), "unregistered");
    }
}
