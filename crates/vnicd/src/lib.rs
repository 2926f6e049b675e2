//! Software-only virtual network interface daemon.
//!
//! This crate implements `vnicd`, a network interface with no physical
//! transmission medium: every frame handed to it is accounted and
//! immediately returned to the host allocator.
//!
//! # Responsibilities
//!
//! - Drive the device lifecycle: create, register, open/stop, tear down
//! - Account transmitted frames in a lock-free counter block
//! - Publish a read-only `key=value` stats surface on the host
//!   diagnostic mount
//! - Release every frame descriptor exactly once
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Device configuration and defaults |
//! | [`counters`] | Atomic transmit accounting |
//! | [`device`] | State machine and transmit path |
//! | [`device_mgr`] | Lifecycle orchestration against the host |
//! | [`diag`] | Read-only stats rendering |
//! | [`hostsim`] | In-process host stand-ins for the binary and tests |
//!
//! # Example
//!
//! ```ignore
//! use vnicd::{DeviceConfig, DeviceMgr, NetDeviceOps};
//!
//! let mut mgr = DeviceMgr::new(registrar, diag_mount);
//! let device = mgr.create_and_register(DeviceConfig::default())?;
//! device.open()?;
//! device.transmit(frame);
//! mgr.teardown();
//! ```

pub mod config;
pub mod counters;
pub mod device;
pub mod device_mgr;
pub mod diag;
pub mod hostsim;

pub use config::{defaults, DeviceConfig};
pub use counters::{CounterBlock, CounterSnapshot};
pub use device::{DeviceState, NetDeviceOps, TxStatus, VirtualDevice};
pub use device_mgr::DeviceMgr;
