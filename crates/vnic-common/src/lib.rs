//! Common infrastructure for the vnic virtual network interface daemons.
//!
//! This crate provides the pieces shared between the device core and any
//! host embedding it:
//!
//! - [`error`]: Error types for vnic operations
//! - [`host`]: Contracts for the host collaborators (registration
//!   authority, diagnostic mount)
//! - [`packet`]: Outbound frame descriptors and the allocator contract
//!
//! # Architecture
//!
//! A virtual device lives inside a host networking stack and never owns
//! the machinery around it:
//!
//! 1. The host's registration authority accepts a descriptor and assigns
//!    the instance name
//! 2. The host's allocator owns frame memory; the device is handed
//!    descriptors and returns each one exactly once
//! 3. The host's diagnostic mount turns a render callback into a
//!    read-only entry
//!
//! # Example
//!
//! ```ignore
//! use vnic_common::{DeviceDescriptor, Registrar, VnicError, VnicResult};
//!
//! fn register(registrar: &dyn Registrar, desc: &DeviceDescriptor) -> VnicResult<String> {
//!     registrar
//!         .register(desc)
//!         .map_err(VnicError::registration_failed)
//! }
//! ```

pub mod error;
pub mod host;
pub mod packet;

// Re-export commonly used items at crate root
pub use error::{VnicError, VnicResult};
pub use host::{DeviceDescriptor, DiagHandle, DiagMount, Registrar, RenderFn};
pub use packet::{ethertype, HostAllocator, PacketDescriptor};
