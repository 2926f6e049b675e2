//! Host collaborator contracts.
//!
//! The vnic core participates in a host networking stack it does not
//! implement. This module defines the three surfaces the core calls
//! into: the device registration authority, and the diagnostic
//! filesystem mount. (The frame allocator contract lives in
//! [`crate::packet`] because it is wired through the descriptor.)
//!
//! Production hosts implement these traits over their real naming and
//! diagnostics machinery; the daemon binary and the tests use in-process
//! stand-ins.

use serde::{Deserialize, Serialize};

/// Descriptor handed to the registration authority when creating a device.
///
/// The `name_template` carries a `%d` slot that the authority fills with
/// the assigned instance index (e.g., `vnic%d` becomes `vnic0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Interface name template, with a `%d` instance-index slot.
    pub name_template: String,

    /// Maximum transmission unit.
    pub mtu: u32,

    /// Outbound queue capacity. A soft admission bound enforced by the
    /// host, not by the device core.
    pub tx_queue_len: u32,

    /// Disable address resolution. Always sensible here: there is no
    /// medium to resolve addresses on.
    pub noarp: bool,
}

/// Host device registration authority.
///
/// Accepts or rejects a device descriptor and assigns the instance name.
/// Registration failures are reported as a host code; the caller maps
/// them to [`crate::VnicError::RegistrationFailed`].
pub trait Registrar: Send + Sync {
    /// Registers a device, returning the assigned name.
    fn register(&self, descriptor: &DeviceDescriptor) -> Result<String, i32>;

    /// Unregisters a previously registered device by name.
    ///
    /// A refusal is reported as a host code. Callers treat it as
    /// best-effort: local resources are released regardless.
    fn unregister(&self, name: &str) -> Result<(), i32>;
}

/// A render callback published on the diagnostic mount.
///
/// Invoked by the host whenever the published entry is read. Must be
/// callable from any host thread, concurrently with transmit.
pub type RenderFn = Box<dyn Fn() -> String + Send + Sync>;

/// Registration token for a published diagnostics surface.
///
/// Holding the token does not keep the device alive; it only names the
/// published entry so it can be removed before the device is destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagHandle {
    name: String,
}

impl DiagHandle {
    /// Creates a handle for a published entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name of the published entry.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Host diagnostic-filesystem mount point.
///
/// Turns a render callback into a read-only readable entry. Publish
/// failures are non-fatal to the device.
pub trait DiagMount: Send + Sync {
    /// Publishes a read-only entry under `name`.
    fn publish(&self, name: &str, render: RenderFn) -> Result<DiagHandle, ()>;

    /// Removes a published entry. Unknown names are ignored.
    fn unpublish(&self, name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_serde_round_trip() {
        let desc = DeviceDescriptor {
            name_template: "vnic%d".to_string(),
            mtu: 1500,
            tx_queue_len: 1000,
            noarp: true,
        };

        let json = serde_json::to_string(&desc).unwrap();
        let back: DeviceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn test_diag_handle_name() {
        let handle = DiagHandle::new("vnic0");
        assert_eq!(handle.name(), "vnic0");
    }
}
