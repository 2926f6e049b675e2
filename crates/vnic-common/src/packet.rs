//! Outbound packet descriptors and the host frame allocator contract.
//!
//! A [`PacketDescriptor`] is an opaque handle to bytes-to-transmit,
//! owned by the host allocator. Ownership transfers into the transmit
//! handler for the duration of the call, and the descriptor must be
//! returned to the allocator exactly once per call, on every path.
//! The descriptor encodes that contract in the type system: releasing
//! consumes the value, and dropping it on any path (including an early
//! return) performs the release.

use std::fmt;
use std::sync::Arc;

/// Well-known protocol tags carried by outbound frames.
///
/// Values match the EtherType assignments used on Ethernet-like links.
pub mod ethertype {
    /// IPv4.
    pub const IPV4: u16 = 0x0800;

    /// ARP.
    pub const ARP: u16 = 0x0806;

    /// IPv6.
    pub const IPV6: u16 = 0x86DD;
}

/// Host frame allocator.
///
/// Supplies and reclaims packet memory. The core never allocates frames
/// itself; it only returns descriptors it was handed. `reclaim` is
/// invoked exactly once per descriptor, from whichever thread releases
/// it.
pub trait HostAllocator: Send + Sync {
    /// Returns a frame's resources to the allocator.
    fn reclaim(&self, len: u32);
}

/// An opaque handle to an outbound frame.
///
/// Carries the frame length and protocol tag plus a reference to the
/// owning allocator. The payload bytes themselves stay on the host side;
/// a virtual device only accounts for them.
pub struct PacketDescriptor {
    len: u32,
    protocol: u16,
    allocator: Option<Arc<dyn HostAllocator>>,
}

impl PacketDescriptor {
    /// Creates a descriptor owned by `allocator`.
    pub fn new(len: u32, protocol: u16, allocator: Arc<dyn HostAllocator>) -> Self {
        Self {
            len,
            protocol,
            allocator: Some(allocator),
        }
    }

    /// Frame length in bytes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// True for a zero-length frame.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Protocol tag (EtherType).
    pub fn protocol(&self) -> u16 {
        self.protocol
    }

    /// Returns the frame to its allocator.
    ///
    /// Consumes the descriptor, so a second release cannot compile.
    /// Dropping the descriptor has the same effect; this method exists
    /// so the release point reads explicitly in the transmit path.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for PacketDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketDescriptor")
            .field("len", &self.len)
            .field("protocol", &format_args!("{:#06x}", self.protocol))
            .finish()
    }
}

impl Drop for PacketDescriptor {
    fn drop(&mut self) {
        if let Some(allocator) = self.allocator.take() {
            allocator.reclaim(self.len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingAllocator {
        reclaimed: AtomicU32,
        bytes: AtomicU32,
    }

    impl HostAllocator for CountingAllocator {
        fn reclaim(&self, len: u32) {
            self.reclaimed.fetch_add(1, Ordering::SeqCst);
            self.bytes.fetch_add(len, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_reclaims_once() {
        let alloc = Arc::new(CountingAllocator::default());
        let pkt = PacketDescriptor::new(64, ethertype::IPV4, alloc.clone());

        pkt.release();

        assert_eq!(alloc.reclaimed.load(Ordering::SeqCst), 1);
        assert_eq!(alloc.bytes.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn test_drop_reclaims() {
        let alloc = Arc::new(CountingAllocator::default());
        {
            let _pkt = PacketDescriptor::new(128, ethertype::IPV6, alloc.clone());
        }
        assert_eq!(alloc.reclaimed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_accessors() {
        let alloc = Arc::new(CountingAllocator::default());
        let pkt = PacketDescriptor::new(0, ethertype::ARP, alloc);

        assert_eq!(pkt.len(), 0);
        assert!(pkt.is_empty());
        assert_eq!(pkt.protocol(), 0x0806);
    }
}
