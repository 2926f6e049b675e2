//! In-process stand-ins for the host collaborators.
//!
//! The daemon binary and the tests need a host to register against, a
//! frame allocator, and a readable diagnostic mount. These simulations
//! keep the whole exchange in memory and journal it for inspection.
//! They are fixtures, not part of the device core.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use vnic_common::{
    DeviceDescriptor, DiagHandle, DiagMount, HostAllocator, PacketDescriptor, Registrar, RenderFn,
};

/// Host code for "no such device".
const CODE_NO_DEVICE: i32 = -19;

/// One observable interaction with the simulated host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A device was registered under the given name.
    Register(String),
    /// A device was unregistered.
    Unregister(String),
    /// A diagnostics entry was published.
    Publish(String),
    /// A diagnostics entry was removed.
    Unpublish(String),
}

/// Shared journal of host interactions, in call order.
#[derive(Debug, Default)]
pub struct HostJournal {
    events: Mutex<Vec<HostEvent>>,
}

impl HostJournal {
    fn record(&self, event: HostEvent) {
        self.events.lock().expect("journal lock poisoned").push(event);
    }

    /// All interactions so far.
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().expect("journal lock poisoned").clone()
    }
}

/// Simulated device registration authority.
///
/// Assigns names by substituting a running instance index into the
/// descriptor's `%d` slot, the way the host naming authority does.
pub struct SimRegistrar {
    journal: Arc<HostJournal>,
    next_index: AtomicU32,
    fail_code: Mutex<Option<i32>>,
    registered: Mutex<Vec<String>>,
}

impl SimRegistrar {
    /// Creates a registrar recording into `journal`.
    pub fn new(journal: Arc<HostJournal>) -> Self {
        Self {
            journal,
            next_index: AtomicU32::new(0),
            fail_code: Mutex::new(None),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next `register` call fail with `code`.
    pub fn fail_next(&self, code: i32) {
        *self.fail_code.lock().expect("fail_code lock poisoned") = Some(code);
    }

    /// Names currently registered.
    pub fn registered(&self) -> Vec<String> {
        self.registered
            .lock()
            .expect("registered lock poisoned")
            .clone()
    }
}

impl Registrar for SimRegistrar {
    fn register(&self, descriptor: &DeviceDescriptor) -> Result<String, i32> {
        if let Some(code) = self.fail_code.lock().expect("fail_code lock poisoned").take() {
            return Err(code);
        }

        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let name = descriptor.name_template.replace("%d", &index.to_string());
        self.registered
            .lock()
            .expect("registered lock poisoned")
            .push(name.clone());
        self.journal.record(HostEvent::Register(name.clone()));
        Ok(name)
    }

    fn unregister(&self, name: &str) -> Result<(), i32> {
        let mut registered = self.registered.lock().expect("registered lock poisoned");
        match registered.iter().position(|n| n == name) {
            Some(pos) => {
                registered.remove(pos);
                self.journal.record(HostEvent::Unregister(name.to_string()));
                Ok(())
            }
            None => Err(CODE_NO_DEVICE),
        }
    }
}

/// Simulated diagnostic-filesystem mount.
///
/// Published entries are readable through [`SimDiagMount::read`], which
/// invokes the render callback the way a host serves a file read.
pub struct SimDiagMount {
    journal: Arc<HostJournal>,
    entries: Mutex<HashMap<String, RenderFn>>,
    deny_publish: AtomicBool,
}

impl SimDiagMount {
    /// Creates a mount recording into `journal`.
    pub fn new(journal: Arc<HostJournal>) -> Self {
        Self {
            journal,
            entries: Mutex::new(HashMap::new()),
            deny_publish: AtomicBool::new(false),
        }
    }

    /// Makes all subsequent `publish` calls fail.
    pub fn deny_publish(&self) {
        self.deny_publish.store(true, Ordering::Relaxed);
    }

    /// Reads a published entry, rendering its current content.
    pub fn read(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock().expect("entries lock poisoned");
        entries.get(name).map(|render| render())
    }

    /// Names of all published entries.
    pub fn published(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("entries lock poisoned");
        entries.keys().cloned().collect()
    }
}

impl DiagMount for SimDiagMount {
    fn publish(&self, name: &str, render: RenderFn) -> Result<DiagHandle, ()> {
        if self.deny_publish.load(Ordering::Relaxed) {
            return Err(());
        }
        self.entries
            .lock()
            .expect("entries lock poisoned")
            .insert(name.to_string(), render);
        self.journal.record(HostEvent::Publish(name.to_string()));
        Ok(DiagHandle::new(name))
    }

    fn unpublish(&self, name: &str) {
        let removed = self
            .entries
            .lock()
            .expect("entries lock poisoned")
            .remove(name);
        if removed.is_some() {
            self.journal.record(HostEvent::Unpublish(name.to_string()));
        }
    }
}

/// Simulated host frame allocator.
///
/// Hands out descriptors and counts them back in, so tests can assert
/// that every frame is released exactly once.
#[derive(Debug, Default)]
pub struct SimAllocator {
    outstanding: AtomicI64,
    reclaimed: AtomicU64,
}

impl SimAllocator {
    /// Creates an allocator with nothing outstanding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a frame descriptor owned by this allocator.
    pub fn frame(self: &Arc<Self>, len: u32, protocol: u16) -> PacketDescriptor {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        PacketDescriptor::new(len, protocol, self.clone())
    }

    /// Descriptors handed out and not yet reclaimed.
    pub fn outstanding(&self) -> i64 {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Total descriptors reclaimed.
    pub fn reclaimed(&self) -> u64 {
        self.reclaimed.load(Ordering::SeqCst)
    }
}

impl HostAllocator for SimAllocator {
    fn reclaim(&self, _len: u32) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.reclaimed.fetch_add(1, Ordering::SeqCst);
    }
}
