//! DeviceMgr - device lifecycle orchestration.
//!
//! Owns the one registered device instance and keeps creation and
//! teardown symmetric against the host collaborators: register, then
//! publish diagnostics; unpublish diagnostics, then unregister.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use vnic_common::{DiagHandle, DiagMount, Registrar, RenderFn, VnicError, VnicResult};

use crate::config::DeviceConfig;
use crate::device::VirtualDevice;
use crate::diag;

/// Device lifecycle manager.
///
/// Holds one registered device at a time. Multiple managers can coexist
/// in one process; there is no global state.
pub struct DeviceMgr {
    registrar: Arc<dyn Registrar>,
    diag_mount: Arc<dyn DiagMount>,
    device: Option<Arc<VirtualDevice>>,
    diag: Option<DiagHandle>,
}

impl DeviceMgr {
    /// Creates a manager bound to the host collaborators.
    pub fn new(registrar: Arc<dyn Registrar>, diag_mount: Arc<dyn DiagMount>) -> Self {
        Self {
            registrar,
            diag_mount,
            device: None,
            diag: None,
        }
    }

    /// Creates a device, registers it with the host, and publishes its
    /// diagnostics surface.
    ///
    /// Registration failure is fatal: partial resources are released and
    /// the host code is propagated. A diagnostics publish failure is
    /// logged and the device is returned without a stats surface.
    #[instrument(skip(self, config))]
    pub fn create_and_register(&mut self, config: DeviceConfig) -> VnicResult<Arc<VirtualDevice>> {
        if self.device.is_some() {
            return Err(VnicError::internal("manager already holds a device"));
        }
        config.validate()?;

        let descriptor = config.descriptor();
        let name = self.registrar.register(&descriptor).map_err(|code| {
            warn!("Host rejected device registration: code {}", code);
            VnicError::registration_failed(code)
        })?;

        // Counters start at (0,0) inside the device allocation.
        let device = Arc::new(VirtualDevice::new(name.clone(), config));

        // The render callback holds a weak reference: a read racing
        // teardown upgrades to nothing and renders zeros.
        let weak = Arc::downgrade(&device);
        let render: RenderFn = Box::new(move || diag::render_counters(weak.upgrade().as_deref()));
        match self.diag_mount.publish(&name, render) {
            Ok(handle) => {
                debug!("Published diagnostics entry {}", handle.name());
                self.diag = Some(handle);
            }
            Err(()) => {
                warn!("{}", VnicError::diagnostics_unavailable(name.as_str()));
            }
        }

        info!("Device {} registered", name);
        self.device = Some(device.clone());
        Ok(device)
    }

    /// Tears down the registered device, if any.
    ///
    /// Unpublishes diagnostics before unregistering the device, so a
    /// reader can never observe a counter block after its device is
    /// freed. A host refusal to unregister is logged and local resources
    /// are released anyway. Calling this with nothing registered is a
    /// no-op.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.diag.take() {
            self.diag_mount.unpublish(handle.name());
            debug!("Unpublished diagnostics entry {}", handle.name());
        }

        match self.device.take() {
            Some(device) => {
                device.mark_unregistered();
                if let Err(code) = self.registrar.unregister(device.name()) {
                    warn!(
                        "Host refused unregister of {} (code {}); releasing locally",
                        device.name(),
                        code
                    );
                } else {
                    info!("Device {} unregistered", device.name());
                }
            }
            None => debug!("Teardown with no registered device; nothing to do"),
        }
    }

    /// The registered device, if any.
    pub fn device(&self) -> Option<&Arc<VirtualDevice>> {
        self.device.as_ref()
    }

    /// True if a diagnostics surface is currently published.
    pub fn has_diagnostics(&self) -> bool {
        self.diag.is_some()
    }
}

impl Drop for DeviceMgr {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::hostsim::{HostEvent, HostJournal, SimDiagMount, SimRegistrar};

    fn sim_host() -> (Arc<HostJournal>, Arc<SimRegistrar>, Arc<SimDiagMount>) {
        let journal = Arc::new(HostJournal::default());
        let registrar = Arc::new(SimRegistrar::new(journal.clone()));
        let diag_mount = Arc::new(SimDiagMount::new(journal.clone()));
        (journal, registrar, diag_mount)
    }

    #[test]
    fn test_create_assigns_name_from_template() {
        let (_journal, registrar, diag_mount) = sim_host();
        let mut mgr = DeviceMgr::new(registrar, diag_mount);

        let device = mgr.create_and_register(DeviceConfig::default()).unwrap();

        assert_eq!(device.name(), "vnic0");
        assert!(mgr.has_diagnostics());
    }

    #[test]
    fn test_second_create_is_rejected() {
        let (_journal, registrar, diag_mount) = sim_host();
        let mut mgr = DeviceMgr::new(registrar, diag_mount);

        mgr.create_and_register(DeviceConfig::default()).unwrap();
        let err = mgr.create_and_register(DeviceConfig::default()).unwrap_err();

        assert!(matches!(err, VnicError::Internal { .. }));
    }

    #[test]
    fn test_registration_failure_propagates_code() {
        let (journal, registrar, diag_mount) = sim_host();
        registrar.fail_next(-12);
        let mut mgr = DeviceMgr::new(registrar, diag_mount);

        let err = mgr.create_and_register(DeviceConfig::default()).unwrap_err();

        assert!(matches!(err, VnicError::RegistrationFailed { code: -12 }));
        assert!(mgr.device().is_none());
        // Nothing was published for the failed device.
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_registration() {
        let (journal, registrar, diag_mount) = sim_host();
        let mut mgr = DeviceMgr::new(registrar, diag_mount);

        let config = DeviceConfig {
            name_template: "bare".to_string(),
            ..Default::default()
        };
        let err = mgr.create_and_register(config).unwrap_err();

        assert!(matches!(err, VnicError::InvalidConfig { .. }));
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_diag_publish_failure_is_nonfatal() {
        let (_journal, registrar, diag_mount) = sim_host();
        diag_mount.deny_publish();
        let mut mgr = DeviceMgr::new(registrar, diag_mount.clone());

        let device = mgr.create_and_register(DeviceConfig::default()).unwrap();

        assert!(!mgr.has_diagnostics());
        assert!(diag_mount.read(device.name()).is_none());
        // Device stays fully usable without a stats surface.
        use crate::device::NetDeviceOps;
        device.open().unwrap();
        device.counters().record_transmit(64);
        assert_eq!(device.counters().snapshot().tx_packets, 1);
    }

    #[test]
    fn test_teardown_orders_unpublish_before_unregister() {
        let (journal, registrar, diag_mount) = sim_host();
        let mut mgr = DeviceMgr::new(registrar, diag_mount);

        mgr.create_and_register(DeviceConfig::default()).unwrap();
        mgr.teardown();

        let events = journal.events();
        assert_eq!(
            events,
            vec![
                HostEvent::Register("vnic0".to_string()),
                HostEvent::Publish("vnic0".to_string()),
                HostEvent::Unpublish("vnic0".to_string()),
                HostEvent::Unregister("vnic0".to_string()),
            ]
        );
    }

    #[test]
    fn test_teardown_twice_is_noop() {
        let (journal, registrar, diag_mount) = sim_host();
        let mut mgr = DeviceMgr::new(registrar, diag_mount);

        mgr.create_and_register(DeviceConfig::default()).unwrap();
        mgr.teardown();
        let after_first = journal.events();

        mgr.teardown();
        assert_eq!(journal.events(), after_first);
        assert!(mgr.device().is_none());
    }

    #[test]
    fn test_drop_tears_down() {
        let (journal, registrar, diag_mount) = sim_host();
        {
            let mut mgr = DeviceMgr::new(registrar.clone(), diag_mount);
            mgr.create_and_register(DeviceConfig::default()).unwrap();
        }

        let events = journal.events();
        assert_eq!(
            events.last(),
            Some(&HostEvent::Unregister("vnic0".to_string()))
        );
        assert!(registrar.registered().is_empty());
    }
}
