//! Device configuration and defaults.

use serde::{Deserialize, Serialize};
use vnic_common::{DeviceDescriptor, VnicError, VnicResult};

/// Default values for device configuration.
pub mod defaults {
    /// Default interface name template; `%d` is the instance-index slot.
    pub const DEFAULT_NAME_TEMPLATE: &str = "vnic%d";

    /// Default MTU (Ethernet-like).
    pub const DEFAULT_MTU: u32 = 1500;

    /// Default outbound queue capacity. The host enforces this as a soft
    /// admission bound; the device itself never queues.
    pub const DEFAULT_TX_QUEUE_LEN: u32 = 1000;
}

/// Configuration for one virtual device instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Interface name template handed to the registration authority.
    /// Must contain a `%d` instance-index slot.
    pub name_template: String,

    /// Maximum transmission unit.
    pub mtu: u32,

    /// Outbound queue capacity advertised to the host.
    pub tx_queue_len: u32,

    /// Disable address resolution. There is no medium, so this defaults
    /// to true.
    pub noarp: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_template: defaults::DEFAULT_NAME_TEMPLATE.to_string(),
            mtu: defaults::DEFAULT_MTU,
            tx_queue_len: defaults::DEFAULT_TX_QUEUE_LEN,
            noarp: true,
        }
    }
}

impl DeviceConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> VnicResult<()> {
        if !self.name_template.contains("%d") {
            return Err(VnicError::invalid_config(
                "name_template",
                "missing '%d' instance-index slot",
            ));
        }
        if self.mtu == 0 {
            return Err(VnicError::invalid_config("mtu", "must be nonzero"));
        }
        if self.tx_queue_len == 0 {
            return Err(VnicError::invalid_config("tx_queue_len", "must be nonzero"));
        }
        Ok(())
    }

    /// Builds the descriptor handed to the registration authority.
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            name_template: self.name_template.clone(),
            mtu: self.mtu,
            tx_queue_len: self.tx_queue_len,
            noarp: self.noarp,
        }
    }
}
