//! Read-only diagnostics rendering.
//!
//! Renders a point-in-time snapshot of a device's counter block as the
//! two-line `key=value` text the host diagnostic mount serves. Rendering
//! never mutates state and never takes a lock shared with the transmit
//! path.

use crate::device::VirtualDevice;

/// Field names in the rendered stats text.
pub mod fields {
    /// Frames handed off for transmission.
    pub const TX_PACKETS: &str = "tx_packets";

    /// Payload bytes handed off for transmission.
    pub const TX_BYTES: &str = "tx_bytes";
}

/// Renders a device's counters as diagnostic text.
///
/// Two newline-terminated `key=value` lines, values as unsigned decimal,
/// no trailing content. A read can race teardown and find the device
/// gone; both counters render as zero then, since there is nothing left
/// to report on.
pub fn render_counters(device: Option<&VirtualDevice>) -> String {
    let snapshot = device.map(|d| d.counters().snapshot()).unwrap_or_default();
    format!(
        "{}={}\n{}={}\n",
        fields::TX_PACKETS,
        snapshot.tx_packets,
        fields::TX_BYTES,
        snapshot.tx_bytes
    )
}
