//! One-wire bus master trait

use crate::onewire::{DeviceId, DiscoveryParams, OneWireBus, OneWireError, Packet};

/// One-wire bus master
///
/// Implementations perform bus-level discovery, ROM addressing and framing.
/// Discovery results are delivered asynchronously as
/// [`TransportEvent`](crate::onewire::TransportEvent)s posted to the device
/// manager's request queue, never returned from these calls.
///
/// All calls block the caller for the duration of the bus transaction.
pub trait OneWireTransport {
    /// Start background discovery on `bus`
    fn discover(&mut self, bus: OneWireBus, params: &DiscoveryParams) -> Result<(), OneWireError>;

    /// Run the authentication challenge against `id`
    fn authenticate(&mut self, id: DeviceId) -> Result<(), OneWireError>;

    /// Address `id` and run `packets` in order
    ///
    /// Every packet's `rx` buffer is filled completely on success.
    fn transfer(&mut self, id: DeviceId, packets: &mut [Packet<'_>]) -> Result<(), OneWireError>;
}
