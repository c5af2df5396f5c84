//! Device manager configuration

use heapless::Vec;

use crate::device::{DeviceClass, FAMILY_CARTRIDGE, FAMILY_RELOAD};
use crate::onewire::{DeviceId, DiscoveryParams, OneWireBus};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum bus routes
pub const MAX_BUS_ROUTES: usize = 8;

/// Maps devices seen on a bus to the record that tracks them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusRoute {
    pub bus: OneWireBus,
    /// Family code to match (None = any device on the bus)
    pub family: Option<u8>,
    pub class: DeviceClass,
}

impl BusRoute {
    pub const fn new(bus: OneWireBus, class: DeviceClass) -> Self {
        Self {
            bus,
            family: None,
            class,
        }
    }

    pub const fn with_family(bus: OneWireBus, family: u8, class: DeviceClass) -> Self {
        Self {
            bus,
            family: Some(family),
            class,
        }
    }

    fn matches(&self, bus: OneWireBus, id: DeviceId) -> bool {
        self.bus == bus && self.family.map_or(true, |family| family == id.family())
    }
}

/// Device manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceManagerConfig {
    /// Period of the liveness sweep when no events arrive
    pub sweep_interval_ms: u32,
    /// Attempts per EEPROM transfer (only timeouts are retried)
    pub io_attempts: u8,
    /// Parameters passed to the transport when discovery starts
    pub discovery: DiscoveryParams,
    /// Bus/family to record routing, first match wins
    pub bus_routes: Vec<BusRoute, MAX_BUS_ROUTES>,
}

impl Default for DeviceManagerConfig {
    fn default() -> Self {
        let mut bus_routes = Vec::new();
        for route in [
            BusRoute::new(OneWireBus::Handle, DeviceClass::Handle),
            BusRoute::new(OneWireBus::Battery, DeviceClass::Battery),
            BusRoute::new(OneWireBus::Clamshell, DeviceClass::Clamshell),
            BusRoute::new(OneWireBus::Adapter, DeviceClass::Adapter),
            BusRoute::with_family(OneWireBus::Connector, FAMILY_RELOAD, DeviceClass::Reload),
            BusRoute::with_family(OneWireBus::Connector, FAMILY_CARTRIDGE, DeviceClass::Cartridge),
        ] {
            // Six defaults fit in MAX_BUS_ROUTES
            let _ = bus_routes.push(route);
        }

        Self {
            sweep_interval_ms: 10,
            io_attempts: 3,
            discovery: DiscoveryParams::default(),
            bus_routes,
        }
    }
}

impl DeviceManagerConfig {
    /// Record class for a device seen on `bus`
    pub fn route(&self, bus: OneWireBus, id: DeviceId) -> Option<DeviceClass> {
        self.bus_routes
            .iter()
            .find(|route| route.matches(bus, id))
            .map(|route| route.class)
    }

    /// Every record class served by `bus`
    pub fn classes_on(&self, bus: OneWireBus) -> impl Iterator<Item = DeviceClass> + '_ {
        self.bus_routes
            .iter()
            .filter(move |route| route.bus == bus)
            .map(|route| route.class)
    }

    /// Distinct buses that carry at least one route
    pub fn buses(&self) -> Vec<OneWireBus, MAX_BUS_ROUTES> {
        let mut buses: Vec<OneWireBus, MAX_BUS_ROUTES> = Vec::new();
        for route in &self.bus_routes {
            if !buses.contains(&route.bus) {
                let _ = buses.push(route.bus);
            }
        }
        buses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_split_by_family() {
        let config = DeviceManagerConfig::default();
        assert_eq!(
            config.route(OneWireBus::Connector, DeviceId(0x55AA_0000_0000_0017)),
            Some(DeviceClass::Reload)
        );
        assert_eq!(
            config.route(OneWireBus::Connector, DeviceId(0x55AA_0000_0000_004C)),
            Some(DeviceClass::Cartridge)
        );
        assert_eq!(
            config.route(OneWireBus::Connector, DeviceId(0x55AA_0000_0000_0033)),
            None
        );
    }

    #[test]
    fn test_any_family_on_dedicated_bus() {
        let config = DeviceManagerConfig::default();
        assert_eq!(
            config.route(OneWireBus::Handle, DeviceId(0x0102_0304_0506_0708)),
            Some(DeviceClass::Handle)
        );
    }

    #[test]
    fn test_bus_wide_classes() {
        let config = DeviceManagerConfig::default();
        let mut classes = config.classes_on(OneWireBus::Connector);
        assert_eq!(classes.next(), Some(DeviceClass::Reload));
        assert_eq!(classes.next(), Some(DeviceClass::Cartridge));
        assert_eq!(classes.next(), None);
        assert_eq!(config.buses().len(), 5);
    }
}
