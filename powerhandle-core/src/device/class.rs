//! Device classes and device type registry

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One-wire family code of reload chips
pub const FAMILY_RELOAD: u8 = 0x17;

/// One-wire family code of cartridge chips
pub const FAMILY_CARTRIDGE: u8 = 0x4C;

/// Detachable accessory classes, one record each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceClass {
    Handle,
    Clamshell,
    Adapter,
    Reload,
    Cartridge,
    Battery,
}

impl DeviceClass {
    /// Number of classes
    pub const COUNT: usize = 6;

    /// Order in which a sweep evaluates records; Handle must come first
    pub const SWEEP_ORDER: [DeviceClass; Self::COUNT] = [
        DeviceClass::Handle,
        DeviceClass::Clamshell,
        DeviceClass::Adapter,
        DeviceClass::Reload,
        DeviceClass::Cartridge,
        DeviceClass::Battery,
    ];

    /// Record slot
    pub const fn index(self) -> usize {
        match self {
            DeviceClass::Handle => 0,
            DeviceClass::Clamshell => 1,
            DeviceClass::Adapter => 2,
            DeviceClass::Reload => 3,
            DeviceClass::Cartridge => 4,
            DeviceClass::Battery => 5,
        }
    }

    /// High byte of every device type code in this class
    pub const fn type_prefix(self) -> u8 {
        match self {
            DeviceClass::Handle => 0x01,
            DeviceClass::Clamshell => 0x02,
            DeviceClass::Adapter => 0x03,
            DeviceClass::Reload => 0x04,
            DeviceClass::Cartridge => 0x05,
            DeviceClass::Battery => 0x06,
        }
    }

    /// Instances the firmware knows how to drive
    fn supported_instances(self) -> &'static [u8] {
        match self {
            DeviceClass::Handle => &[0x01],
            DeviceClass::Clamshell => &[0x01],
            DeviceClass::Adapter => &[0x01, 0x02],
            DeviceClass::Reload => &[0x01, 0x02, 0x03],
            DeviceClass::Cartridge => &[0x01, 0x02],
            DeviceClass::Battery => &[0x01],
        }
    }
}

pub const DEVICE_ID_HANDLE: u16 = 0x0101;
pub const DEVICE_ID_CLAMSHELL: u16 = 0x0201;
pub const DEVICE_ID_ADAPTER_EEA: u16 = 0x0301;
pub const DEVICE_ID_ADAPTER_EGIA: u16 = 0x0302;
pub const DEVICE_ID_RELOAD_30MM: u16 = 0x0401;
pub const DEVICE_ID_RELOAD_45MM: u16 = 0x0402;
pub const DEVICE_ID_RELOAD_60MM: u16 = 0x0403;
pub const DEVICE_ID_CARTRIDGE_STANDARD: u16 = 0x0501;
pub const DEVICE_ID_CARTRIDGE_RADIAL: u16 = 0x0502;
pub const DEVICE_ID_BATTERY: u16 = 0x0601;

/// Device type code as stored in the EEPROM record
///
/// High byte selects the class, low byte the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceType(pub u16);

impl DeviceType {
    pub const fn class_prefix(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn instance(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Check that the type belongs to `class` and is a known instance
    pub fn is_supported_for(self, class: DeviceClass) -> bool {
        self.class_prefix() == class.type_prefix()
            && class.supported_instances().contains(&self.instance())
    }
}
