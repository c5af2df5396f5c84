//! Typed per-class memory layouts
//!
//! Fields are addressed through explicit byte offsets into the 64-byte
//! record, never through struct layout. Every class must end before the
//! write-test counter; this is checked at compile time.

use static_assertions::const_assert;

use super::DeviceClass;
use crate::eeprom::{MemoryImage, CLASS_FIELDS_OFFSET, WRITE_TEST_OFFSET};

mod handle {
    pub const FIRING_COUNT: usize = 3;
    pub const PROCEDURE_COUNT: usize = 7;
    pub const MAX_PROCEDURES: usize = 9;
    pub const SERIAL: usize = 11;
    pub const SERIAL_LEN: usize = 10;
    pub const END: usize = SERIAL + SERIAL_LEN;
}

mod battery {
    pub const CHARGE_CYCLES: usize = 3;
    pub const DESIGN_CAPACITY: usize = 5;
    pub const PROCEDURE_COUNT: usize = 7;
    pub const MAX_PROCEDURES: usize = 9;
    pub const END: usize = 11;
}

mod clamshell {
    pub const USED: usize = 3;
    pub const PROCEDURE_COUNT: usize = 4;
    pub const END: usize = 6;
}

mod adapter {
    pub const PROCEDURE_COUNT: usize = 3;
    pub const MAX_PROCEDURES: usize = 5;
    pub const FIRING_COUNT: usize = 7;
    pub const STRAIN_GAUGE_OFFSET: usize = 11;
    pub const STRAIN_GAUGE_GAIN: usize = 13;
    pub const END: usize = 15;
}

mod reload {
    pub const LENGTH_MM: usize = 3;
    pub const STAPLE_HEIGHT: usize = 4;
    pub const COLOR: usize = 5;
    pub const FIRED: usize = 6;
    pub const MAX_CLAMP_FORCE: usize = 7;
    pub const FIRE_TURNS_X100: usize = 9;
    pub const END: usize = 11;
}

mod cartridge {
    pub const COLOR: usize = 3;
    pub const LENGTH_MM: usize = 4;
    pub const FIRED: usize = 5;
    pub const MAX_FORCE: usize = 6;
    pub const END: usize = 8;
}

const_assert!(handle::FIRING_COUNT >= CLASS_FIELDS_OFFSET);
const_assert!(handle::END <= WRITE_TEST_OFFSET);
const_assert!(battery::END <= WRITE_TEST_OFFSET);
const_assert!(clamshell::END <= WRITE_TEST_OFFSET);
const_assert!(adapter::END <= WRITE_TEST_OFFSET);
const_assert!(reload::END <= WRITE_TEST_OFFSET);
const_assert!(cartridge::END <= WRITE_TEST_OFFSET);

/// Handle main board record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandleData {
    pub firing_count: u32,
    pub procedure_count: u16,
    pub max_procedures: u16,
    /// ASCII, zero padded
    pub serial: [u8; handle::SERIAL_LEN],
}

/// Battery pack record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryData {
    pub charge_cycles: u16,
    pub design_capacity_mah: u16,
    pub procedure_count: u16,
    pub max_procedures: u16,
}

/// Sterile clamshell record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClamshellData {
    pub used: bool,
    pub procedure_count: u16,
}

/// Adapter record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdapterData {
    pub procedure_count: u16,
    pub max_procedures: u16,
    pub firing_count: u32,
    /// Strain gauge zero offset in ADC counts
    pub strain_gauge_offset: i16,
    /// Strain gauge gain, counts per newton ×1000
    pub strain_gauge_gain: u16,
}

/// Reload record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReloadData {
    pub length_mm: u8,
    /// Closed staple height in 0.1 mm
    pub staple_height: u8,
    pub color: u8,
    pub fired: bool,
    /// Clamp force limit in newtons
    pub max_clamp_force: u16,
    /// Fire stroke in shaft turns ×100
    pub fire_turns_x100: u16,
}

/// Cartridge record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CartridgeData {
    pub color: u8,
    pub length_mm: u8,
    pub fired: bool,
    pub max_force: u16,
}

/// Decoded class fields of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceData {
    Handle(HandleData),
    Clamshell(ClamshellData),
    Adapter(AdapterData),
    Reload(ReloadData),
    Cartridge(CartridgeData),
    Battery(BatteryData),
}

impl DeviceData {
    /// Class this data belongs to
    pub fn class(&self) -> DeviceClass {
        match self {
            DeviceData::Handle(_) => DeviceClass::Handle,
            DeviceData::Clamshell(_) => DeviceClass::Clamshell,
            DeviceData::Adapter(_) => DeviceClass::Adapter,
            DeviceData::Reload(_) => DeviceClass::Reload,
            DeviceData::Cartridge(_) => DeviceClass::Cartridge,
            DeviceData::Battery(_) => DeviceClass::Battery,
        }
    }

    /// Decode the class fields of `image`
    pub fn decode(class: DeviceClass, image: &MemoryImage) -> Self {
        match class {
            DeviceClass::Handle => {
                let mut serial = [0u8; handle::SERIAL_LEN];
                serial.copy_from_slice(&image.as_bytes()[handle::SERIAL..handle::END]);
                DeviceData::Handle(HandleData {
                    firing_count: image.u32_at(handle::FIRING_COUNT),
                    procedure_count: image.u16_at(handle::PROCEDURE_COUNT),
                    max_procedures: image.u16_at(handle::MAX_PROCEDURES),
                    serial,
                })
            }
            DeviceClass::Battery => DeviceData::Battery(BatteryData {
                charge_cycles: image.u16_at(battery::CHARGE_CYCLES),
                design_capacity_mah: image.u16_at(battery::DESIGN_CAPACITY),
                procedure_count: image.u16_at(battery::PROCEDURE_COUNT),
                max_procedures: image.u16_at(battery::MAX_PROCEDURES),
            }),
            DeviceClass::Clamshell => DeviceData::Clamshell(ClamshellData {
                used: image.u8_at(clamshell::USED) != 0,
                procedure_count: image.u16_at(clamshell::PROCEDURE_COUNT),
            }),
            DeviceClass::Adapter => DeviceData::Adapter(AdapterData {
                procedure_count: image.u16_at(adapter::PROCEDURE_COUNT),
                max_procedures: image.u16_at(adapter::MAX_PROCEDURES),
                firing_count: image.u32_at(adapter::FIRING_COUNT),
                strain_gauge_offset: image.i16_at(adapter::STRAIN_GAUGE_OFFSET),
                strain_gauge_gain: image.u16_at(adapter::STRAIN_GAUGE_GAIN),
            }),
            DeviceClass::Reload => DeviceData::Reload(ReloadData {
                length_mm: image.u8_at(reload::LENGTH_MM),
                staple_height: image.u8_at(reload::STAPLE_HEIGHT),
                color: image.u8_at(reload::COLOR),
                fired: image.u8_at(reload::FIRED) != 0,
                max_clamp_force: image.u16_at(reload::MAX_CLAMP_FORCE),
                fire_turns_x100: image.u16_at(reload::FIRE_TURNS_X100),
            }),
            DeviceClass::Cartridge => DeviceData::Cartridge(CartridgeData {
                color: image.u8_at(cartridge::COLOR),
                length_mm: image.u8_at(cartridge::LENGTH_MM),
                fired: image.u8_at(cartridge::FIRED) != 0,
                max_force: image.u16_at(cartridge::MAX_FORCE),
            }),
        }
    }

    /// Write the class fields into `image`
    ///
    /// Header, padding, write-test counter and trailer are left untouched.
    pub fn encode(&self, image: &mut MemoryImage) {
        match self {
            DeviceData::Handle(data) => {
                image.set_u32_at(handle::FIRING_COUNT, data.firing_count);
                image.set_u16_at(handle::PROCEDURE_COUNT, data.procedure_count);
                image.set_u16_at(handle::MAX_PROCEDURES, data.max_procedures);
                image.0[handle::SERIAL..handle::END].copy_from_slice(&data.serial);
            }
            DeviceData::Battery(data) => {
                image.set_u16_at(battery::CHARGE_CYCLES, data.charge_cycles);
                image.set_u16_at(battery::DESIGN_CAPACITY, data.design_capacity_mah);
                image.set_u16_at(battery::PROCEDURE_COUNT, data.procedure_count);
                image.set_u16_at(battery::MAX_PROCEDURES, data.max_procedures);
            }
            DeviceData::Clamshell(data) => {
                image.set_u8_at(clamshell::USED, data.used as u8);
                image.set_u16_at(clamshell::PROCEDURE_COUNT, data.procedure_count);
            }
            DeviceData::Adapter(data) => {
                image.set_u16_at(adapter::PROCEDURE_COUNT, data.procedure_count);
                image.set_u16_at(adapter::MAX_PROCEDURES, data.max_procedures);
                image.set_u32_at(adapter::FIRING_COUNT, data.firing_count);
                image.set_i16_at(adapter::STRAIN_GAUGE_OFFSET, data.strain_gauge_offset);
                image.set_u16_at(adapter::STRAIN_GAUGE_GAIN, data.strain_gauge_gain);
            }
            DeviceData::Reload(data) => {
                image.set_u8_at(reload::LENGTH_MM, data.length_mm);
                image.set_u8_at(reload::STAPLE_HEIGHT, data.staple_height);
                image.set_u8_at(reload::COLOR, data.color);
                image.set_u8_at(reload::FIRED, data.fired as u8);
                image.set_u16_at(reload::MAX_CLAMP_FORCE, data.max_clamp_force);
                image.set_u16_at(reload::FIRE_TURNS_X100, data.fire_turns_x100);
            }
            DeviceData::Cartridge(data) => {
                image.set_u8_at(cartridge::COLOR, data.color);
                image.set_u8_at(cartridge::LENGTH_MM, data.length_mm);
                image.set_u8_at(cartridge::FIRED, data.fired as u8);
                image.set_u16_at(cartridge::MAX_FORCE, data.max_force);
            }
        }
    }
}
