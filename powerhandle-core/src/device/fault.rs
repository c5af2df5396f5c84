//! Device fault taxonomy
//!
//! Raw one-wire errors never leave the device manager. They are folded into
//! one of five triggers, then mapped through a per-class table to a
//! [`FaultCode`] the safety subsystem understands.

use super::DeviceClass;
use crate::onewire::OneWireError;

/// Transport failure categories that can raise a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultTrigger {
    WriteError,
    ReadError,
    AuthError,
    BusShortError,
    NvmTestError,
}

impl FaultTrigger {
    /// Fold a one-wire error into its trigger category
    pub fn from_error(error: OneWireError) -> Self {
        match error {
            OneWireError::WriteError | OneWireError::AccessDenied => FaultTrigger::WriteError,
            OneWireError::Timeout
            | OneWireError::ReadError
            | OneWireError::CrcFail
            | OneWireError::ParamError
            | OneWireError::BusError => FaultTrigger::ReadError,
            OneWireError::AuthError | OneWireError::DataCrcFail => FaultTrigger::AuthError,
            OneWireError::BusShort => FaultTrigger::BusShortError,
            OneWireError::NvmTestError => FaultTrigger::NvmTestError,
        }
    }
}

/// How the safety subsystem must treat a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    /// Cleared by replacing the accessory
    Recoverable,
    /// Handle unusable until serviced
    Permanent,
}

/// Class-specific fault codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCode {
    HandleEepromWriteFail,
    HandleEepromReadFail,
    HandleAuthFail,
    HandleBusShort,
    HandleNvmTestFail,

    BatteryEepromWriteFail,
    BatteryEepromReadFail,
    BatteryAuthFail,
    BatteryBusShort,
    BatteryNvmTestFail,

    AdapterEepromWriteFail,
    AdapterEepromReadFail,
    AdapterAuthFail,
    AdapterBusShort,
    AdapterNvmTestFail,

    /// Shared by clamshell, reload and cartridge
    OneWireWriteFail,
    OneWireReadFail,
    OneWireAuthFail,
    OneWireBusShort,
    OneWireNvmTestFail,
}

impl FaultCode {
    pub fn severity(self) -> Severity {
        use FaultCode::*;
        match self {
            HandleEepromWriteFail | HandleEepromReadFail | HandleAuthFail | HandleBusShort
            | HandleNvmTestFail => Severity::Permanent,
            BatteryAuthFail => Severity::Permanent,
            _ => Severity::Recoverable,
        }
    }
}

/// Map a failure on `class` to its fault code
pub fn map_fault(class: DeviceClass, trigger: FaultTrigger) -> FaultCode {
    use FaultCode::*;
    use FaultTrigger::*;

    match class {
        DeviceClass::Handle => match trigger {
            WriteError => HandleEepromWriteFail,
            ReadError => HandleEepromReadFail,
            AuthError => HandleAuthFail,
            BusShortError => HandleBusShort,
            NvmTestError => HandleNvmTestFail,
        },
        DeviceClass::Battery => match trigger {
            WriteError => BatteryEepromWriteFail,
            ReadError => BatteryEepromReadFail,
            AuthError => BatteryAuthFail,
            BusShortError => BatteryBusShort,
            NvmTestError => BatteryNvmTestFail,
        },
        DeviceClass::Adapter => match trigger {
            WriteError => AdapterEepromWriteFail,
            ReadError => AdapterEepromReadFail,
            AuthError => AdapterAuthFail,
            BusShortError => AdapterBusShort,
            NvmTestError => AdapterNvmTestFail,
        },
        DeviceClass::Clamshell | DeviceClass::Reload | DeviceClass::Cartridge => match trigger {
            WriteError => OneWireWriteFail,
            ReadError => OneWireReadFail,
            AuthError => OneWireAuthFail,
            BusShortError => OneWireBusShort,
            NvmTestError => OneWireNvmTestFail,
        },
    }
}

/// Receiver of device faults (the safety subsystem)
pub trait FaultSink {
    fn raise(&mut self, class: DeviceClass, fault: FaultCode);
}
