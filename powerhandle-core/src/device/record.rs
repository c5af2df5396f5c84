//! Device record snapshot

use super::{DeviceClass, DeviceState, FaultCode};
use crate::onewire::{DeviceId, OneWireError};

/// Per-class connection record
///
/// `present` and `unique_id` follow the transport; `state` and the
/// diagnostic flags are owned by the device manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceRecord {
    pub class: DeviceClass,
    pub present: bool,
    /// Raw type code from the last record read
    pub device_type: u16,
    pub unique_id: DeviceId,
    pub state: DeviceState,
    pub authentic: bool,
    pub writable: bool,
    pub crc_fail: bool,
    pub unsupported: bool,
    /// Last transport error seen while authenticating
    pub last_error: Option<OneWireError>,
    /// Last fault raised for this record
    pub fault: Option<FaultCode>,
    pub(crate) short_pending: bool,
}

impl DeviceRecord {
    pub const fn new(class: DeviceClass) -> Self {
        Self {
            class,
            present: false,
            device_type: 0,
            unique_id: DeviceId::INVALID,
            state: DeviceState::NoDevice,
            authentic: false,
            writable: false,
            crc_fail: false,
            unsupported: false,
            last_error: None,
            fault: None,
            short_pending: false,
        }
    }

    /// Clear the flags set during authentication
    pub(crate) fn reset_diagnostics(&mut self) {
        self.device_type = 0;
        self.authentic = false;
        self.writable = false;
        self.crc_fail = false;
        self.unsupported = false;
        self.last_error = None;
        self.fault = None;
    }
}
