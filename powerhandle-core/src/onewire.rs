//! One-wire transport types
//!
//! The bus master itself (discovery, ROM addressing, timing) is provided by
//! the board. This module defines what the rest of the firmware exchanges
//! with it: device ids, bus identifiers, discovery events, transfer packets
//! and the shared error taxonomy.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of family codes in a discovery filter
pub const MAX_FAMILY_FILTER: usize = 4;

/// 64-bit one-wire ROM id
///
/// Byte 0 (least significant) is the family code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Sentinel for "no device"
    pub const INVALID: Self = Self(0);

    /// Family code (lowest ROM byte)
    pub const fn family(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Check whether this id refers to a device
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Physical one-wire buses on the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OneWireBus {
    /// Handle main board chip
    Handle,
    /// Battery pack contact
    Battery,
    /// Sterile clamshell contact
    Clamshell,
    /// Adapter coupling
    Adapter,
    /// Adapter distal connector (reloads and cartridges)
    Connector,
}

/// Transport and integrity errors
///
/// The discriminants are stable: they are written into security log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OneWireError {
    /// No response within the transaction timeout
    Timeout = 1,
    /// Read transaction failed
    ReadError = 2,
    /// Write transaction failed
    WriteError = 3,
    /// Bus level error (no presence pulse, framing)
    BusError = 4,
    /// Bus held low
    BusShort = 5,
    /// Authentication challenge failed
    AuthError = 6,
    /// Invalid request parameters
    ParamError = 7,
    /// Page transfer CRC did not fold to the residue
    CrcFail = 8,
    /// Whole-record CRC trailer mismatch
    DataCrcFail = 9,
    /// Device refused the write (protected or requires authentication)
    AccessDenied = 10,
    /// Write self-test counter did not advance
    NvmTestError = 11,
}

impl OneWireError {
    /// Stable numeric code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a stable numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        use OneWireError::*;
        let error = match code {
            1 => Timeout,
            2 => ReadError,
            3 => WriteError,
            4 => BusError,
            5 => BusShort,
            6 => AuthError,
            7 => ParamError,
            8 => CrcFail,
            9 => DataCrcFail,
            10 => AccessDenied,
            11 => NvmTestError,
            _ => return None,
        };
        Some(error)
    }
}

/// Kind of discovery event reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEventKind {
    /// Device answered a search on the bus
    NewDevice,
    /// Previously seen device no longer answers
    LostDevice,
    /// Bus is shorted
    BusShort,
    /// Bus level error
    BusError,
}

/// Discovery event, posted from the transport's context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportEvent {
    /// What happened
    pub kind: TransportEventKind,
    /// Bus the event was observed on
    pub bus: OneWireBus,
    /// Device concerned (INVALID for bus-wide events)
    pub id: DeviceId,
}

impl TransportEvent {
    /// Device found
    pub fn new_device(bus: OneWireBus, id: DeviceId) -> Self {
        Self {
            kind: TransportEventKind::NewDevice,
            bus,
            id,
        }
    }

    /// Device lost
    pub fn lost_device(bus: OneWireBus, id: DeviceId) -> Self {
        Self {
            kind: TransportEventKind::LostDevice,
            bus,
            id,
        }
    }

    /// Bus short
    pub fn bus_short(bus: OneWireBus) -> Self {
        Self {
            kind: TransportEventKind::BusShort,
            bus,
            id: DeviceId::INVALID,
        }
    }
}

/// Discovery parameters handed to the transport at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscoveryParams {
    /// Devices expected per bus before the search backs off
    pub device_count_threshold: u8,
    /// Interval between searches in ms
    pub scan_interval_ms: u16,
    /// Keep polling known devices between searches
    pub keep_alive: bool,
    /// Family codes to report (empty = all)
    pub family_filter: Vec<u8, MAX_FAMILY_FILTER>,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            device_count_threshold: 2,
            scan_interval_ms: 50,
            keep_alive: true,
            family_filter: Vec::new(),
        }
    }
}

/// One request/response exchange inside a transfer frame
///
/// The transport writes `tx`, then reads `rx.len()` bytes into `rx`, then
/// holds the strong pull-up for `program_delay_ms` before the next packet.
#[derive(Debug)]
pub struct Packet<'a> {
    /// Bytes to send
    pub tx: &'a [u8],
    /// Response buffer; its length is the expected response size
    pub rx: &'a mut [u8],
    /// EEPROM programming delay after this packet
    pub program_delay_ms: u16,
}

impl<'a> Packet<'a> {
    /// Create a packet with no programming delay
    pub fn new(tx: &'a [u8], rx: &'a mut [u8]) -> Self {
        Self {
            tx,
            rx,
            program_delay_ms: 0,
        }
    }

    /// Hold the bus powered for `ms` after this packet
    pub fn with_program_delay(mut self, ms: u16) -> Self {
        self.program_delay_ms = ms;
        self
    }
}
