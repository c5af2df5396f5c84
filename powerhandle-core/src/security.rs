//! Security event log
//!
//! Authentication failures are recorded separately from the diagnostic log.
//! Records have a fixed 16-byte wire form framed by a CRC32 so the
//! application can append them to persistent storage unchanged:
//!
//! ```text
//! 0      1       2..10        10      11        12..16
//! kind   class   device id LE error   reserved  CRC32 LE over [0, 12)
//! ```

use heapless::Deque;

use crate::crc::crc32;
use crate::device::DeviceClass;
use crate::onewire::{DeviceId, OneWireError};

/// Encoded record length
pub const RECORD_LEN: usize = 16;

const CRC_START: usize = 12;

/// Security-relevant event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityEventKind {
    AuthenticationFailure,
}

impl SecurityEventKind {
    fn code(self) -> u8 {
        match self {
            SecurityEventKind::AuthenticationFailure => 1,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SecurityEventKind::AuthenticationFailure),
            _ => None,
        }
    }
}

/// One security log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityEvent {
    pub kind: SecurityEventKind,
    pub class: DeviceClass,
    pub id: DeviceId,
    pub error: OneWireError,
}

/// Errors decoding a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// CRC32 trailer mismatch
    Crc,
    /// Unknown kind, class or error code
    Invalid,
}

impl SecurityEvent {
    pub fn authentication_failure(class: DeviceClass, id: DeviceId, error: OneWireError) -> Self {
        Self {
            kind: SecurityEventKind::AuthenticationFailure,
            class,
            id,
            error,
        }
    }

    /// Serialize to the 16-byte record form
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[0] = self.kind.code();
        record[1] = self.class.index() as u8;
        record[2..10].copy_from_slice(&self.id.0.to_le_bytes());
        record[10] = self.error.code();
        let crc = crc32(0, &record[..CRC_START]);
        record[CRC_START..].copy_from_slice(&crc.to_le_bytes());
        record
    }

    /// Parse and verify a stored record
    pub fn decode(record: &[u8; RECORD_LEN]) -> Result<Self, RecordError> {
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&record[CRC_START..]);
        if u32::from_le_bytes(crc) != crc32(0, &record[..CRC_START]) {
            return Err(RecordError::Crc);
        }

        let kind = SecurityEventKind::from_code(record[0]).ok_or(RecordError::Invalid)?;
        let class = DeviceClass::SWEEP_ORDER
            .get(record[1] as usize)
            .copied()
            .ok_or(RecordError::Invalid)?;
        let mut id = [0u8; 8];
        id.copy_from_slice(&record[2..10]);
        let error = OneWireError::from_code(record[10]).ok_or(RecordError::Invalid)?;

        Ok(Self {
            kind,
            class,
            id: DeviceId(u64::from_le_bytes(id)),
            error,
        })
    }
}

/// Destination for security events
pub trait SecurityLog {
    fn record(&mut self, event: SecurityEvent);
}

/// Bounded in-RAM security log
///
/// Holds encoded records until the application flushes them. When full the
/// oldest record is discarded and counted.
pub struct SecurityLogBuffer<const N: usize> {
    records: Deque<[u8; RECORD_LEN], N>,
    dropped: u32,
}

impl<const N: usize> SecurityLogBuffer<N> {
    pub const fn new() -> Self {
        Self {
            records: Deque::new(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records lost to overflow since creation
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Remove and return the oldest record
    pub fn pop(&mut self) -> Option<[u8; RECORD_LEN]> {
        self.records.pop_front()
    }

    /// Hand every pending record to `sink`, oldest first
    pub fn drain(&mut self, mut sink: impl FnMut(&[u8; RECORD_LEN])) {
        while let Some(record) = self.records.pop_front() {
            sink(&record);
        }
    }
}

impl<const N: usize> Default for SecurityLogBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SecurityLog for SecurityLogBuffer<N> {
    fn record(&mut self, event: SecurityEvent) {
        warn!("security: {:?}", event);
        if self.records.is_full() {
            self.records.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        let _ = self.records.push_back(event.encode());
    }
}
