//! Accessory EEPROM records
//!
//! Every accessory carries a 64-byte record stored as two 32-byte pages:
//!
//! ```text
//! offset  0      1..3         3..61            61        62..64
//!        ┌──────┬────────────┬────────────────┬─────────┬─────────┐
//!        │ ver  │ device type│ class fields + │ write   │ CRC16   │
//!        │ 1B   │ 2B LE      │ padding        │ test 1B │ 2B LE   │
//!        └──────┴────────────┴────────────────┴─────────┴─────────┘
//! ```
//!
//! The trailer is CRC-16/ARC over bytes `[0, 62)`.

pub mod codec;

pub use codec::Eeprom;

use crate::crc::crc16;

/// Bytes per physical page
pub const PAGE_SIZE: usize = 32;

/// Pages per record
pub const PAGE_COUNT: usize = 2;

/// Bytes per logical record
pub const RECORD_SIZE: usize = PAGE_SIZE * PAGE_COUNT;

/// Offset of the data version byte
pub const VERSION_OFFSET: usize = 0;

/// Offset of the little-endian device type
pub const DEVICE_TYPE_OFFSET: usize = 1;

/// First byte available to class-specific fields
pub const CLASS_FIELDS_OFFSET: usize = 3;

/// Offset of the write-test counter
pub const WRITE_TEST_OFFSET: usize = 61;

/// Offset of the little-endian CRC16 trailer
pub const CRC_OFFSET: usize = 62;

/// Current record layout version
pub const DATA_VERSION: u8 = 1;

/// Raw 64-byte accessory record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryImage(pub [u8; RECORD_SIZE]);

impl Default for MemoryImage {
    fn default() -> Self {
        Self([0; RECORD_SIZE])
    }
}

impl MemoryImage {
    /// Assemble a record from its two pages
    pub fn from_pages(first: &[u8; PAGE_SIZE], second: &[u8; PAGE_SIZE]) -> Self {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..PAGE_SIZE].copy_from_slice(first);
        bytes[PAGE_SIZE..].copy_from_slice(second);
        Self(bytes)
    }

    /// Copy out one page (0 or 1)
    pub fn page(&self, page: usize) -> [u8; PAGE_SIZE] {
        let start = page * PAGE_SIZE;
        let mut out = [0u8; PAGE_SIZE];
        out.copy_from_slice(&self.0[start..start + PAGE_SIZE]);
        out
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; RECORD_SIZE] {
        &self.0
    }

    /// Layout version byte
    pub fn version(&self) -> u8 {
        self.0[VERSION_OFFSET]
    }

    /// Raw device type code
    pub fn device_type(&self) -> u16 {
        self.u16_at(DEVICE_TYPE_OFFSET)
    }

    /// Set the raw device type code
    pub fn set_device_type(&mut self, device_type: u16) {
        self.set_u16_at(DEVICE_TYPE_OFFSET, device_type);
    }

    /// Write-test counter
    pub fn write_test_counter(&self) -> u8 {
        self.0[WRITE_TEST_OFFSET]
    }

    /// Set the write-test counter (the trailer is not updated)
    pub fn set_write_test_counter(&mut self, counter: u8) {
        self.0[WRITE_TEST_OFFSET] = counter;
    }

    /// CRC stored in the trailer
    pub fn stored_crc(&self) -> u16 {
        self.u16_at(CRC_OFFSET)
    }

    /// CRC computed over the covered bytes
    pub fn computed_crc(&self) -> u16 {
        crc16(0, &self.0[..CRC_OFFSET])
    }

    /// Check the trailer against the covered bytes
    pub fn crc_valid(&self) -> bool {
        self.stored_crc() == self.computed_crc()
    }

    /// Recompute and store the trailer
    pub fn seal(&mut self) {
        let crc = self.computed_crc();
        self.set_u16_at(CRC_OFFSET, crc);
    }

    /// Read a byte
    pub fn u8_at(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    /// Write a byte
    pub fn set_u8_at(&mut self, offset: usize, value: u8) {
        self.0[offset] = value;
    }

    /// Read a little-endian u16
    pub fn u16_at(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.0[offset], self.0[offset + 1]])
    }

    /// Write a little-endian u16
    pub fn set_u16_at(&mut self, offset: usize, value: u16) {
        self.0[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a little-endian i16
    pub fn i16_at(&self, offset: usize) -> i16 {
        self.u16_at(offset) as i16
    }

    /// Write a little-endian i16
    pub fn set_i16_at(&mut self, offset: usize, value: i16) {
        self.set_u16_at(offset, value as u16);
    }

    /// Read a little-endian u32
    pub fn u32_at(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.0[offset..offset + 4]);
        u32::from_le_bytes(bytes)
    }

    /// Write a little-endian u32
    pub fn set_u32_at(&mut self, offset: usize, value: u32) {
        self.0[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}
