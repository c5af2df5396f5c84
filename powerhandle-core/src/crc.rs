//! CRC routines used by the one-wire EEPROM records and the security log
//!
//! - [`crc16`]: CRC-16/ARC (reflected polynomial 0xA001, zero seed), the
//!   checksum 1-Wire EEPROMs append to every page transfer and the checksum
//!   stored in the record trailer.
//! - [`crc32`]: reflected CRC-32 (0xEDB88320) used to frame security log
//!   records.

/// Residue left by running [`crc16`] over page data followed by the inverted
/// CRC bytes a 1-Wire device appends (Maxim append-CRC convention).
pub const PAGE_CRC_RESIDUE: u16 = 0xB001;

const CRC16_POLY: u16 = 0xA001;
const CRC32_POLY: u32 = 0xEDB8_8320;

/// Continue a CRC-16/ARC computation from `seed` over `data`
pub fn crc16(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Bytes a 1-Wire device appends to `data`: the inverted CRC16, LSB first
pub fn append_crc(data: &[u8]) -> [u8; 2] {
    (!crc16(0, data)).to_le_bytes()
}

/// Check a page transfer: data plus the device-appended CRC must fold to
/// [`PAGE_CRC_RESIDUE`].
pub fn page_crc_ok(data: &[u8], appended: [u8; 2]) -> bool {
    crc16(crc16(0, data), &appended) == PAGE_CRC_RESIDUE
}

/// Continue a CRC-32 computation from `seed` over `data`
///
/// Empty input returns the one's complement of `seed` rather than `seed`
/// itself. This breaks chaining over empty chunks and is kept only because
/// stored security records were framed with it; see `DESIGN.md`.
pub fn crc32(seed: u32, data: &[u8]) -> u32 {
    if data.is_empty() {
        return !seed;
    }

    let mut crc = !seed;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ CRC32_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}
