//! EEPROM page codec
//!
//! Reads, writes and erases the two-page accessory record through a
//! [`OneWireTransport`]. Page transfers are protected by the device's
//! append-CRC; whole records by the CRC16 trailer.

use super::{MemoryImage, PAGE_COUNT, PAGE_SIZE, WRITE_TEST_OFFSET};
use crate::crc::page_crc_ok;
use crate::onewire::{DeviceId, OneWireError, Packet};
use crate::traits::OneWireTransport;

/// Read Memory command: `[CMD, page]`, response is 32 data bytes + CRC
pub const CMD_READ_PAGE: u8 = 0xF0;

/// Write Memory command: `[CMD, page, data...]`, response is the CRC echo
pub const CMD_WRITE_PAGE: u8 = 0x55;

/// Release byte that commits a page write
pub const CMD_RELEASE: u8 = 0xAA;

/// Result byte returned after a committed write
pub const WRITE_SUCCESS: u8 = 0xAA;

/// Programming time held after the release byte
pub const PROGRAM_DELAY_MS: u16 = 10;

/// Default number of attempts for a timed-out transfer
pub const DEFAULT_ATTEMPTS: u8 = 3;

/// Accessory record codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eeprom {
    attempts: u8,
}

impl Default for Eeprom {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS)
    }
}

impl Eeprom {
    /// Create a codec retrying timed-out transfers up to `attempts` times
    pub fn new(attempts: u8) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    /// Read and validate the whole record
    ///
    /// Both pages are always requested; the first failure is reported.
    pub fn read<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
    ) -> Result<MemoryImage, OneWireError> {
        let image = self.read_pages(bus, id)?;
        if !image.crc_valid() {
            warn!(
                "record CRC mismatch on {:?}: stored {=u16:#x}, computed {=u16:#x}",
                id,
                image.stored_crc(),
                image.computed_crc()
            );
            return Err(OneWireError::DataCrcFail);
        }
        Ok(image)
    }

    /// Write the whole record
    ///
    /// The trailer is recomputed before transmission; whatever CRC the caller
    /// left in `image` is overwritten.
    pub fn write<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
        image: &mut MemoryImage,
    ) -> Result<(), OneWireError> {
        image.seal();
        let first = self.write_page(bus, id, 0, &image.page(0));
        let second = self.write_page(bus, id, 1, &image.page(1));
        first?;
        second
    }

    /// Fill both pages with 0xFF
    ///
    /// Stops after the first page if it fails.
    pub fn erase<T: OneWireTransport>(&self, bus: &mut T, id: DeviceId) -> Result<(), OneWireError> {
        let blank = [0xFFu8; PAGE_SIZE];
        for page in 0..PAGE_COUNT {
            self.write_page(bus, id, page as u8, &blank)?;
        }
        Ok(())
    }

    /// Prove the device is writable
    ///
    /// Increments the write-test counter in the second page, writes that page
    /// back and re-reads it. Returns the new counter value.
    pub fn write_test<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
    ) -> Result<u8, OneWireError> {
        let mut image = self
            .read_pages(bus, id)
            .map_err(|_| OneWireError::ReadError)?;

        let expected = image.write_test_counter().wrapping_add(1);
        image.set_write_test_counter(expected);
        image.seal();

        self.write_page(bus, id, 1, &image.page(1))
            .map_err(|_| OneWireError::WriteError)?;

        let readback = self
            .read_page(bus, id, 1)
            .map_err(|_| OneWireError::ReadError)?;
        let stored = readback[WRITE_TEST_OFFSET - PAGE_SIZE];
        if stored != expected {
            warn!(
                "write test on {:?}: expected counter {}, read {}",
                id, expected, stored
            );
            return Err(OneWireError::NvmTestError);
        }

        Ok(expected)
    }

    /// Read both pages without checking the record trailer
    fn read_pages<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
    ) -> Result<MemoryImage, OneWireError> {
        let first = self.read_page(bus, id, 0);
        let second = self.read_page(bus, id, 1);
        Ok(MemoryImage::from_pages(&first?, &second?))
    }

    /// Read one page and check its transfer CRC
    pub fn read_page<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
        page: u8,
    ) -> Result<[u8; PAGE_SIZE], OneWireError> {
        let command = [CMD_READ_PAGE, page];
        let mut response = [0u8; PAGE_SIZE + 2];
        self.transfer(bus, id, &mut [Packet::new(&command, &mut response)])?;

        let mut data = [0u8; PAGE_SIZE];
        data.copy_from_slice(&response[..PAGE_SIZE]);
        if !page_crc_ok(&data, [response[PAGE_SIZE], response[PAGE_SIZE + 1]]) {
            warn!("page {} transfer CRC failed on {:?}", page, id);
            return Err(OneWireError::CrcFail);
        }
        Ok(data)
    }

    /// Write one page and commit it
    pub fn write_page<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
        page: u8,
        data: &[u8; PAGE_SIZE],
    ) -> Result<(), OneWireError> {
        let mut command = [0u8; PAGE_SIZE + 2];
        command[0] = CMD_WRITE_PAGE;
        command[1] = page;
        command[2..].copy_from_slice(data);

        let release = [CMD_RELEASE];
        let mut echo = [0u8; 2];
        let mut result = [0u8; 1];
        self.transfer(
            bus,
            id,
            &mut [
                Packet::new(&command, &mut echo),
                Packet::new(&release, &mut result).with_program_delay(PROGRAM_DELAY_MS),
            ],
        )?;

        if !page_crc_ok(data, echo) {
            warn!("page {} write echo CRC failed on {:?}", page, id);
            return Err(OneWireError::CrcFail);
        }
        if result[0] != WRITE_SUCCESS {
            warn!(
                "page {} write refused by {:?} (status {=u8:#x})",
                page, id, result[0]
            );
            return Err(OneWireError::AccessDenied);
        }
        Ok(())
    }

    /// Run a transfer, retrying only on timeout
    fn transfer<T: OneWireTransport>(
        &self,
        bus: &mut T,
        id: DeviceId,
        packets: &mut [Packet<'_>],
    ) -> Result<(), OneWireError> {
        let mut attempt = 1;
        loop {
            match bus.transfer(id, packets) {
                Err(OneWireError::Timeout) if attempt < self.attempts => {
                    debug!("transfer to {:?} timed out, attempt {}", id, attempt);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
