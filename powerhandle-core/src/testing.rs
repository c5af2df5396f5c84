//! Host-side test doubles
//!
//! `SimTransport` simulates the one-wire bus master and the EEPROM command
//! set of every device on it, with per-device fault injection.

use heapless::Vec;

use crate::crc::append_crc;
use crate::device::{DeviceClass, FaultCode, FaultSink};
use crate::eeprom::codec::{CMD_READ_PAGE, CMD_RELEASE, CMD_WRITE_PAGE, WRITE_SUCCESS};
use crate::eeprom::{MemoryImage, DATA_VERSION, PAGE_COUNT, PAGE_SIZE};
use crate::onewire::{DeviceId, DiscoveryParams, OneWireBus, OneWireError, Packet};
use crate::security::{SecurityEvent, SecurityLog};
use crate::traits::{OneWireTransport, SweepTimer};

/// A current-version record of `device_type` with a valid trailer
pub fn sealed_image(device_type: u16) -> MemoryImage {
    let mut image = MemoryImage::default();
    image.set_u8_at(0, DATA_VERSION);
    image.set_device_type(device_type);
    image.seal();
    image
}

/// One simulated one-wire EEPROM device
#[derive(Debug, Clone)]
pub struct SimDevice {
    pub id: DeviceId,
    pub image: MemoryImage,
    /// Passes the authentication challenge
    pub authentic: bool,
    /// Refuses page commits (result byte is not the success sentinel)
    pub write_protected: bool,
    /// Reports commits as successful but keeps the old contents
    pub ignore_writes: bool,
    /// Corrupts the CRC appended to page reads
    pub corrupt_page_crc: bool,
    /// Number of upcoming transfers that time out
    pub timeouts: u8,
}

impl SimDevice {
    pub fn new(id: DeviceId, image: MemoryImage) -> Self {
        Self {
            id,
            image,
            authentic: true,
            write_protected: false,
            ignore_writes: false,
            corrupt_page_crc: false,
            timeouts: 0,
        }
    }

    fn exchange(&mut self, packets: &mut [Packet<'_>]) -> Result<(), OneWireError> {
        let mut pending: Option<(usize, [u8; PAGE_SIZE])> = None;

        for packet in packets.iter_mut() {
            match packet.tx.first().copied() {
                Some(CMD_READ_PAGE) => {
                    let page = page_index(packet.tx)?;
                    let data = self.image.page(page);
                    let mut crc = append_crc(&data);
                    if self.corrupt_page_crc {
                        crc[0] ^= 0xFF;
                    }
                    packet.rx[..PAGE_SIZE].copy_from_slice(&data);
                    packet.rx[PAGE_SIZE..PAGE_SIZE + 2].copy_from_slice(&crc);
                }
                Some(CMD_WRITE_PAGE) => {
                    let page = page_index(packet.tx)?;
                    let mut data = [0u8; PAGE_SIZE];
                    data.copy_from_slice(&packet.tx[2..2 + PAGE_SIZE]);
                    packet.rx[..2].copy_from_slice(&append_crc(&data));
                    pending = Some((page, data));
                }
                Some(CMD_RELEASE) => {
                    packet.rx[0] = match pending.take() {
                        Some(_) if self.write_protected => 0x00,
                        Some((page, data)) => {
                            if !self.ignore_writes {
                                let start = page * PAGE_SIZE;
                                self.image.0[start..start + PAGE_SIZE].copy_from_slice(&data);
                            }
                            WRITE_SUCCESS
                        }
                        None => 0x00,
                    };
                }
                _ => return Err(OneWireError::ParamError),
            }
        }
        Ok(())
    }
}

fn page_index(tx: &[u8]) -> Result<usize, OneWireError> {
    match tx.get(1) {
        Some(&page) if (page as usize) < PAGE_COUNT => Ok(page as usize),
        _ => Err(OneWireError::ParamError),
    }
}

/// Simulated bus master with any number of devices attached
#[derive(Debug, Default)]
pub struct SimTransport {
    devices: Vec<SimDevice, 8>,
    /// Transfer calls, including failed ones
    pub transfers: u32,
    /// Authentication calls
    pub authentications: u32,
    /// Buses discovery was started on
    pub discovered: Vec<OneWireBus, 8>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: SimDevice) {
        self.remove(device.id);
        self.devices.push(device).expect("too many simulated devices");
    }

    pub fn remove(&mut self, id: DeviceId) {
        self.devices.retain(|device| device.id != id);
    }

    pub fn device(&self, id: DeviceId) -> Option<&SimDevice> {
        self.devices.iter().find(|device| device.id == id)
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut SimDevice> {
        self.devices.iter_mut().find(|device| device.id == id)
    }
}

impl OneWireTransport for SimTransport {
    fn discover(&mut self, bus: OneWireBus, _params: &DiscoveryParams) -> Result<(), OneWireError> {
        self.discovered.push(bus).map_err(|_| OneWireError::ParamError)
    }

    fn authenticate(&mut self, id: DeviceId) -> Result<(), OneWireError> {
        self.authentications += 1;
        match self.device(id) {
            Some(device) if device.authentic => Ok(()),
            Some(_) => Err(OneWireError::AuthError),
            None => Err(OneWireError::BusError),
        }
    }

    fn transfer(&mut self, id: DeviceId, packets: &mut [Packet<'_>]) -> Result<(), OneWireError> {
        self.transfers += 1;
        let device = self.device_mut(id).ok_or(OneWireError::BusError)?;
        if device.timeouts > 0 {
            device.timeouts -= 1;
            return Err(OneWireError::Timeout);
        }
        device.exchange(packets)
    }
}

/// Fault sink that remembers every fault
#[derive(Debug, Default)]
pub struct RecordingFaults {
    pub raised: Vec<(DeviceClass, FaultCode), 16>,
}

impl FaultSink for RecordingFaults {
    fn raise(&mut self, class: DeviceClass, fault: FaultCode) {
        let _ = self.raised.push((class, fault));
    }
}

/// Security log that remembers every event
#[derive(Debug, Default)]
pub struct RecordingSecurityLog {
    pub events: Vec<SecurityEvent, 16>,
}

impl SecurityLog for RecordingSecurityLog {
    fn record(&mut self, event: SecurityEvent) {
        let _ = self.events.push(event);
    }
}

/// Sweep timer that is always due
#[derive(Debug, Default)]
pub struct ImmediateTimer {
    pub waits: u32,
    /// Interval passed to the last wait
    pub last_interval_ms: Option<u32>,
}

impl SweepTimer for ImmediateTimer {
    async fn wait(&mut self, interval_ms: u32) {
        self.waits += 1;
        self.last_interval_ms = Some(interval_ms);
    }
}
