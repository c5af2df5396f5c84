//! Per-class device adapters
//!
//! An adapter owns the RAM copy of one accessory's record. The cache is only
//! filled by a CRC-valid read and only changed by a successful update.

use super::{DeviceClass, DeviceData};
use crate::eeprom::{Eeprom, MemoryImage};
use crate::onewire::{DeviceId, OneWireError};
use crate::traits::OneWireTransport;

/// Cached record of one device class
#[derive(Debug, Clone)]
pub struct DeviceAdapter {
    class: DeviceClass,
    image: MemoryImage,
    data: Option<DeviceData>,
}

impl DeviceAdapter {
    pub const fn new(class: DeviceClass) -> Self {
        Self {
            class,
            image: MemoryImage([0; 64]),
            data: None,
        }
    }

    /// Read the record from the device and refresh the cache
    ///
    /// Returns the raw device type code. On error the cache is dropped.
    pub fn read<T: OneWireTransport>(
        &mut self,
        eeprom: &Eeprom,
        bus: &mut T,
        id: DeviceId,
    ) -> Result<u16, OneWireError> {
        self.data = None;
        let image = eeprom.read(bus, id)?;
        self.image = image;
        self.data = Some(DeviceData::decode(self.class, &image));
        Ok(image.device_type())
    }

    /// Write new class fields through to the device
    ///
    /// The cached header and write-test counter are kept; the cache is only
    /// replaced once the device accepted both pages.
    pub fn update<T: OneWireTransport>(
        &mut self,
        eeprom: &Eeprom,
        bus: &mut T,
        id: DeviceId,
        data: &DeviceData,
    ) -> Result<(), OneWireError> {
        if data.class() != self.class || self.data.is_none() {
            return Err(OneWireError::ParamError);
        }

        let mut image = self.image;
        data.encode(&mut image);
        eeprom.write(bus, id, &mut image)?;

        self.image = image;
        self.data = Some(*data);
        Ok(())
    }

    /// Blank the device memory and drop the cache
    pub fn erase<T: OneWireTransport>(
        &mut self,
        eeprom: &Eeprom,
        bus: &mut T,
        id: DeviceId,
    ) -> Result<(), OneWireError> {
        self.invalidate();
        eeprom.erase(bus, id)
    }

    /// Mark the cache stale
    pub fn invalidate(&mut self) {
        self.data = None;
    }

    /// Cached class fields, if the last read succeeded
    pub fn data(&self) -> Option<&DeviceData> {
        self.data.as_ref()
    }

    /// Track the counter the write test left on the device
    pub(crate) fn note_write_test(&mut self, counter: u8) {
        self.image.set_write_test_counter(counter);
        self.image.seal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ReloadData, DEVICE_ID_RELOAD_45MM};
    use crate::testing::{sealed_image, SimDevice, SimTransport};

    const ID: DeviceId = DeviceId(0xA0A0_0000_0000_0017);

    fn reload_bus() -> SimTransport {
        let mut image = sealed_image(DEVICE_ID_RELOAD_45MM);
        DeviceData::Reload(ReloadData {
            length_mm: 45,
            color: 2,
            max_clamp_force: 900,
            ..Default::default()
        })
        .encode(&mut image);
        image.seal();

        let mut bus = SimTransport::new();
        bus.insert(SimDevice::new(ID, image));
        bus
    }

    #[test]
    fn test_read_fills_cache() {
        let mut bus = reload_bus();
        let mut adapter = DeviceAdapter::new(DeviceClass::Reload);

        let device_type = adapter.read(&Eeprom::default(), &mut bus, ID).unwrap();
        assert_eq!(device_type, DEVICE_ID_RELOAD_45MM);
        match adapter.data() {
            Some(DeviceData::Reload(reload)) => {
                assert_eq!(reload.length_mm, 45);
                assert_eq!(reload.max_clamp_force, 900);
            }
            other => panic!("unexpected cache {:?}", other),
        }
    }

    #[test]
    fn test_failed_read_drops_cache() {
        let mut bus = reload_bus();
        let mut adapter = DeviceAdapter::new(DeviceClass::Reload);
        adapter.read(&Eeprom::default(), &mut bus, ID).unwrap();

        bus.device_mut(ID).unwrap().corrupt_page_crc = true;
        assert!(adapter.read(&Eeprom::default(), &mut bus, ID).is_err());
        assert!(adapter.data().is_none());
    }

    #[test]
    fn test_update_writes_through() {
        let mut bus = reload_bus();
        let eeprom = Eeprom::default();
        let mut adapter = DeviceAdapter::new(DeviceClass::Reload);
        adapter.read(&eeprom, &mut bus, ID).unwrap();

        let fired = DeviceData::Reload(ReloadData {
            length_mm: 45,
            color: 2,
            fired: true,
            max_clamp_force: 900,
            ..Default::default()
        });
        adapter.update(&eeprom, &mut bus, ID, &fired).unwrap();
        assert_eq!(adapter.data(), Some(&fired));

        let mut fresh = DeviceAdapter::new(DeviceClass::Reload);
        fresh.read(&eeprom, &mut bus, ID).unwrap();
        assert_eq!(fresh.data(), Some(&fired));
    }

    #[test]
    fn test_failed_update_keeps_cache() {
        let mut bus = reload_bus();
        let eeprom = Eeprom::default();
        let mut adapter = DeviceAdapter::new(DeviceClass::Reload);
        adapter.read(&eeprom, &mut bus, ID).unwrap();
        let cached = *adapter.data().unwrap();

        bus.device_mut(ID).unwrap().write_protected = true;
        let fired = DeviceData::Reload(ReloadData {
            fired: true,
            ..Default::default()
        });
        assert_eq!(
            adapter.update(&eeprom, &mut bus, ID, &fired),
            Err(OneWireError::AccessDenied)
        );
        assert_eq!(adapter.data(), Some(&cached));
    }

    #[test]
    fn test_update_rejects_other_class() {
        let mut bus = reload_bus();
        let eeprom = Eeprom::default();
        let mut adapter = DeviceAdapter::new(DeviceClass::Reload);
        adapter.read(&eeprom, &mut bus, ID).unwrap();

        let wrong = DeviceData::Cartridge(Default::default());
        assert_eq!(
            adapter.update(&eeprom, &mut bus, ID, &wrong),
            Err(OneWireError::ParamError)
        );
    }
}
