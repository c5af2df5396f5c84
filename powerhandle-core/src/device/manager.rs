//! Device manager
//!
//! Owns one [`DeviceRecord`] and one [`DeviceAdapter`] per class. Transport
//! events only update presence, except that a new id on an occupied record
//! drops the old device first. Every other state change happens in [`sweep`],
//! which visits classes in [`DeviceClass::SWEEP_ORDER`] and stops after the
//! Handle if no Handle is connected.
//!
//! [`sweep`]: DeviceManager::sweep

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Deque;

use super::{
    map_fault, DeviceAdapter, DeviceClass, DeviceData, DeviceInput, DeviceRecord, DeviceState,
    DeviceType, FaultCode, FaultSink, FaultTrigger, RequestQueue,
};
use crate::config::DeviceManagerConfig;
use crate::eeprom::Eeprom;
use crate::onewire::{DeviceId, OneWireError, TransportEvent, TransportEventKind};
use crate::security::{SecurityEvent, SecurityLog};
use crate::traits::{OneWireTransport, SweepTimer};

/// Depth of the typed notice queue
pub const NOTICE_DEPTH: usize = 8;

/// Events published to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceEvent {
    /// A device finished authentication (successfully or not)
    NewDevice,
    /// A device was removed
    LostDevice,
}

/// Application callback for device events
pub type DeviceHandler = fn(DeviceEvent, DeviceId);

/// Typed notice for the application's internal messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceNotice {
    pub event: DeviceEvent,
    pub class: DeviceClass,
    pub id: DeviceId,
    /// Record state once the event was decided
    pub state: DeviceState,
}

/// Armed state reported to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmedState {
    Disarmed,
    ClamshellArmed,
    AdapterArmed,
    ReloadArmed,
    CartridgeArmed,
}

/// Device manager API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceManagerError {
    /// A handler is already registered
    HandlerAlreadyRegistered,
    /// The record is not Active
    NotActive,
    /// Data does not belong to the requested class
    ClassMismatch,
    /// Device I/O failed; the fault has been raised
    Fault(FaultCode),
}

/// Accessory device manager
pub struct DeviceManager<T, S, F> {
    config: DeviceManagerConfig,
    eeprom: Eeprom,
    transport: T,
    security: S,
    faults: F,
    records: [DeviceRecord; DeviceClass::COUNT],
    adapters: [DeviceAdapter; DeviceClass::COUNT],
    handler: Option<DeviceHandler>,
    notices: Deque<DeviceNotice, NOTICE_DEPTH>,
}

impl<T: OneWireTransport, S: SecurityLog, F: FaultSink> DeviceManager<T, S, F> {
    pub fn new(config: DeviceManagerConfig, transport: T, security: S, faults: F) -> Self {
        Self {
            eeprom: Eeprom::new(config.io_attempts),
            config,
            transport,
            security,
            faults,
            records: DeviceClass::SWEEP_ORDER.map(DeviceRecord::new),
            adapters: DeviceClass::SWEEP_ORDER.map(DeviceAdapter::new),
            handler: None,
            notices: Deque::new(),
        }
    }

    /// Start discovery on every routed bus
    pub fn start_discovery(&mut self) -> Result<(), OneWireError> {
        for bus in self.config.buses() {
            self.transport.discover(bus, &self.config.discovery)?;
            debug!("discovery started on {:?}", bus);
        }
        Ok(())
    }

    /// Register the application callback (once)
    pub fn register_handler(&mut self, handler: DeviceHandler) -> Result<(), DeviceManagerError> {
        if self.handler.is_some() {
            return Err(DeviceManagerError::HandlerAlreadyRegistered);
        }
        self.handler = Some(handler);
        Ok(())
    }

    /// Apply one transport event to the records
    ///
    /// Only presence, ids and pending shorts change here.
    pub fn apply(&mut self, event: TransportEvent) {
        match event.kind {
            TransportEventKind::NewDevice => match self.config.route(event.bus, event.id) {
                Some(class) => {
                    let record = self.records[class.index()];
                    if record.state != DeviceState::NoDevice
                        && record.unique_id.is_valid()
                        && record.unique_id != event.id
                    {
                        self.replace_device(class);
                    }
                    let record = &mut self.records[class.index()];
                    record.present = true;
                    record.unique_id = event.id;
                    trace!("{:?} present: {:?}", class, event.id);
                }
                None => debug!("unrouted device {:?} on {:?}", event.id, event.bus),
            },
            TransportEventKind::LostDevice => match self.config.route(event.bus, event.id) {
                Some(class) => {
                    let record = &mut self.records[class.index()];
                    if record.unique_id.is_valid() && record.unique_id != event.id {
                        debug!("stale loss of {:?} ignored for {:?}", event.id, class);
                        return;
                    }
                    record.present = false;
                    trace!("{:?} absent", class);
                }
                None => debug!("unrouted loss {:?} on {:?}", event.id, event.bus),
            },
            TransportEventKind::BusShort => {
                for class in self.config.classes_on(event.bus) {
                    let record = &mut self.records[class.index()];
                    // Nothing connected, nothing to fault
                    if record.state != DeviceState::NoDevice {
                        record.short_pending = true;
                    }
                }
                warn!("bus short on {:?}", event.bus);
            }
            TransportEventKind::BusError => {
                warn!("bus error on {:?}", event.bus);
            }
        }
    }

    /// Drop the record of a device whose removal was never reported
    ///
    /// The new device starts over from `NoDevice` and must authenticate.
    fn replace_device(&mut self, class: DeviceClass) {
        let idx = class.index();
        let state = self.records[idx].state;
        warn!("{:?} replaced without removal: {:?}", class, self.records[idx].unique_id);

        self.adapters[idx].invalidate();
        self.records[idx].short_pending = false;
        self.records[idx].unsupported = false;
        self.set_state(class, state.transition(DeviceInput::Removed));
        if state.awaits_removal() {
            self.publish(DeviceEvent::LostDevice, class);
        }
    }

    /// Drain the queue, then sweep
    pub fn service<M: RawMutex, const N: usize>(&mut self, queue: &RequestQueue<M, N>) {
        while let Some(event) = queue.try_take() {
            self.apply(event);
        }
        self.sweep();
    }

    /// Wait for an event or the sweep interval, then service
    pub async fn step<M: RawMutex, const N: usize, W: SweepTimer>(
        &mut self,
        queue: &RequestQueue<M, N>,
        timer: &mut W,
    ) {
        let interval_ms = self.config.sweep_interval_ms;
        if let Either::First(event) = select(queue.take(), timer.wait(interval_ms)).await {
            self.apply(event);
        }
        self.service(queue);
    }

    /// Device manager task body
    pub async fn run<M: RawMutex, const N: usize, W: SweepTimer>(
        &mut self,
        queue: &RequestQueue<M, N>,
        timer: &mut W,
    ) {
        loop {
            self.step(queue, timer).await;
        }
    }

    /// Evaluate every record once
    pub fn sweep(&mut self) {
        for class in DeviceClass::SWEEP_ORDER {
            self.process(class);
            if class == DeviceClass::Handle
                && self.records[class.index()].state == DeviceState::NoDevice
            {
                return;
            }
        }
    }

    fn process(&mut self, class: DeviceClass) {
        let idx = class.index();
        let record = self.records[idx];

        if record.short_pending {
            self.enter_short(class);
            return;
        }

        match record.state {
            DeviceState::NoDevice => {
                if record.present {
                    self.set_state(class, record.state.transition(DeviceInput::Present));
                }
            }
            DeviceState::Authenticate => {
                if record.present {
                    let next = self.authenticate(class);
                    self.set_state(class, next);
                    self.publish(DeviceEvent::NewDevice, class);
                } else {
                    self.set_state(class, record.state.transition(DeviceInput::Removed));
                    self.records[idx].unique_id = DeviceId::INVALID;
                }
            }
            DeviceState::Active | DeviceState::Short => {
                if !record.present {
                    self.adapters[idx].invalidate();
                    self.set_state(class, record.state.transition(DeviceInput::Removed));
                    self.publish(DeviceEvent::LostDevice, class);
                }
            }
            DeviceState::Invalid => {
                if !record.present {
                    self.records[idx].unsupported = false;
                    self.set_state(class, record.state.transition(DeviceInput::Removed));
                    self.publish(DeviceEvent::LostDevice, class);
                }
            }
        }
    }

    fn enter_short(&mut self, class: DeviceClass) {
        let idx = class.index();
        let fault = map_fault(class, FaultTrigger::BusShortError);

        self.adapters[idx].invalidate();
        let record = &mut self.records[idx];
        record.short_pending = false;
        record.last_error = Some(OneWireError::BusShort);
        record.fault = Some(fault);
        let next = record.state.transition(DeviceInput::BusShort);
        self.set_state(class, next);

        warn!("{:?} bus short, raising {:?}", class, fault);
        self.faults.raise(class, fault);
    }

    /// Authenticate a present device and return its resulting state
    fn authenticate(&mut self, class: DeviceClass) -> DeviceState {
        let idx = class.index();
        let id = self.records[idx].unique_id;
        self.records[idx].reset_diagnostics();

        let device_type = match self.adapters[idx].read(&self.eeprom, &mut self.transport, id) {
            Ok(device_type) => device_type,
            Err(error) => {
                if error == OneWireError::DataCrcFail {
                    self.records[idx].crc_fail = true;
                }
                return self.reject(class, error, FaultTrigger::from_error(error));
            }
        };
        self.records[idx].device_type = device_type;

        if !DeviceType(device_type).is_supported_for(class) {
            warn!("{:?} type {=u16:#x} not supported", class, device_type);
            self.records[idx].unsupported = true;
            self.adapters[idx].invalidate();
            return DeviceState::Authenticate.transition(DeviceInput::Rejected);
        }

        if let Err(error) = self.transport.authenticate(id) {
            self.records[idx].authentic = false;
            self.security
                .record(SecurityEvent::authentication_failure(class, id, error));
            return self.reject(class, error, FaultTrigger::AuthError);
        }
        self.records[idx].authentic = true;

        match self.eeprom.write_test(&mut self.transport, id) {
            Ok(counter) => {
                self.adapters[idx].note_write_test(counter);
                self.records[idx].writable = true;
                info!("{:?} {:?} authenticated", class, id);
                DeviceState::Authenticate.transition(DeviceInput::Verified)
            }
            Err(error) => self.reject(class, error, FaultTrigger::from_error(error)),
        }
    }

    fn reject(&mut self, class: DeviceClass, error: OneWireError, trigger: FaultTrigger) -> DeviceState {
        let idx = class.index();
        let fault = map_fault(class, trigger);

        self.adapters[idx].invalidate();
        let record = &mut self.records[idx];
        record.last_error = Some(error);
        record.fault = Some(fault);

        warn!("{:?} rejected: {:?}, raising {:?}", class, error, fault);
        self.faults.raise(class, fault);
        DeviceState::Authenticate.transition(DeviceInput::Rejected)
    }

    fn set_state(&mut self, class: DeviceClass, next: DeviceState) {
        let record = &mut self.records[class.index()];
        if record.state != next {
            debug!("{:?}: {:?} -> {:?}", class, record.state, next);
            record.state = next;
        }
    }

    fn publish(&mut self, event: DeviceEvent, class: DeviceClass) {
        let record = &mut self.records[class.index()];
        let notice = DeviceNotice {
            event,
            class,
            id: record.unique_id,
            state: record.state,
        };

        // Anything but a new device needs rediscovery before further access
        if event != DeviceEvent::NewDevice {
            record.unique_id = DeviceId::INVALID;
        }

        if let Some(handler) = self.handler {
            handler(event, notice.id);
        }
        if self.notices.is_full() {
            warn!("device notice queue full, dropping oldest");
            self.notices.pop_front();
        }
        if let Err(notice) = self.notices.push_back(notice) {
            warn!("device notice for {:?} lost", notice.class);
        }
    }

    /// Snapshot of a record
    pub fn device_info(&self, class: DeviceClass) -> DeviceRecord {
        self.records[class.index()]
    }

    /// Cached record data, only while the device is Active
    pub fn data(&self, class: DeviceClass) -> Option<&DeviceData> {
        if self.records[class.index()].state.is_active() {
            self.adapters[class.index()].data()
        } else {
            None
        }
    }

    /// Write new data to an Active device
    pub fn update(&mut self, class: DeviceClass, data: &DeviceData) -> Result<(), DeviceManagerError> {
        if data.class() != class {
            return Err(DeviceManagerError::ClassMismatch);
        }
        let id = self.active_id(class)?;
        match self.adapters[class.index()].update(&self.eeprom, &mut self.transport, id, data) {
            Ok(()) => Ok(()),
            Err(error) => Err(self.io_fault(class, error)),
        }
    }

    /// Blank an Active device's memory
    ///
    /// The record becomes Invalid until the device is removed.
    pub fn erase(&mut self, class: DeviceClass) -> Result<(), DeviceManagerError> {
        let id = self.active_id(class)?;
        let result = self.adapters[class.index()].erase(&self.eeprom, &mut self.transport, id);
        let state = self.records[class.index()].state;
        self.set_state(class, state.transition(DeviceInput::Rejected));
        match result {
            Ok(()) => Ok(()),
            Err(error) => Err(self.io_fault(class, error)),
        }
    }

    fn active_id(&self, class: DeviceClass) -> Result<DeviceId, DeviceManagerError> {
        let record = &self.records[class.index()];
        if record.state.is_active() && record.unique_id.is_valid() {
            Ok(record.unique_id)
        } else {
            Err(DeviceManagerError::NotActive)
        }
    }

    fn io_fault(&mut self, class: DeviceClass, error: OneWireError) -> DeviceManagerError {
        let fault = map_fault(class, FaultTrigger::from_error(error));
        let record = &mut self.records[class.index()];
        record.last_error = Some(error);
        record.fault = Some(fault);
        warn!("{:?} I/O failed: {:?}, raising {:?}", class, error, fault);
        self.faults.raise(class, fault);
        DeviceManagerError::Fault(fault)
    }

    /// Armed state for the application
    ///
    /// Each check overwrites the previous one, so only the last Active class
    /// in the order Clamshell, Adapter, Reload, Cartridge is reported.
    // FIXME: probably meant as a priority or a combined mask; kept as is
    // until the application side confirms which it relies on.
    pub fn state(&self) -> ArmedState {
        let active = |class: DeviceClass| self.records[class.index()].state.is_active();

        let mut state = ArmedState::Disarmed;
        if active(DeviceClass::Clamshell) {
            state = ArmedState::ClamshellArmed;
        }
        if active(DeviceClass::Adapter) {
            state = ArmedState::AdapterArmed;
        }
        if active(DeviceClass::Reload) {
            state = ArmedState::ReloadArmed;
        }
        if active(DeviceClass::Cartridge) {
            state = ArmedState::CartridgeArmed;
        }
        state
    }

    /// Next typed notice, oldest first
    pub fn take_notice(&mut self) -> Option<DeviceNotice> {
        self.notices.pop_front()
    }

    pub fn config(&self) -> &DeviceManagerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn security(&self) -> &S {
        &self.security
    }

    pub fn faults(&self) -> &F {
        &self.faults
    }
}
