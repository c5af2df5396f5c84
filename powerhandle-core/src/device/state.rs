//! Per-device connection lifecycle

/// Lifecycle state of one device record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Nothing on the bus
    #[default]
    NoDevice,
    /// Present, identity and memory not yet verified
    Authenticate,
    /// Authenticated, record valid and writable
    Active,
    /// Rejected; waits for removal
    Invalid,
    /// Bus shorted; waits for removal
    Short,
}

/// Inputs driving [`DeviceState::transition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceInput {
    /// Transport reports the device present
    Present,
    /// Authentication and write test passed
    Verified,
    /// Authentication, record or write test failed, type unsupported, or
    /// memory erased
    Rejected,
    /// Transport reports the device gone
    Removed,
    /// Bus short observed
    BusShort,
}

impl DeviceState {
    /// Decode a persisted/raw state byte
    ///
    /// Anything unrecognised resets to [`DeviceState::NoDevice`].
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => DeviceState::Authenticate,
            2 => DeviceState::Active,
            3 => DeviceState::Invalid,
            4 => DeviceState::Short,
            _ => DeviceState::NoDevice,
        }
    }

    /// Raw state byte
    pub fn as_raw(self) -> u8 {
        match self {
            DeviceState::NoDevice => 0,
            DeviceState::Authenticate => 1,
            DeviceState::Active => 2,
            DeviceState::Invalid => 3,
            DeviceState::Short => 4,
        }
    }

    /// Process an input and return the next state
    pub fn transition(self, input: DeviceInput) -> Self {
        use DeviceInput::*;
        use DeviceState::*;

        match (self, input) {
            // A short wins from any state
            (_, BusShort) => Short,

            (NoDevice, Present) => Authenticate,

            (Authenticate, Verified) => Active,
            (Authenticate, Rejected) => Invalid,
            (Authenticate, Removed) => NoDevice,

            (Active, Removed) => NoDevice,
            // Memory no longer trusted (erased)
            (Active, Rejected) => Invalid,
            (Invalid, Removed) => NoDevice,
            (Short, Removed) => NoDevice,

            // No transition for this input
            (state, _) => state,
        }
    }

    /// Check whether the record may be used by the application
    pub fn is_active(self) -> bool {
        matches!(self, DeviceState::Active)
    }

    /// Check whether the record waits for the device to be removed
    pub fn awaits_removal(self) -> bool {
        matches!(self, DeviceState::Active | DeviceState::Invalid | DeviceState::Short)
    }
}
