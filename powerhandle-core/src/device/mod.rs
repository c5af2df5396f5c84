//! Accessory device management
//!
//! Up to six detachable one-wire accessories are tracked, one record per
//! [`DeviceClass`]. The [`DeviceManager`] owns the records and their
//! [`DeviceAdapter`]s and runs the connection lifecycle:
//!
//! ```text
//! NoDevice ──present──▶ Authenticate ──verified──▶ Active
//!    ▲                       │                        │
//!    │                    rejected                 removed
//!    │                       ▼                        │
//!    ├────removed──────── Invalid                     │
//!    ├────removed──────── Short ◀──bus short (any)    │
//!    └────────────────────────────────────────────────┘
//! ```

pub mod adapter;
pub mod class;
pub mod fault;
pub mod layout;
pub mod manager;
pub mod queue;
pub mod record;
pub mod state;

pub use adapter::DeviceAdapter;
pub use class::*;
pub use fault::{map_fault, FaultCode, FaultSink, FaultTrigger, Severity};
pub use layout::*;
pub use manager::{ArmedState, DeviceEvent, DeviceHandler, DeviceManager, DeviceManagerError, DeviceNotice};
pub use queue::RequestQueue;
pub use record::DeviceRecord;
pub use state::{DeviceInput, DeviceState};
