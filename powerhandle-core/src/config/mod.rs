//! Configuration types
//!
//! Board-agnostic configuration structures. With the `serde` feature they
//! persist as postcard binary data behind a version byte.

pub mod device;
#[cfg(feature = "serde")]
pub mod persist;
pub mod servo;

pub use device::*;
#[cfg(feature = "serde")]
pub use persist::*;
pub use servo::*;
