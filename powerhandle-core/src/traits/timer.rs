//! Periodic wake-up for polling tasks

use core::future::Future;

/// Bounded wait used by the device manager task
///
/// The task re-runs its sweep every time this future completes, even when no
/// transport event arrived, so a dropped event is picked up on the next
/// presence poll. Firmware implements it with a timer; tests use a future
/// that is immediately ready.
pub trait SweepTimer {
    /// Wait up to `interval_ms` for the next sweep
    fn wait(&mut self, interval_ms: u32) -> impl Future<Output = ()>;
}
