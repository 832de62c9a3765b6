//! Monotonic tick source

use core::cell::Cell;

/// Free-running tick counter
///
/// The counter is expected to wrap at `u32::MAX`. Intervals are always
/// computed with [`TickSource::delta`], which stays correct across the wrap
/// as long as fewer than 2^32 ticks pass between two readings.
pub trait TickSource {
    /// Current tick count
    fn now(&self) -> u32;

    /// Ticks elapsed from `before` to `after`
    fn delta(&self, before: u32, after: u32) -> u32 {
        after.wrapping_sub(before)
    }

    /// Ticks elapsed since `before`
    fn elapsed_since(&self, before: u32) -> u32 {
        self.delta(before, self.now())
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> u32 {
        (**self).now()
    }

    fn delta(&self, before: u32, after: u32) -> u32 {
        (**self).delta(before, after)
    }
}

/// Tick source advanced by hand
///
/// Used to drive the scheduler from host tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: Cell<u32>,
}

impl ManualClock {
    pub const fn new(start: u32) -> Self {
        Self {
            ticks: Cell::new(start),
        }
    }

    pub fn set(&self, ticks: u32) {
        self.ticks.set(ticks);
    }

    /// Advance by `ticks`, wrapping at `u32::MAX`
    pub fn advance(&self, ticks: u32) {
        self.ticks.set(self.ticks.get().wrapping_add(ticks));
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> u32 {
        self.ticks.get()
    }
}
