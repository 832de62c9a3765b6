//! Cross-context signaling flag
//!
//! A [`Flag`] is a signed counter shared between interrupt handlers and the
//! scheduler loop. It is used two ways:
//!
//! - as a readiness gate: any nonzero value means "ready", the consumer
//!   calls [`Flag::decrement`] when it starts using the resource and the
//!   completion interrupt calls [`Flag::signal`] when it is free again
//! - as an element count: the buffer layer [`Flag::add`]s what it stores and
//!   [`Flag::sub_saturating`]s what it removes, clamping at zero
//!
//! Nothing ever blocks on a flag. Every mutation happens inside a critical
//! section so a reader never sees a torn value. The `*_in` variants take
//! the token of a critical section the caller already holds.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

/// Critical-section guarded signed counter
pub struct Flag {
    value: Mutex<Cell<i32>>,
}

impl Flag {
    /// Create a flag with an initial value
    pub const fn new(value: i32) -> Self {
        Self {
            value: Mutex::new(Cell::new(value)),
        }
    }

    /// Set the counter to `value`
    pub fn init(&self, value: i32) {
        critical_section::with(|cs| self.init_in(cs, value));
    }

    pub fn init_in(&self, cs: CriticalSection<'_>, value: i32) {
        self.value.borrow(cs).set(value);
    }

    /// Increment by one
    pub fn signal(&self) {
        critical_section::with(|cs| self.signal_in(cs));
    }

    pub fn signal_in(&self, cs: CriticalSection<'_>) {
        let cell = self.value.borrow(cs);
        cell.set(cell.get().saturating_add(1));
    }

    /// Decrement by one
    ///
    /// Never blocks. A caller that conceptually waits on the flag must
    /// instead only be scheduled while it is set.
    pub fn decrement(&self) {
        critical_section::with(|cs| self.decrement_in(cs));
    }

    pub fn decrement_in(&self, cs: CriticalSection<'_>) {
        let cell = self.value.borrow(cs);
        cell.set(cell.get().saturating_sub(1));
    }

    /// Add `n` stored elements
    pub fn add(&self, n: u16) {
        critical_section::with(|cs| self.add_in(cs, n));
    }

    pub fn add_in(&self, cs: CriticalSection<'_>, n: u16) {
        let cell = self.value.borrow(cs);
        cell.set(cell.get().saturating_add(i32::from(n)));
    }

    /// Remove `n` stored elements, clamping at zero
    ///
    /// Removing more than was ever added is a caller bug. It is recovered
    /// silently instead of underflowing.
    pub fn sub_saturating(&self, n: u16) {
        critical_section::with(|cs| self.sub_saturating_in(cs, n));
    }

    pub fn sub_saturating_in(&self, cs: CriticalSection<'_>, n: u16) {
        let cell = self.value.borrow(cs);
        let next = cell.get().saturating_sub(i32::from(n));
        cell.set(next.max(0));
    }

    /// Current value
    pub fn value(&self) -> i32 {
        critical_section::with(|cs| self.value_in(cs))
    }

    pub fn value_in(&self, cs: CriticalSection<'_>) -> i32 {
        self.value.borrow(cs).get()
    }

    /// Whether the flag is set (any nonzero value)
    pub fn is_set(&self) -> bool {
        critical_section::with(|cs| self.is_set_in(cs))
    }

    pub fn is_set_in(&self, cs: CriticalSection<'_>) -> bool {
        self.value_in(cs) != 0
    }
}

impl core::fmt::Debug for Flag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Flag").field("value", &self.value()).finish()
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::new(0)
    }
}
