//! Event table entries

use critical_section::CriticalSection;

use crate::flag::Flag;
use crate::queue::BufferDescriptor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Periodic task body
///
/// Runs inside the scheduler's critical section with the buffer and the
/// readiness flag it was registered with. It must not block.
pub type TaskFn<'a> = fn(CriticalSection<'_>, &BufferDescriptor<'a>, &Flag);

/// Index of a registered event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventHandle(pub(crate) u8);

impl EventHandle {
    /// Slot in the event table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One event table entry
pub struct Event<'a> {
    pub(crate) task: TaskFn<'a>,
    pub(crate) buffer: &'a BufferDescriptor<'a>,
    pub(crate) ready: &'a Flag,
    pub(crate) interval: u32,
    pub(crate) last: u32,
}

impl<'a> Event<'a> {
    /// Minimum ticks between dispatches
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Tick of the last dispatch (or of registration)
    pub fn last_run(&self) -> u32 {
        self.last
    }

    pub fn buffer(&self) -> &'a BufferDescriptor<'a> {
        self.buffer
    }

    pub fn ready_flag(&self) -> &'a Flag {
        self.ready
    }

    /// Due predicate: interval elapsed, resource ready, data pending
    ///
    /// Flags are read through `cs`, so the answer holds for the rest of that
    /// critical section.
    pub fn is_due_in(&self, cs: CriticalSection<'_>, elapsed: u32) -> bool {
        elapsed >= self.interval && self.ready.is_set_in(cs) && self.buffer.has_pending_in(cs)
    }
}

impl core::fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Event")
            .field("interval", &self.interval)
            .field("last", &self.last)
            .field("buffer", self.buffer)
            .field("ready", self.ready)
            .finish()
    }
}
