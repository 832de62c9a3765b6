//! Fixed-rate event scheduler
//!
//! Owns a fixed-capacity table of events. Each call to [`Scheduler::run`]
//! scans the table once and dispatches every event that is due. Nothing is
//! preempted and nothing waits: an event that is not due is simply skipped
//! until a later pass.

use heapless::Vec;

use super::table::{Event, EventHandle, TaskFn};
use crate::config::MAX_EVENTS;
use crate::flag::Flag;
use crate::queue::BufferDescriptor;
use crate::traits::TickSource;

/// Polling event scheduler
///
/// `run()` must be called periodically from outside, often enough that the
/// shortest interval is missed by at most one call period.
pub struct Scheduler<'a, C, const N: usize = MAX_EVENTS> {
    events: Vec<Event<'a>, N>,
    clock: C,
}

impl<'a, C: TickSource, const N: usize> Scheduler<'a, C, N> {
    /// Create a scheduler with an empty table
    pub fn new(clock: C) -> Self {
        Self {
            events: Vec::new(),
            clock,
        }
    }

    /// Create a scheduler with an empty table and reset the given flags
    ///
    /// All flags are set inside one critical section, so no interrupt sees
    /// a half-initialised set.
    pub fn init(clock: C, flags: &[(&Flag, i32)]) -> Self {
        critical_section::with(|cs| {
            for (flag, value) in flags {
                flag.init_in(cs, *value);
            }
        });
        debug!("scheduler initialised, {} flags reset", flags.len());
        Self::new(clock)
    }

    /// Add an event in the first free slot
    ///
    /// The first dispatch can happen one interval after registration.
    /// Returns `None` and leaves the table unchanged when it is full.
    pub fn register(
        &mut self,
        task: TaskFn<'a>,
        interval: u32,
        buffer: &'a BufferDescriptor<'a>,
        ready: &'a Flag,
    ) -> Option<EventHandle> {
        let index = self.events.len();
        let Ok(slot) = u8::try_from(index) else {
            warn!("event slot {} has no handle, registration dropped", index);
            return None;
        };
        let event = Event {
            task,
            buffer,
            ready,
            interval,
            last: self.clock.now(),
        };

        if self.events.push(event).is_err() {
            warn!("event table full ({} slots), registration dropped", N);
            return None;
        }

        debug!("event {} registered, every {} ticks", index, interval);
        Some(EventHandle(slot))
    }

    /// Scan the table once and dispatch due events
    ///
    /// The whole scan runs in one critical section. Returns the number of
    /// events dispatched.
    pub fn run(&mut self) -> usize {
        let clock = &self.clock;
        let events = &mut self.events;

        critical_section::with(|cs| {
            let mut dispatched = 0;
            for (index, event) in events.iter_mut().enumerate() {
                let now = clock.now();
                let elapsed = clock.delta(event.last, now);

                if event.is_due_in(cs, elapsed) {
                    trace!("event {} dispatched after {} ticks", index, elapsed);
                    (event.task)(cs, event.buffer, event.ready);
                    event.last = now;
                    dispatched += 1;
                }
            }
            dispatched
        })
    }

    /// Whether `handle` would be dispatched if `run()` were called now
    pub fn is_due(&self, handle: EventHandle) -> bool {
        let Some(event) = self.events.get(handle.index()) else {
            return false;
        };
        let elapsed = self.clock.elapsed_since(event.last);
        critical_section::with(|cs| event.is_due_in(cs, elapsed))
    }

    pub fn event(&self, handle: EventHandle) -> Option<&Event<'a>> {
        self.events.get(handle.index())
    }

    pub fn events(&self) -> &[Event<'a>] {
        &self.events
    }

    /// Registered events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn is_full(&self) -> bool {
        self.events.is_full()
    }

    /// Drop every registered event
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ManualClock;
    use critical_section::CriticalSection;

    fn discard_bytes(_data: &[u8]) {}
    fn discard_words(_data: &[u16]) {}

    /// Consumes one element per dispatch
    fn take_one(cs: CriticalSection<'_>, buffer: &BufferDescriptor<'_>, _ready: &Flag) {
        buffer.drain_in(cs, 1);
    }

    /// Consumes one element and closes the gate until someone signals
    fn take_one_and_close(cs: CriticalSection<'_>, buffer: &BufferDescriptor<'_>, ready: &Flag) {
        ready.decrement_in(cs);
        buffer.drain_in(cs, 1);
    }

    fn noop(_cs: CriticalSection<'_>, _buffer: &BufferDescriptor<'_>, _ready: &Flag) {}

    #[test]
    fn test_register_fills_in_order() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 4];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        let mut sched: Scheduler<'_, _, 2> = Scheduler::new(&clock);
        assert!(sched.is_empty());

        let first = sched.register(noop, 10, &buffer, &ready).unwrap();
        let second = sched.register(noop, 20, &buffer, &ready).unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(sched.event(second).map(|e| e.interval()), Some(20));
    }

    #[test]
    fn test_register_on_full_table_is_dropped() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 4];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        let mut sched: Scheduler<'_, _, 2> = Scheduler::new(&clock);
        sched.register(noop, 1, &buffer, &ready);
        sched.register(noop, 2, &buffer, &ready);
        assert!(sched.is_full());

        assert!(sched.register(noop, 3, &buffer, &ready).is_none());
        assert_eq!(sched.len(), 2);
        assert_eq!(sched.capacity(), 2);
        let intervals: std::vec::Vec<u32> = sched.events().iter().map(|e| e.interval()).collect();
        assert_eq!(intervals, [1, 2]);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 16];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
        buffer.put(&[0xEEu8; 10]);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        let handle = sched.register(take_one, 10, &buffer, &ready).unwrap();

        let mut dispatched = 0;
        for _ in 0..30 {
            clock.advance(1);
            dispatched += sched.run();
        }

        assert_eq!(dispatched, 3);
        assert_eq!(count.value(), 7);
        assert_eq!(sched.event(handle).unwrap().last_run(), 30);
    }

    #[test]
    fn test_late_run_dispatches_once() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 16];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
        buffer.put(&[1u8; 5]);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        sched.register(take_one, 10, &buffer, &ready);

        // Several intervals missed: late dispatch, no catch-up burst
        clock.advance(45);
        assert_eq!(sched.run(), 1);
        assert_eq!(sched.run(), 0);
        clock.advance(10);
        assert_eq!(sched.run(), 1);
    }

    #[test]
    fn test_never_fires_when_not_ready() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(0);
        let mut storage = [0u8; 8];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
        buffer.put(&[1u8, 2, 3]);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        sched.register(take_one, 5, &buffer, &ready);

        for _ in 0..100 {
            clock.advance(7);
            assert_eq!(sched.run(), 0);
        }
        assert_eq!(count.value(), 3);
    }

    #[test]
    fn test_never_fires_without_data() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u16; 8];
        let buffer = BufferDescriptor::words(&mut storage, &count, discard_words);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        let handle = sched.register(take_one, 5, &buffer, &ready).unwrap();

        for _ in 0..100 {
            clock.advance(7);
            assert_eq!(sched.run(), 0);
        }

        buffer.put(&[0x14Du16]);
        assert!(sched.is_due(handle));
        assert_eq!(sched.run(), 1);
        assert_eq!(count.value(), 0);
    }

    #[test]
    fn test_tick_wraparound() {
        let clock = ManualClock::new(u32::MAX - 2);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 8];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
        buffer.put(&[1u8, 2]);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        let handle = sched.register(take_one, 5, &buffer, &ready).unwrap();

        // Four ticks later, counter wrapped to 1
        clock.set(1);
        assert!(!sched.is_due(handle));
        assert_eq!(sched.run(), 0);

        // Exactly one interval across the wrap
        clock.set(2);
        assert!(sched.is_due(handle));
        assert_eq!(sched.run(), 1);
        assert_eq!(sched.event(handle).unwrap().last_run(), 2);

        clock.set(3);
        assert_eq!(sched.run(), 0);

        clock.set(7);
        assert_eq!(sched.run(), 1);
        assert_eq!(sched.event(handle).unwrap().last_run(), 7);
    }

    #[test]
    fn test_negative_ready_flag_still_dispatches() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 8];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
        buffer.put(&[1u8, 2]);

        // Two claims before one completion
        ready.decrement();
        ready.decrement();
        assert_eq!(ready.value(), -1);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        let handle = sched.register(take_one, 5, &buffer, &ready).unwrap();

        clock.advance(10);
        assert!(sched.is_due(handle));
        assert_eq!(sched.run(), 1);
        assert_eq!(count.value(), 1);

        // Back at zero the gate is closed
        ready.signal();
        clock.advance(10);
        assert_eq!(sched.run(), 0);
    }

    #[test]
    fn test_gate_reopened_by_completion() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 8];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
        buffer.put(&[1u8, 2, 3]);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        sched.register(take_one_and_close, 1, &buffer, &ready);

        clock.advance(1);
        assert_eq!(sched.run(), 1);
        assert!(!ready.is_set());

        // Transfer still in flight
        clock.advance(5);
        assert_eq!(sched.run(), 0);

        // Completion interrupt
        ready.signal();
        assert_eq!(sched.run(), 1);
        assert_eq!(count.value(), 1);
    }

    #[test]
    fn test_events_evaluated_independently() {
        let clock = ManualClock::new(0);
        let uart_count = Flag::new(0);
        let spi_count = Flag::new(0);
        let uart_ready = Flag::new(1);
        let spi_ready = Flag::new(1);
        let mut uart_storage = [0u8; 8];
        let mut spi_storage = [0u16; 8];
        let uart = BufferDescriptor::bytes(&mut uart_storage, &uart_count, discard_bytes);
        let spi = BufferDescriptor::words(&mut spi_storage, &spi_count, discard_words);
        uart.put(&[1u8; 4]);
        spi.put(&[1u16; 4]);

        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        sched.register(take_one, 2, &uart, &uart_ready);
        sched.register(take_one, 3, &spi, &spi_ready);

        clock.advance(2);
        assert_eq!(sched.run(), 1);
        clock.advance(1);
        assert_eq!(sched.run(), 1);
        clock.advance(3);
        assert_eq!(sched.run(), 2);

        assert_eq!(uart_count.value(), 2);
        assert_eq!(spi_count.value(), 2);
    }

    #[test]
    fn test_handles_stop_at_u8_range() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 4];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        let mut sched: Scheduler<'_, _, 260> = Scheduler::new(&clock);
        for i in 0..256 {
            let handle = sched.register(noop, 1, &buffer, &ready).unwrap();
            assert_eq!(handle.index(), i);
        }

        // Table has room, but slot 256 cannot be addressed
        assert!(!sched.is_full());
        assert!(sched.register(noop, 1, &buffer, &ready).is_none());
        assert_eq!(sched.len(), 256);
    }

    #[test]
    fn test_init_resets_flags() {
        let clock = ManualClock::new(0);
        let dma_ready = Flag::new(-3);
        let stored = Flag::new(12);

        let sched: Scheduler<'_, _, 2> = Scheduler::init(&clock, &[(&dma_ready, 1), (&stored, 0)]);

        assert!(sched.is_empty());
        assert_eq!(dma_ready.value(), 1);
        assert_eq!(stored.value(), 0);
    }

    #[test]
    fn test_clear_empties_table() {
        let clock = ManualClock::new(0);
        let count = Flag::new(0);
        let ready = Flag::new(1);
        let mut storage = [0u8; 4];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        let mut sched: Scheduler<'_, _, 1> = Scheduler::new(&clock);
        sched.register(noop, 1, &buffer, &ready);
        sched.clear();
        assert!(sched.is_empty());
        assert!(sched.register(noop, 1, &buffer, &ready).is_some());
    }
}
