//! Interrupt-safe buffers
//!
//! A [`Buffer`] wraps one [`RingQueue`] together with the [`Flag`] that
//! counts its resident elements and the drain callback that hands removed
//! elements to a peripheral. Every `put` and `get` runs inside a critical
//! section, so producers may call them from interrupt handlers.
//!
//! [`BufferDescriptor`] is the width-erased handle the scheduler works with.
//! It is an enum over the two supported element widths, so a descriptor is
//! built as exactly one variant and every dispatch site matches on it.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

use super::ring::RingQueue;
use crate::config::DRAIN_CHUNK;
use crate::flag::Flag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Element width of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementWidth {
    /// 8-bit elements (serial transmit)
    Byte,
    /// 16-bit elements (SPI transmit)
    Word,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
}

/// Element type a buffer can store
///
/// Implemented for `u8` and `u16` only. Both are `'static`, so a buffer of
/// any lifetime can hold them.
pub trait Element: Copy + Default + sealed::Sealed + 'static {
    /// Width tag of the matching descriptor variant
    const WIDTH: ElementWidth;

    /// Select the buffer of this width from a descriptor
    fn select<'d, 'a>(descriptor: &'d BufferDescriptor<'a>) -> Option<&'d Buffer<'a, Self>>;
}

impl Element for u8 {
    const WIDTH: ElementWidth = ElementWidth::Byte;

    fn select<'d, 'a>(descriptor: &'d BufferDescriptor<'a>) -> Option<&'d Buffer<'a, u8>> {
        match descriptor {
            BufferDescriptor::Bytes(buffer) => Some(buffer),
            BufferDescriptor::Words(_) => None,
        }
    }
}

impl Element for u16 {
    const WIDTH: ElementWidth = ElementWidth::Word;

    fn select<'d, 'a>(descriptor: &'d BufferDescriptor<'a>) -> Option<&'d Buffer<'a, u16>> {
        match descriptor {
            BufferDescriptor::Bytes(_) => None,
            BufferDescriptor::Words(buffer) => Some(buffer),
        }
    }
}

/// Element counts are tracked in a `Flag`, which takes `u16` steps
fn count_step(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Ring queue bound to its element-count flag and drain callback
pub struct Buffer<'a, E> {
    queue: Mutex<RefCell<RingQueue<'a, E>>>,
    capacity: usize,
    count: &'a Flag,
    drain: fn(&[E]),
}

impl<'a, E: Element> Buffer<'a, E> {
    /// Bind `storage` to a count flag and a drain callback
    ///
    /// Both cursors start at the beginning of `storage`. The count flag is
    /// not touched; it is initialised by whoever owns it.
    pub fn new(storage: &'a mut [E], count: &'a Flag, drain: fn(&[E])) -> Self {
        let capacity = storage.len();
        Self {
            queue: Mutex::new(RefCell::new(RingQueue::new(storage))),
            capacity,
            count,
            drain,
        }
    }

    /// Slots in the backing storage
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum number of elements resident at once
    pub fn usable_capacity(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    /// Flag tracking the number of stored elements
    pub fn count_flag(&self) -> &'a Flag {
        self.count
    }

    /// Append elements, returning how many fit
    pub fn put(&self, src: &[E]) -> usize {
        critical_section::with(|cs| self.put_in(cs, src))
    }

    pub fn put_in(&self, cs: CriticalSection<'_>, src: &[E]) -> usize {
        let written = self.queue.borrow_ref_mut(cs).put(src);
        self.count.add_in(cs, count_step(written));

        if written < src.len() {
            debug!(
                "{} buffer full: queued {} of {}",
                E::WIDTH,
                written,
                src.len()
            );
        }
        written
    }

    /// Remove elements into `dst`, returning how many were available
    pub fn get(&self, dst: &mut [E]) -> usize {
        critical_section::with(|cs| self.get_in(cs, dst))
    }

    pub fn get_in(&self, cs: CriticalSection<'_>, dst: &mut [E]) -> usize {
        let read = self.queue.borrow_ref_mut(cs).get(dst);
        self.count.sub_saturating_in(cs, count_step(read));

        if read < dst.len() {
            trace!("{} buffer empty: read {} of {}", E::WIDTH, read, dst.len());
        }
        read
    }

    /// Pop up to `max` elements and hand them to the drain callback
    ///
    /// At most [`DRAIN_CHUNK`] elements move per call. The callback is not
    /// invoked when nothing was read.
    pub fn drain_in(&self, cs: CriticalSection<'_>, max: usize) -> usize {
        let mut scratch = [E::default(); DRAIN_CHUNK];
        let want = max.min(DRAIN_CHUNK);
        let read = self.get_in(cs, &mut scratch[..want]);
        if read > 0 {
            (self.drain)(&scratch[..read]);
        }
        read
    }

    /// Resident elements
    pub fn len_in(&self, cs: CriticalSection<'_>) -> usize {
        self.queue.borrow_ref(cs).len()
    }

    pub fn is_empty_in(&self, cs: CriticalSection<'_>) -> bool {
        self.queue.borrow_ref(cs).is_empty()
    }

    /// Discard everything and zero the count flag
    pub fn clear_in(&self, cs: CriticalSection<'_>) {
        self.queue.borrow_ref_mut(cs).clear();
        self.count.init_in(cs, 0);
    }
}

/// Width-erased buffer handle used by the scheduler
pub enum BufferDescriptor<'a> {
    /// Queue of 8-bit elements
    Bytes(Buffer<'a, u8>),
    /// Queue of 16-bit elements
    Words(Buffer<'a, u16>),
}

impl<'a> BufferDescriptor<'a> {
    /// Byte buffer over `storage`
    pub fn bytes(storage: &'a mut [u8], count: &'a Flag, drain: fn(&[u8])) -> Self {
        Self::Bytes(Buffer::new(storage, count, drain))
    }

    /// Word buffer over `storage`
    pub fn words(storage: &'a mut [u16], count: &'a Flag, drain: fn(&[u16])) -> Self {
        Self::Words(Buffer::new(storage, count, drain))
    }

    pub fn width(&self) -> ElementWidth {
        match self {
            Self::Bytes(_) => ElementWidth::Byte,
            Self::Words(_) => ElementWidth::Word,
        }
    }

    pub fn count_flag(&self) -> &'a Flag {
        match self {
            Self::Bytes(buffer) => buffer.count_flag(),
            Self::Words(buffer) => buffer.count_flag(),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            Self::Bytes(buffer) => buffer.capacity(),
            Self::Words(buffer) => buffer.capacity(),
        }
    }

    pub fn usable_capacity(&self) -> usize {
        self.capacity().saturating_sub(1)
    }

    /// Typed access to a byte buffer
    pub fn as_bytes(&self) -> Option<&Buffer<'a, u8>> {
        u8::select(self)
    }

    /// Typed access to a word buffer
    pub fn as_words(&self) -> Option<&Buffer<'a, u16>> {
        u16::select(self)
    }

    /// Append elements of width `E`
    ///
    /// Returns the number written. A width that does not match this
    /// descriptor writes nothing.
    pub fn put<E: Element>(&self, src: &[E]) -> usize {
        critical_section::with(|cs| self.put_in(cs, src))
    }

    pub fn put_in<E: Element>(&self, cs: CriticalSection<'_>, src: &[E]) -> usize {
        match E::select(self) {
            Some(buffer) => buffer.put_in(cs, src),
            None => {
                warn!("put of {} elements into {} buffer", E::WIDTH, self.width());
                0
            }
        }
    }

    /// Remove elements of width `E` into `dst`
    ///
    /// Returns the number read. A width that does not match this descriptor
    /// reads nothing.
    pub fn get<E: Element>(&self, dst: &mut [E]) -> usize {
        critical_section::with(|cs| self.get_in(cs, dst))
    }

    pub fn get_in<E: Element>(&self, cs: CriticalSection<'_>, dst: &mut [E]) -> usize {
        match E::select(self) {
            Some(buffer) => buffer.get_in(cs, dst),
            None => {
                warn!("get of {} elements from {} buffer", E::WIDTH, self.width());
                0
            }
        }
    }

    /// See [`Buffer::drain_in`]
    pub fn drain_in(&self, cs: CriticalSection<'_>, max: usize) -> usize {
        match self {
            Self::Bytes(buffer) => buffer.drain_in(cs, max),
            Self::Words(buffer) => buffer.drain_in(cs, max),
        }
    }

    pub fn len_in(&self, cs: CriticalSection<'_>) -> usize {
        match self {
            Self::Bytes(buffer) => buffer.len_in(cs),
            Self::Words(buffer) => buffer.len_in(cs),
        }
    }

    /// Whether the count flag reports stored elements
    pub fn has_pending_in(&self, cs: CriticalSection<'_>) -> bool {
        self.count_flag().is_set_in(cs)
    }

    pub fn clear_in(&self, cs: CriticalSection<'_>) {
        match self {
            Self::Bytes(buffer) => buffer.clear_in(cs),
            Self::Words(buffer) => buffer.clear_in(cs),
        }
    }
}

impl core::fmt::Debug for BufferDescriptor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufferDescriptor")
            .field("width", &self.width())
            .field("capacity", &self.capacity())
            .field("count", self.count_flag())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use proptest::prelude::*;

    fn discard_bytes(_data: &[u8]) {}
    fn discard_words(_data: &[u16]) {}

    #[test]
    fn test_put_get_tracks_count() {
        let count = Flag::new(0);
        let mut storage = [0u8; 5];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        assert_eq!(buffer.put(&[1u8, 2, 3, 4]), 4);
        assert_eq!(count.value(), 4);

        assert_eq!(buffer.put(&[5u8]), 0);
        assert_eq!(count.value(), 4);

        let mut out = [0u8; 2];
        assert_eq!(buffer.get(&mut out), 2);
        assert_eq!(out, [1, 2]);
        assert_eq!(count.value(), 2);

        assert_eq!(buffer.put(&[5u8, 6]), 2);
        let mut out = [0u8; 4];
        assert_eq!(buffer.get(&mut out), 4);
        assert_eq!(out, [3, 4, 5, 6]);
        assert_eq!(count.value(), 0);
    }

    #[test]
    fn test_word_buffer() {
        let count = Flag::new(0);
        let mut storage = [0u16; 4];
        let buffer = BufferDescriptor::words(&mut storage, &count, discard_words);

        assert_eq!(buffer.width(), ElementWidth::Word);
        assert_eq!(buffer.usable_capacity(), 3);
        assert_eq!(buffer.put(&[0x14Du16, 0xFFFF, 7, 8]), 3);

        let mut out = [0u16; 3];
        assert_eq!(buffer.get(&mut out), 3);
        assert_eq!(out, [0x14D, 0xFFFF, 7]);
    }

    /// Generic access through a descriptor borrowing stack storage
    fn put_then_get<E: Element>(descriptor: &BufferDescriptor<'_>, values: &[E], out: &mut [E]) -> (usize, usize) {
        let written = descriptor.put(values);
        critical_section::with(|cs| (written, descriptor.get_in(cs, out)))
    }

    #[test]
    fn test_generic_access_on_local_storage() {
        let count = Flag::new(0);
        {
            let mut storage = [0u16; 6];
            let buffer = BufferDescriptor::words(&mut storage, &count, discard_words);

            let mut out = [0u16; 8];
            assert_eq!(put_then_get(&buffer, &[10u16, 20, 30], &mut out), (3, 3));
            assert_eq!(out[..3], [10, 20, 30]);

            critical_section::with(|cs| assert_eq!(buffer.put_in(cs, &[40u16]), 1));
        }
        assert_eq!(count.value(), 1);
    }

    #[test]
    fn test_width_mismatch_moves_nothing() {
        let count = Flag::new(0);
        let mut storage = [0u8; 8];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        assert_eq!(buffer.put(&[1u16, 2]), 0);
        assert_eq!(count.value(), 0);

        buffer.put(&[9u8]);
        let mut words = [0u16; 1];
        assert_eq!(buffer.get(&mut words), 0);
        assert_eq!(count.value(), 1);
        assert!(buffer.as_words().is_none());
        assert!(buffer.as_bytes().is_some());
    }

    #[test]
    fn test_count_never_below_zero() {
        // Count flag shared with an external writer that got ahead
        let count = Flag::new(0);
        let mut storage = [0u8; 4];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        buffer.put(&[1u8, 2]);
        count.init(1);

        let mut out = [0u8; 4];
        assert_eq!(buffer.get(&mut out), 2);
        assert_eq!(count.value(), 0);
    }

    static DRAINED: AtomicUsize = AtomicUsize::new(0);
    static DRAIN_CALLS: AtomicUsize = AtomicUsize::new(0);
    static LARGEST_DRAIN: AtomicUsize = AtomicUsize::new(0);

    fn record_drain(data: &[u8]) {
        DRAIN_CALLS.fetch_add(1, Ordering::SeqCst);
        LARGEST_DRAIN.fetch_max(data.len(), Ordering::SeqCst);
        DRAINED.fetch_add(data.iter().map(|&b| b as usize).sum(), Ordering::SeqCst);
    }

    #[test]
    fn test_drain_hands_elements_to_callback() {
        let count = Flag::new(0);
        let mut storage = [0u8; 64];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, record_drain);

        buffer.put(&[1u8; 40]);

        critical_section::with(|cs| {
            // Capped at one chunk per call
            assert_eq!(buffer.drain_in(cs, 100), DRAIN_CHUNK);
            assert_eq!(buffer.drain_in(cs, 100), 40 - DRAIN_CHUNK);
            // Nothing left, callback not invoked
            assert_eq!(buffer.drain_in(cs, 100), 0);
        });

        assert_eq!(DRAIN_CALLS.load(Ordering::SeqCst), 2);
        assert_eq!(DRAINED.load(Ordering::SeqCst), 40);
        // Callbacks can copy into a DRAIN_CHUNK sized buffer without loss
        assert_eq!(LARGEST_DRAIN.load(Ordering::SeqCst), DRAIN_CHUNK);
        assert_eq!(count.value(), 0);
    }

    #[test]
    fn test_clear_resets_count() {
        let count = Flag::new(0);
        let mut storage = [0u8; 8];
        let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);

        buffer.put(&[1u8, 2, 3]);
        critical_section::with(|cs| {
            assert_eq!(buffer.len_in(cs), 3);
            buffer.clear_in(cs);
            assert_eq!(buffer.len_in(cs), 0);
            assert!(!buffer.has_pending_in(cs));
        });
    }

    proptest! {
        #[test]
        fn test_count_matches_resident(ops in prop::collection::vec((any::<bool>(), 0usize..10), 0..50)) {
            let count = Flag::new(0);
            let mut storage = [0u8; 12];
            let buffer = BufferDescriptor::bytes(&mut storage, &count, discard_bytes);
            let mut total_put = 0i64;
            let mut total_got = 0i64;

            for (is_put, n) in ops {
                if is_put {
                    let src = [0xA5u8; 10];
                    total_put += buffer.put(&src[..n]) as i64;
                } else {
                    let mut dst = [0u8; 10];
                    total_got += buffer.get(&mut dst[..n]) as i64;
                }
                prop_assert_eq!(i64::from(count.value()), (total_put - total_got).max(0));
                let resident = critical_section::with(|cs| buffer.len_in(cs));
                prop_assert!(resident <= 11);
                prop_assert_eq!(resident as i32, count.value());
            }
        }
    }
}
