//! Fixed-capacity ring queue
//!
//! The queue borrows its backing storage for its whole lifetime and never
//! grows. The write and read cursors advance modulo the storage length and
//! one slot is always left empty, so equal cursors mean "empty" and a write
//! cursor that would land on the read cursor means "full". A queue over
//! `C` slots therefore holds at most `C - 1` elements, whatever the element
//! width.
//!
//! Neither [`RingQueue::put`] nor [`RingQueue::get`] is interrupt safe on
//! its own. Shared queues live inside a [`Buffer`](super::Buffer), which
//! takes the critical section around them.

/// Ring queue over borrowed storage
#[derive(Debug)]
pub struct RingQueue<'a, T> {
    data: &'a mut [T],
    put_index: usize,
    get_index: usize,
}

impl<'a, T: Copy> RingQueue<'a, T> {
    /// Create an empty queue over `storage`
    ///
    /// The storage length is the queue capacity; one slot stays unused.
    pub fn new(storage: &'a mut [T]) -> Self {
        Self {
            data: storage,
            put_index: 0,
            get_index: 0,
        }
    }

    /// Number of slots in the backing storage
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Maximum number of elements the queue can hold at once
    pub fn usable_capacity(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    /// Number of resident elements
    pub fn len(&self) -> usize {
        if self.put_index >= self.get_index {
            self.put_index - self.get_index
        } else {
            self.data.len() - self.get_index + self.put_index
        }
    }

    pub fn is_empty(&self) -> bool {
        self.put_index == self.get_index
    }

    pub fn is_full(&self) -> bool {
        self.advance(self.put_index) == self.get_index
    }

    /// Free slots left before the queue is full
    pub fn vacancy(&self) -> usize {
        self.usable_capacity() - self.len()
    }

    /// Next cursor position, wrapping at the true end of the storage
    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next >= self.data.len() {
            0
        } else {
            next
        }
    }

    /// Append elements from `src`
    ///
    /// Stops at the first element that does not fit and returns how many
    /// were written. Partial success is normal, not an error.
    pub fn put(&mut self, src: &[T]) -> usize {
        for (written, &value) in src.iter().enumerate() {
            let next = self.advance(self.put_index);
            if next == self.get_index {
                return written;
            }
            self.data[self.put_index] = value;
            self.put_index = next;
        }
        src.len()
    }

    /// Remove elements into `dst`
    ///
    /// Stops when the queue runs empty and returns how many were read.
    pub fn get(&mut self, dst: &mut [T]) -> usize {
        for (read, slot) in dst.iter_mut().enumerate() {
            if self.get_index == self.put_index {
                return read;
            }
            *slot = self.data[self.get_index];
            self.get_index = self.advance(self.get_index);
        }
        dst.len()
    }

    /// Look at the oldest element without removing it
    pub fn peek(&self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            Some(self.data[self.get_index])
        }
    }

    /// Discard all resident elements
    pub fn clear(&mut self) {
        self.put_index = 0;
        self.get_index = 0;
    }
}
