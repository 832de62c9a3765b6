//! Ring queues and the buffers built on them

pub mod buffer;
pub mod ring;

pub use buffer::{Buffer, BufferDescriptor, Element, ElementWidth};
pub use ring::RingQueue;
