//! Hardware abstraction traits
//!
//! What the core needs from the board. The critical section itself comes
//! from the `critical-section` crate and is provided by the board's
//! implementation of it.

pub mod clock;

pub use clock::{ManualClock, TickSource};
