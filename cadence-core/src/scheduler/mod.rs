//! Event scheduler
//!
//! A fixed table of periodic events, each draining one buffer into a
//! peripheral when its interval has elapsed and the peripheral is ready.

pub mod executor;
pub mod table;

pub use executor::Scheduler;
pub use table::{Event, EventHandle, TaskFn};
