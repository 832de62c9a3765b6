//! Board-agnostic core of the Cadence firmware
//!
//! This crate contains the pieces of the firmware that coordinate between
//! interrupt handlers and the main loop without an RTOS:
//!
//! - [`Flag`] - critical-section guarded counter used as a ready gate or
//!   an element count
//! - [`queue`] - fixed-capacity ring queues for 8-bit and 16-bit elements and
//!   the [`BufferDescriptor`] that binds one to a count flag and a drain
//!   callback
//! - [`scheduler`] - fixed-rate cooperative event scheduler that drains those
//!   buffers
//! - [`traits`] - the tick source the scheduler needs from the board
//! - [`config`] - build-time limits and configuration types
//!
//! # Data flow
//!
//! ```text
//!  producer / ISR ──put──► BufferDescriptor ──count flag──┐
//!                                 ▲                        ▼
//!                                 └────get──── task ◄── Scheduler::run()
//!                                               │
//!                                        drain callback ──► peripheral
//!                                                               │
//!                     readiness flag ◄──── completion ISR ◄─────┘
//! ```
//!
//! All shared state is mutated inside a `critical-section` critical section.
//! On a single-core Cortex-M that is the global interrupt mask.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod flag;
pub mod queue;
pub mod scheduler;
pub mod traits;

pub use flag::Flag;
pub use queue::{Buffer, BufferDescriptor, Element, ElementWidth, RingQueue};
pub use scheduler::{Event, EventHandle, Scheduler, TaskFn};
pub use traits::{ManualClock, TickSource};
