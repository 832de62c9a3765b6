//! Configuration type definitions
//!
//! Cadence is configured at build time. The firmware build script turns
//! `cadence.toml` into constants of these types and checks them with
//! [`validate`](BufferConfig::validate) in a const context, so a bad
//! configuration fails the build instead of the board.

use crate::queue::ElementWidth;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of event table entries
pub const MAX_EVENTS: usize = 4;

/// Maximum elements moved to a drain callback per call
pub const DRAIN_CHUNK: usize = 32;

/// Smallest useful queue (one usable slot)
pub const MIN_QUEUE_CAPACITY: usize = 2;

/// Largest queue; element counts must fit the count flag's `u16` steps
pub const MAX_QUEUE_CAPACITY: usize = 4096;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Queue capacity below [`MIN_QUEUE_CAPACITY`]
    CapacityTooSmall,
    /// Queue capacity above [`MAX_QUEUE_CAPACITY`]
    CapacityTooLarge,
    /// More events than [`MAX_EVENTS`]
    TooManyEvents,
    /// Tick rate or scheduler period of zero
    ZeroPeriod,
    /// Event interval shorter than the scheduler period
    IntervalBelowPeriod,
}

/// Ring buffer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BufferConfig {
    /// Slots in the backing array (one stays unused)
    pub capacity: usize,
    /// Element width
    pub width: ElementWidth,
}

impl BufferConfig {
    /// Byte buffer with `capacity` slots
    pub const fn bytes(capacity: usize) -> Self {
        Self {
            capacity,
            width: ElementWidth::Byte,
        }
    }

    /// Word buffer with `capacity` slots
    pub const fn words(capacity: usize) -> Self {
        Self {
            capacity,
            width: ElementWidth::Word,
        }
    }

    /// Elements resident at most
    pub const fn usable_capacity(&self) -> usize {
        self.capacity.saturating_sub(1)
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < MIN_QUEUE_CAPACITY {
            Err(ConfigError::CapacityTooSmall)
        } else if self.capacity > MAX_QUEUE_CAPACITY {
            Err(ConfigError::CapacityTooLarge)
        } else {
            Ok(())
        }
    }
}

/// Scheduler timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Tick source frequency in Hz
    pub tick_hz: u32,
    /// Ticks between scheduler runs
    pub period_ticks: u32,
}

impl TimingConfig {
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 || self.period_ticks == 0 {
            Err(ConfigError::ZeroPeriod)
        } else {
            Ok(())
        }
    }

    /// Scheduler period in microseconds
    pub const fn period_us(&self) -> u64 {
        self.period_ticks as u64 * 1_000_000 / self.tick_hz as u64
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_hz: 1000,
            period_ticks: 1,
        }
    }
}

/// Periodic event configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventConfig {
    /// Minimum ticks between dispatches
    pub interval_ticks: u32,
    /// Whether the event is registered at boot
    pub enabled: bool,
}

impl EventConfig {
    pub const fn new(interval_ticks: u32) -> Self {
        Self {
            interval_ticks,
            enabled: true,
        }
    }

    /// Check the interval against the scheduler period
    ///
    /// The scheduler can only notice an elapsed interval when it runs, so an
    /// interval shorter than the period could never be honoured.
    pub const fn validate(&self, timing: &TimingConfig) -> Result<(), ConfigError> {
        if self.interval_ticks < timing.period_ticks {
            Err(ConfigError::IntervalBelowPeriod)
        } else {
            Ok(())
        }
    }
}

/// Check that `enabled` events fit the event table
pub const fn validate_event_count(enabled: usize) -> Result<(), ConfigError> {
    if enabled > MAX_EVENTS {
        Err(ConfigError::TooManyEvents)
    } else {
        Ok(())
    }
}
